//! Benchmarks for move generation, evaluation and search.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_search::board::nnue::NnueNetwork;
use chess_search::board::{search_depth, Board, SearchLimits, SearchParams, SilentLogger, WorkerPool};
use chess_search::tt::DEFAULT_TT_MB;
use chess_search::TranspositionTable;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn with_network(fen: &str) -> Board {
    let mut board = Board::from_fen(fen);
    board.set_network(Arc::new(NnueNetwork::material()));
    board
}

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let mut board = Board::new();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| board.perft(black_box(depth)))
        });
    }

    let mut kiwipete = Board::from_fen(KIWIPETE);
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| kiwipete.perft(black_box(depth)))
        });
    }

    // Accumulator updates ride along with every make/unmake
    let mut kiwipete_nnue = with_network(KIWIPETE);
    group.bench_function("kiwipete_nnue/3", |b| b.iter(|| kiwipete_nnue.perft(black_box(3))));

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    for (name, fen) in [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("middlegame", MIDDLEGAME),
        ("kiwipete", KIWIPETE),
    ] {
        let mut board = Board::from_fen(fen);
        group.bench_function(name, |b| b.iter(|| black_box(board.generate_moves())));
    }

    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    for (name, fen) in [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("middlegame", MIDDLEGAME),
        ("endgame", "8/5k2/8/8/8/8/5K2/4R3 w - - 0 1"),
    ] {
        let board = with_network(fen);
        group.bench_with_input(BenchmarkId::new("nnue", name), &board, |b, board| {
            b.iter(|| black_box(board.evaluate()))
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for depth in [4, 6, 8] {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut board = with_network("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
                search_depth(&mut board, Arc::new(TranspositionTable::new(DEFAULT_TT_MB)), depth)
            })
        });
    }

    for depth in [4, 6] {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut board = with_network(KIWIPETE);
                search_depth(&mut board, Arc::new(TranspositionTable::new(DEFAULT_TT_MB)), depth)
            })
        });
    }

    let pool = WorkerPool::new(4, Arc::new(SilentLogger)).expect("spawn pool");
    let board = with_network(MIDDLEGAME);
    let params = SearchParams::default();
    group.bench_function("smp4/middlegame/7", |b| {
        b.iter(|| {
            let tt = Arc::new(TranspositionTable::new(DEFAULT_TT_MB));
            pool.search(&board, &SearchLimits::depth(7), tt, &params)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_perft, bench_movegen, bench_eval, bench_search);
criterion_main!(benches);
