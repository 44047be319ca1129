use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;

use chess_search::uci::parse_position;

fn spawn_engine() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_chess_search");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn engine binary");
    let stdin = child.stdin.take().expect("stdin");
    let stdout = BufReader::new(child.stdout.take().expect("stdout"));
    (child, stdin, stdout)
}

/// Read lines until one starts with `prefix`, returning everything read.
fn read_until(reader: &mut BufReader<ChildStdout>, prefix: &str) -> (String, Option<String>) {
    let mut output = String::new();
    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).expect("read failed");
        if bytes == 0 {
            return (output, None);
        }
        output.push_str(&line);
        if line.starts_with(prefix) {
            return (output, Some(line));
        }
    }
}

fn assert_legal(position: &[&str], bestmove: &str) {
    let parts: Vec<&str> = bestmove.split_whitespace().collect();
    assert!(parts.len() >= 2, "bestmove missing move: {bestmove}");
    assert_ne!(parts[1], "0000", "engine returned null move");
    let mut board = parse_position(position, None).expect("valid position");
    assert!(
        board.parse_uci_move(parts[1]).is_ok(),
        "bestmove not legal in position: {}",
        parts[1]
    );
}

#[test]
fn uci_smoke_test_returns_legal_move() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin
        .write_all(b"uci\nisready\nposition startpos moves e2e4\ngo movetime 100\n")
        .expect("write");

    let (output, bestmove) = read_until(&mut reader, "bestmove");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert!(output.contains("id name chess_search"));
    assert!(output.contains("uciok"));
    assert!(output.contains("readyok"));
    assert!(output.contains("info depth 1 "));
    assert!(output.contains("hashfull"));
    assert_legal(&["startpos", "moves", "e2e4"], &bestmove.expect("no bestmove found"));
}

#[test]
fn uci_reports_options_and_handles_setoption() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin
        .write_all(b"uci\nsetoption name Hash value 4\nsetoption name Threads value 2\nsetoption name rfp_mult value 80\nsetoption name Bogus value 1\nisready\n")
        .expect("write");

    let (output, ready) = read_until(&mut reader, "readyok");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert!(ready.is_some());
    assert!(output.contains("option name Hash type spin"));
    assert!(output.contains("option name Threads type spin"));
    assert!(output.contains("option name EvalFile type string"));
    assert!(output.contains("option name asp_delta type spin default 30"));
}

#[test]
fn uci_go_depth_with_threads_returns_legal_move() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin
        .write_all(b"setoption name Threads value 3\nposition startpos\ngo depth 5\n")
        .expect("write");

    let (output, bestmove) = read_until(&mut reader, "bestmove");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert!(output.contains("info depth 5 "));
    assert_legal(&["startpos"], &bestmove.expect("no bestmove found"));
}

#[test]
fn uci_perft_command_outputs_nodes() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin.write_all(b"position startpos\nperft 3\n").expect("write");

    let (output, summary) = read_until(&mut reader, "nodes ");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert!(output.contains("e2e4: 600"));
    assert!(summary.expect("perft summary").starts_with("nodes 8902 "));
}

#[test]
fn uci_stop_interrupts_infinite_search() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin
        .write_all(b"position startpos\ngo infinite\n")
        .expect("write");
    thread::sleep(Duration::from_millis(200));
    stdin.write_all(b"isready\n").expect("write");
    let (_, ready) = read_until(&mut reader, "readyok");
    assert!(ready.is_some(), "engine must answer isready while searching");

    stdin.write_all(b"stop\n").expect("write");
    let (_, bestmove) = read_until(&mut reader, "bestmove");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert_legal(&["startpos"], &bestmove.expect("no bestmove found"));
}

#[test]
fn uci_checkmated_side_reports_null_move() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin
        .write_all(b"position startpos moves f2f3 e7e5 g2g4 d8h4\ngo depth 3\n")
        .expect("write");

    let (_, bestmove) = read_until(&mut reader, "bestmove");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert_eq!(bestmove.expect("no bestmove found").trim(), "bestmove 0000");
}

#[test]
fn uci_spsa_lists_tunables() {
    let (mut child, mut stdin, mut reader) = spawn_engine();
    stdin.write_all(b"spsa\nisready\n").expect("write");
    let (output, _) = read_until(&mut reader, "readyok");
    stdin.write_all(b"quit\n").expect("write");
    let _ = child.wait();

    assert!(output.contains("rfp_mult, int, 90, 10, 300, 14, 0.002"));
}
