//! Parsing of protocol input lines.

use std::time::Duration;

use crate::board::{Color, SearchLimits, TimeControl};

/// Arguments of a `go` command. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<i32>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

impl GoParams {
    /// Parse the tokens after `go`. Unknown tokens are skipped.
    #[must_use]
    pub fn parse(tokens: &[&str]) -> Self {
        let mut go = GoParams::default();
        let mut iter = tokens.iter().copied();
        while let Some(token) = iter.next() {
            match token {
                "infinite" => go.infinite = true,
                "depth" => go.depth = iter.next().and_then(|v| v.parse().ok()),
                "movetime" => go.movetime = iter.next().and_then(|v| v.parse().ok()),
                "wtime" => go.wtime = iter.next().and_then(parse_clock),
                "btime" => go.btime = iter.next().and_then(parse_clock),
                "winc" => go.winc = iter.next().and_then(parse_clock),
                "binc" => go.binc = iter.next().and_then(parse_clock),
                "nodes" => go.nodes = iter.next().and_then(|v| v.parse().ok()),
                _ => {}
            }
        }
        go
    }
}

/// Clock values may go negative when a GUI lets the engine overstep.
fn parse_clock(value: &str) -> Option<u64> {
    value.parse::<i64>().ok().map(|ms| ms.max(0) as u64)
}

impl GoParams {
    /// The clock regime for `side`: `infinite` beats `movetime`, which beats
    /// the clock.
    #[must_use]
    pub fn time_control(&self, side: Color) -> TimeControl {
        let (remaining, increment) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        if self.infinite {
            TimeControl::Infinite
        } else if let Some(ms) = self.movetime {
            TimeControl::MoveTime {
                time: Duration::from_millis(ms),
            }
        } else if let Some(ms) = remaining {
            TimeControl::Incremental {
                remaining: Duration::from_millis(ms),
                increment: Duration::from_millis(increment.unwrap_or(0)),
            }
        } else {
            TimeControl::Infinite
        }
    }
}

impl SearchLimits {
    /// Limits for `go` with `side` to move. Depth and node caps apply on top
    /// of the time control.
    #[must_use]
    pub fn from_go(go: &GoParams, side: Color) -> Self {
        let mut limits = go.time_control(side).to_limits();
        limits.infinite = go.infinite;
        limits.depth = go.depth;
        limits.nodes = go.nodes;
        limits
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: Option<String> },
    /// Tokens after `position`
    Position(Vec<String>),
    Go(GoParams),
    Stop,
    Quit,
    Perft(u32),
    Bench(Option<i32>),
    Eval,
    Spsa,
    Display,
    Unknown(String),
}

/// Parse one input line. Blank lines yield `None`.
#[must_use]
pub fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (&head, rest) = parts.split_first()?;

    let cmd = match head {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "setoption" => match parse_setoption(rest) {
            Some((name, value)) => UciCommand::SetOption { name, value },
            None => UciCommand::Unknown(line.trim().to_string()),
        },
        "position" => UciCommand::Position(rest.iter().map(|p| (*p).to_string()).collect()),
        "go" => UciCommand::Go(GoParams::parse(rest)),
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        "perft" => UciCommand::Perft(rest.first().and_then(|v| v.parse().ok()).unwrap_or(1)),
        "bench" => UciCommand::Bench(rest.first().and_then(|v| v.parse().ok())),
        "eval" => UciCommand::Eval,
        "spsa" => UciCommand::Spsa,
        "d" => UciCommand::Display,
        _ => UciCommand::Unknown(line.trim().to_string()),
    };

    Some(cmd)
}

/// Split `name <words...> [value <words...>]`.
#[must_use]
pub fn parse_setoption(parts: &[&str]) -> Option<(String, Option<String>)> {
    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut in_value = None;

    for part in parts {
        match *part {
            "name" if in_value.is_none() => in_value = Some(false),
            "value" if in_value == Some(false) => in_value = Some(true),
            _ => match in_value {
                Some(false) => name_parts.push(part),
                Some(true) => value_parts.push(part),
                None => {}
            },
        }
    }

    if name_parts.is_empty() {
        return None;
    }

    let value = if value_parts.is_empty() {
        None
    } else {
        Some(value_parts.join(" "))
    };
    Some((name_parts.join(" "), value))
}
