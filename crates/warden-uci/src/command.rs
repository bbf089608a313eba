//! UCI command parsing.

use std::time::Duration;

use warden_core::{Board, Move};

use crate::error::UciError;

/// Largest accepted `Hash` value in megabytes.
pub const MAX_HASH_MB: usize = 65_536;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches to the configured depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    /// Moves until the next time control.
    pub movestogo: Option<u32>,
    pub depth: Option<u8>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
    /// Search until `stop`.
    pub infinite: bool,
    /// Root moves to consider; empty means all. Legality is checked by the engine.
    pub searchmoves: Vec<Move>,
}

/// Options accepted by `setoption`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciOption {
    /// Result cache size in megabytes.
    Hash(usize),
    /// Drop everything the engine has learned.
    ClearHash,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    Uci,
    IsReady,
    UciNewGame,
    /// Position after all listed moves were played.
    Position(Board),
    Go(GoParams),
    SetOption(UciOption),
    Stop,
    Quit,
    /// Unrecognised command, ignored.
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match head {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(rest),
        "go" => parse_go(rest),
        "setoption" => parse_setoption(rest),
        _ => Ok(Command::Unknown(head.to_string())),
    }
}

/// `position startpos|fen <six fields> [moves ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let (mut board, rest) = match tokens.split_first() {
        Some((&"startpos", rest)) => (Board::starting_position(), rest),
        Some((&"fen", rest)) => {
            let end = rest.iter().position(|&t| t == "moves").unwrap_or(rest.len());
            let fen = rest[..end].join(" ");
            let board: Board = fen.parse().map_err(|_| UciError::InvalidFen { fen: fen.clone() })?;
            (board, &rest[end..])
        }
        _ => return Err(UciError::MalformedPosition),
    };

    if let Some((&"moves", moves)) = rest.split_first() {
        for text in moves {
            board = board.play_uci(text).map_err(|_| UciError::InvalidMove {
                uci_move: text.to_string(),
            })?;
        }
    }

    Ok(Command::Position(board))
}

const GO_KEYWORDS: [&str; 12] = [
    "wtime",
    "btime",
    "winc",
    "binc",
    "movestogo",
    "depth",
    "movetime",
    "nodes",
    "infinite",
    "searchmoves",
    "ponder",
    "mate",
];

/// Parse the `go` arguments. Unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1).copied();
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "movestogo" => params.movestogo = Some(parse_value(value, "movestogo")?),
            "depth" => params.depth = Some(parse_value(value, "depth")?),
            "nodes" => params.nodes = Some(parse_value(value, "nodes")?),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            "searchmoves" => {
                i += 1;
                while let Some(&text) = tokens.get(i)
                    && !GO_KEYWORDS.contains(&text)
                {
                    let mv = Move::from_uci(text).map_err(|_| UciError::InvalidMove {
                        uci_move: text.to_string(),
                    })?;
                    params.searchmoves.push(mv);
                    i += 1;
                }
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(Command::Go(params))
}

/// `setoption name <id> [value <x>]`
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some((&"name", rest)) = tokens.split_first() else {
        return Ok(Command::Unknown("setoption".to_string()));
    };
    let split = rest.iter().position(|&t| t == "value").unwrap_or(rest.len());
    let name = rest[..split].join(" ");
    let value = rest.get(split + 1..).map(|v| v.join(" ")).unwrap_or_default();

    match name.to_ascii_lowercase().as_str() {
        "hash" => {
            let mb = value
                .parse::<usize>()
                .ok()
                .filter(|mb| (1..=MAX_HASH_MB).contains(mb))
                .ok_or_else(|| UciError::InvalidOption {
                    name: name.clone(),
                    value: value.clone(),
                })?;
            Ok(Command::SetOption(UciOption::Hash(mb)))
        }
        "clear hash" => Ok(Command::SetOption(UciOption::ClearHash)),
        _ => Ok(Command::Unknown(format!("setoption {name}"))),
    }
}

fn parse_millis(token: Option<&str>, param: &str) -> Result<Duration, UciError> {
    // Some GUIs send negative remaining time once the flag falls.
    let ms: i64 = parse_value(token, param)?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

fn parse_value<T: std::str::FromStr>(token: Option<&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}
