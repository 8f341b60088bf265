//! UCI protocol front-end and command loop.
//!
//! A thin line-oriented parser: it maintains the current position and the
//! game move list, translates `go` into a search argument, and routes
//! output from the worker back over stdout. While a search runs only
//! `stop` and `quit` are honored; every other command is dropped, which
//! keeps the position and transposition table single-owner at all times.

use std::io::{self, BufRead};

use crate::game_state::make_move::do_move;
use crate::game_state::position::Position;
use crate::move_generation::attack_tables::attack_tables;
use crate::moves::move_codes::Move;
use crate::search::search::{ScoreInfo, SearchArgument, SearchInfo, MAX_DEPTH};
use crate::search::transposition_table::TranspositionTable;
use crate::search::worker::SearchWorker;
use crate::search::zobrist::hash_position;
use crate::utils::long_algebraic::{lan_to_move, move_to_lan};

const UCI_ENGINE_NAME: &str = "Rowan Chess";
const UCI_ENGINE_AUTHOR: &str = "the Rowan Chess authors";

const HASH_DEFAULT_MIB: usize = 1;
const HASH_MIN_MIB: usize = 1;
const HASH_MAX_MIB: usize = 32_768;

pub fn run_stdio_loop() -> io::Result<()> {
    // Building the attack tables takes a moment; do it before the GUI
    // starts timing us, and warm the Zobrist keys along the way.
    attack_tables();
    let _ = hash_position(&Position::new_game());

    let stdin = io::stdin();
    let mut uci = UciState::new();

    for line in stdin.lock().lines() {
        let line = line?;
        if uci.handle_command(&line) {
            break;
        }
    }

    Ok(())
}

struct UciState {
    position: Position,
    game_moves: Vec<Move>,
    hash_mib: usize,
    // The table lives either here or inside the running worker, never in
    // both places.
    tt: Option<TranspositionTable>,
    worker: SearchWorker,
}

impl UciState {
    fn new() -> Self {
        Self {
            position: Position::new_game(),
            game_moves: Vec::new(),
            hash_mib: HASH_DEFAULT_MIB,
            tt: None,
            worker: SearchWorker::new(),
        }
    }

    /// Handle one input line; returns true when the loop should exit.
    fn handle_command(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }
        let command = trimmed.split_whitespace().next().unwrap_or_default();

        if self.worker.is_running() && command != "stop" && command != "quit" {
            // Commands racing against a live search are dropped.
            return false;
        }

        match command {
            "uci" => {
                println!("id name {UCI_ENGINE_NAME}");
                println!("id author {UCI_ENGINE_AUTHOR}");
                println!(
                    "option name Hash type spin default {HASH_DEFAULT_MIB} \
                     min {HASH_MIN_MIB} max {HASH_MAX_MIB}"
                );
                println!("uciok");
            }
            "isready" => {
                println!("readyok");
            }
            "setoption" => {
                self.handle_setoption(trimmed);
            }
            "ucinewgame" => {
                let mut tt = self.take_table();
                tt.resize(self.hash_mib);
                self.tt = Some(tt);
            }
            "position" => {
                // A malformed position command is dropped entirely; the
                // previous position stays in effect.
                let _ = self.handle_position(trimmed);
            }
            "go" => {
                self.handle_go(trimmed);
            }
            "stop" => {
                if let Some(tt) = self.worker.stop() {
                    self.tt = Some(tt);
                }
            }
            "quit" => {
                self.worker.stop();
                self.tt = None;
                return true;
            }
            _ => {
                // Unknown commands are ignored per UCI convention.
            }
        }

        false
    }

    /// Reclaim the transposition table from wherever it currently lives,
    /// creating it on first use.
    fn take_table(&mut self) -> TranspositionTable {
        if let Some(tt) = self.worker.collect() {
            return tt;
        }
        self.tt
            .take()
            .unwrap_or_else(|| TranspositionTable::new(self.hash_mib))
    }

    /// Only `Hash` is exposed. Unknown names and out-of-range values are
    /// ignored without complaint, as GUIs expect.
    fn handle_setoption(&mut self, line: &str) {
        let mut name_tokens = Vec::<&str>::new();
        let mut value_tokens = Vec::<&str>::new();
        let mut mode = "";

        for token in line.split_whitespace().skip(1) {
            match token {
                "name" => mode = "name",
                "value" => mode = "value",
                _ if mode == "name" => name_tokens.push(token),
                _ if mode == "value" => value_tokens.push(token),
                _ => {}
            }
        }

        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");

        if name.eq_ignore_ascii_case("Hash") {
            if let Ok(mib) = value.parse::<usize>() {
                if (HASH_MIN_MIB..=HASH_MAX_MIB).contains(&mib) {
                    self.hash_mib = mib;
                }
            }
        }
    }

    fn handle_position(&mut self, line: &str) -> Result<(), String> {
        let mut tokens = line.split_whitespace().peekable();
        let _ = tokens.next(); // "position"

        let mut position = match tokens.next() {
            Some("startpos") => Position::new_game(),
            Some("fen") => {
                let mut fen_parts = Vec::<&str>::new();
                while let Some(token) = tokens.peek() {
                    if *token == "moves" {
                        break;
                    }
                    fen_parts.push(tokens.next().unwrap_or_default());
                }
                if fen_parts.is_empty() {
                    return Err("missing FEN after 'position fen'".to_owned());
                }
                Position::from_fen(&fen_parts.join(" "))?
            }
            other => return Err(format!("unsupported position token {other:?}")),
        };

        let mut moves = Vec::<Move>::new();
        if tokens.peek().copied() == Some("moves") {
            let _ = tokens.next();
            for lan in tokens {
                let mv = lan_to_move(lan, &mut position)?;
                do_move(&mut position, mv);
                moves.push(mv);
            }
        }

        self.position = position;
        self.game_moves = moves;
        Ok(())
    }

    fn handle_go(&mut self, line: &str) {
        let tt = self.take_table();
        let running = self.worker.running_flag();

        let mut argument = SearchArgument {
            position: self.position.clone(),
            game_moves: self.game_moves.clone(),
            infinite: false,
            depth: MAX_DEPTH,
            mate: 0,
            movestogo: 0,
            perft: 0,
            nodes: u64::MAX,
            time: [0; 2],
            inc: [0; 2],
            movetime: 0,
            info_sender: Box::new(|info| println!("{}", format_info(info))),
            best_move_sender: Box::new(|mv| println!("bestmove {}", move_to_lan(mv))),
            running,
        };
        parse_go_tokens(line, &mut argument);

        self.worker.start(argument, tt);
    }
}

fn parse_go_tokens(line: &str, argument: &mut SearchArgument) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut i = 0usize;
    while i < tokens.len() {
        match tokens[i] {
            "infinite" => argument.infinite = true,
            "depth" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.depth = value;
                }
            }
            "nodes" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.nodes = value;
                }
            }
            "mate" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.mate = value;
                }
            }
            "movestogo" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.movestogo = value;
                }
            }
            "perft" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.perft = value;
                }
            }
            "wtime" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.time[0] = value;
                }
            }
            "btime" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.time[1] = value;
                }
            }
            "winc" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.inc[0] = value;
                }
            }
            "binc" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.inc[1] = value;
                }
            }
            "movetime" => {
                i += 1;
                if let Some(value) = tokens.get(i).and_then(|t| t.parse().ok()) {
                    argument.movetime = value;
                }
            }
            _ => {}
        }
        i += 1;
    }
}

/// Render one info line. Field order is fixed: depth, nodes, score,
/// lowerbound, nps, time; absent fields are skipped.
fn format_info(info: &SearchInfo) -> String {
    let mut out = String::from("info");
    if let Some(depth) = info.depth {
        out.push_str(&format!(" depth {depth}"));
    }
    out.push_str(&format!(" nodes {}", info.nodes));
    match info.score {
        Some(ScoreInfo::Centipawns(cp)) => out.push_str(&format!(" score cp {cp}")),
        Some(ScoreInfo::MateIn(moves)) => out.push_str(&format!(" score mate {moves}")),
        None => {}
    }
    if info.lower_bound {
        out.push_str(" lowerbound");
    }
    out.push_str(&format!(" nps {}", info.nps));
    if let Some(time_ms) = info.time_ms {
        out.push_str(&format!(" time {time_ms}"));
    }
    out
}
