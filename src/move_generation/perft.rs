//! Perft: recursive legal-move node counting for generator validation.

use crate::game_state::make_move::{do_move, move_is_legal, undo_move};
use crate::game_state::position::Position;
use crate::move_generation::generator::pseudo_legal_moves;

pub fn perft(position: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0u64;
    for mv in pseudo_legal_moves(position) {
        if !move_is_legal(position, mv) {
            continue;
        }
        do_move(position, mv);
        nodes += perft(position, depth - 1);
        undo_move(position, mv);
    }
    nodes
}
