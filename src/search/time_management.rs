//! Per-move time budgeting.
//!
//! The remaining clock has to be split across the moves the game will
//! still take. With `movestogo` the split is explicit; otherwise the
//! expected number of remaining moves is interpolated by game phase
//! between a full-game average and a small endgame reserve. The final
//! time control period (`movestogo 1`) may spend almost everything, held
//! back only by a safety factor that shrinks with low clocks.

use crate::game_state::position::Position;

const AVERAGE_GAME_LENGTH: u64 = 40;

/// Milliseconds the next search may consume, given the total usable time
/// (clock plus increment) in milliseconds.
pub fn compute_search_time(position: &Position, total_time_ms: u64, movestogo: u64) -> u64 {
    if movestogo == 1 {
        // f(x) = (x/1000)^1.1 / (x/1000 + 1)^1.1 approaches 1 for large
        // clocks and leaves a real buffer for small ones.
        let seconds = total_time_ms as f64 / 1000.0;
        let factor = seconds.powf(1.1) / (seconds + 1.0).powf(1.1);
        return (total_time_ms as f64 * factor) as u64;
    }

    let phase = position.phase() as u64;
    let max_moves = if movestogo != 0 && movestogo < AVERAGE_GAME_LENGTH {
        movestogo
    } else {
        AVERAGE_GAME_LENGTH
    };
    let divisor = (max_moves * (256 - phase) + 8 * phase) / 256;
    total_time_ms / divisor.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::position::Position;

    #[test]
    fn opening_budget_is_about_a_fortieth_of_the_clock() {
        let position = Position::new_game();
        let budget = compute_search_time(&position, 120_000, 0);
        assert_eq!(budget, 3_000);
    }

    #[test]
    fn endgame_budget_grows_as_material_comes_off() {
        let endgame =
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let opening = Position::new_game();
        let endgame_budget = compute_search_time(&endgame, 60_000, 0);
        let opening_budget = compute_search_time(&opening, 60_000, 0);
        assert!(endgame_budget > opening_budget);
        // Bare kings: divisor collapses to 8, so an eighth of the clock.
        assert_eq!(endgame_budget, 7_500);
    }

    #[test]
    fn movestogo_caps_the_divisor() {
        let position = Position::new_game();
        let few_moves = compute_search_time(&position, 60_000, 5);
        let many_moves = compute_search_time(&position, 60_000, 0);
        assert!(few_moves > many_moves);
    }

    #[test]
    fn last_move_of_the_period_spends_most_but_not_all() {
        let position = Position::new_game();
        let budget = compute_search_time(&position, 60_000, 1);
        assert!(budget > 50_000, "budget too conservative: {budget}");
        assert!(budget < 60_000, "budget must leave a buffer: {budget}");

        let tiny = compute_search_time(&position, 800, 1);
        assert!(tiny < 500, "small clocks need a large buffer: {tiny}");
    }
}
