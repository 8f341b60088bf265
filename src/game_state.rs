pub mod chess_types;
pub mod make_move;
pub mod position;
