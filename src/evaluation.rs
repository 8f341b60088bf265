pub mod evaluate;
pub mod piece_square_tables;
