pub mod algebraic;
pub mod fen_generator;
pub mod fen_parser;
pub mod long_algebraic;
pub mod render_position;
