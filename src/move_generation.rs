pub mod attack_tables;
pub mod generator;
pub mod magics;
pub mod perft;
pub mod rays;
