pub mod board;
pub mod events;
