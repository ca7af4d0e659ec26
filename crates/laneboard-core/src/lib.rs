pub mod access;
pub mod board;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intent;
pub mod io;
pub mod mutator;
pub mod paths;
pub mod reorder;
pub mod store;
pub mod types;

pub use error::{BoardError, ErrorKind, Result};
