//! `laneboard-client`: the client half of laneboard.
//!
//! A [`BoardSession`] is one editor's local, possibly speculative copy of a
//! board. Drags rearrange it instantly through the core mutator; a
//! [`Poller`] keeps it in step with the server except while a drag is in
//! flight; [`submit_move`] sends a finished drag and, if the commit fails,
//! throws the speculation away and resynchronizes.
//!
//! ```text
//! drag_start ─► drag_over* ─► drag_end ──► MoveIntent ──► submit_move
//!     │                          │                           │
//!     └── poller suspended ──────┘                 failure: refetch + revert
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod notice;
pub mod poller;
pub mod reconcile;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::BoardApi;
pub use error::ClientError;
pub use http::HttpBoardClient;
pub use notice::{Notice, NoticeLevel};
pub use poller::{Poller, PollerHandle, TickOutcome};
pub use reconcile::submit_move;
pub use session::{BoardSession, MergeOutcome, SkipReason};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
