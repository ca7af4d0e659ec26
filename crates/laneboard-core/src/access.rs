//! Collaborators the coordinator consults but does not own: who may touch a
//! board, and how people hear about moves.

use crate::config::{AccessConfig, AccessMode};
use crate::types::BoardAction;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny(String),
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, user_id: &str, board_id: &str, action: BoardAction) -> AuthDecision;
}

/// Every identified caller may do anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _user_id: &str, _board_id: &str, _action: BoardAction) -> AuthDecision {
        AuthDecision::Allow
    }
}

/// Per-board member lists; non-members are denied every action.
#[derive(Debug, Clone, Default)]
pub struct MembershipAuthorizer {
    members: BTreeMap<String, BTreeSet<String>>,
}

impl MembershipAuthorizer {
    pub fn new(boards: &BTreeMap<String, Vec<String>>) -> Self {
        let members = boards
            .iter()
            .map(|(board, users)| (board.clone(), users.iter().cloned().collect()))
            .collect();
        Self { members }
    }
}

impl Authorizer for MembershipAuthorizer {
    fn authorize(&self, user_id: &str, board_id: &str, action: BoardAction) -> AuthDecision {
        let is_member = self
            .members
            .get(board_id)
            .is_some_and(|users| users.contains(user_id));
        if is_member {
            AuthDecision::Allow
        } else {
            AuthDecision::Deny(format!(
                "user '{user_id}' is not a member of board '{board_id}' and cannot {}",
                action.as_str().replace('_', " ")
            ))
        }
    }
}

pub fn authorizer_from_config(access: &AccessConfig) -> Arc<dyn Authorizer> {
    match access.mode {
        AccessMode::Open => Arc::new(AllowAll),
        AccessMode::Members => Arc::new(MembershipAuthorizer::new(&access.boards)),
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Best-effort delivery. Callers never propagate a failure from `notify`.
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: &str, message: &str, link: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, user_id: &str, message: &str, link: &str) -> Result<(), NotifyError> {
        tracing::info!(user = user_id, link, "{message}");
        Ok(())
    }
}
