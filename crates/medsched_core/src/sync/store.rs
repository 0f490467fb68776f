//! Remote store and credential SPI contracts.
//!
//! # Responsibility
//! - Define the load/persist contract the shell's transport must implement.
//! - Keep HTTP details (verbs, URLs, headers) outside the core.
//!
//! # Invariants
//! - Persistence is whole-tree replace; the core never assumes patch
//!   semantics.
//! - Bearer tokens are opaque and fetched per call, never cached by core.

use crate::model::tree::ReminderTree;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Authenticated scope one tree belongs to.
///
/// The remote store keys reminder schedules by the signed-in account email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountScope {
    pub email: String,
}

impl AccountScope {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Opaque bearer credential supplied per call.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for BearerToken {
    // Credential material must not leak through Debug formatting.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(****)")
    }
}

/// Result type used by store and token operations.
pub type StoreResult<T> = Result<T, StoreFailure>;

/// Transport-agnostic failure contract for remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFailure {
    /// The remote endpoint could not be reached.
    Unavailable { message: String },
    /// The single attempt timed out; treated as a failure, never retried
    /// automatically.
    Timeout,
    /// The remote rejected the request.
    Rejected { status: u16, message: String },
    /// No bearer credential could be produced for the call.
    TokenUnavailable { message: String },
}

impl Display for StoreFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { message } => write!(f, "remote store unavailable: {message}"),
            Self::Timeout => write!(f, "remote store call timed out"),
            Self::Rejected { status, message } => {
                write!(f, "remote store rejected request ({status}): {message}")
            }
            Self::TokenUnavailable { message } => {
                write!(f, "bearer token unavailable: {message}")
            }
        }
    }
}

impl Error for StoreFailure {}

/// Remote system-of-record contract for reminder trees.
pub trait ReminderStore {
    /// Loads the full current tree for one authenticated scope.
    fn fetch_tree(&self, scope: &AccountScope, token: &BearerToken) -> StoreResult<ReminderTree>;

    /// Idempotent whole-tree replace.
    fn replace_tree(&self, tree: &ReminderTree, token: &BearerToken) -> StoreResult<()>;
}

/// Supplies one bearer credential per remote call.
pub trait TokenProvider {
    fn bearer_token(&self) -> StoreResult<BearerToken>;
}
