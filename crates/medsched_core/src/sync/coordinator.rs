//! Optimistic persistence coordinator with rollback.
//!
//! # Responsibility
//! - Hold the canonical tree snapshot and swap in mutated snapshots
//!   optimistically before the remote call resolves.
//! - Serialize persists: exactly zero or one may be in flight.
//! - Roll back to the immediately-prior snapshot when the remote fails.
//!
//! # Invariants
//! - `begin_persist` while a persist is unresolved fails busy; it never
//!   queues.
//! - A failed resolve restores the prior snapshot before reporting the
//!   failure; locally-applied-but-unpersisted state is never kept silently.
//! - Tickets are single-use; a stale or unknown ticket cannot resolve the
//!   current persist.

use crate::model::tree::ReminderTree;
use crate::sync::store::StoreFailure;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Handle identifying one in-flight persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersistTicket(u64);

impl PersistTicket {
    /// Raw value for shells that carry the ticket across a boundary.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Rebuilds a ticket from [`PersistTicket::value`].
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }
}

impl Display for PersistTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A persist is already in flight; retry after it settles.
    PersistInFlight,
    /// Resolve was called with no persist in flight.
    NoPersistInFlight,
    /// Resolve named a ticket other than the in-flight one.
    TicketMismatch {
        expected: PersistTicket,
        got: PersistTicket,
    },
    /// The remote call failed; the prior snapshot has been restored.
    Persist { failure: StoreFailure },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersistInFlight => write!(f, "a persist is already in flight"),
            Self::NoPersistInFlight => write!(f, "no persist is in flight"),
            Self::TicketMismatch { expected, got } => {
                write!(f, "persist ticket mismatch: expected {expected}, got {got}")
            }
            Self::Persist { failure } => write!(f, "persist failed and was rolled back: {failure}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist { failure } => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    ticket: PersistTicket,
    prior: ReminderTree,
}

/// Canonical-snapshot holder implementing optimistic-then-confirm.
#[derive(Debug, Default)]
pub struct SyncCoordinator {
    canonical: ReminderTree,
    in_flight: Option<InFlight>,
    ticket_seq: u64,
}

impl SyncCoordinator {
    pub fn new(initial: ReminderTree) -> Self {
        Self {
            canonical: initial,
            in_flight: None,
            ticket_seq: 0,
        }
    }

    /// Current canonical snapshot (already optimistic while in flight).
    pub fn tree(&self) -> &ReminderTree {
        &self.canonical
    }

    pub fn in_flight_ticket(&self) -> Option<PersistTicket> {
        self.in_flight.as_ref().map(|pending| pending.ticket)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Adopts a freshly loaded snapshot as canonical.
    ///
    /// Rejected while a persist is unresolved so a fetch result cannot race
    /// an optimistic mutation.
    pub fn install(&mut self, tree: ReminderTree) -> Result<(), SyncError> {
        if self.is_busy() {
            return Err(SyncError::PersistInFlight);
        }
        info!(
            "event=tree_install module=sync status=ok persons={}",
            tree.persons.len()
        );
        self.canonical = tree;
        Ok(())
    }

    /// Optimistically swaps in `new_tree` and opens the persist window.
    ///
    /// The prior snapshot is retained until the matching
    /// [`SyncCoordinator::resolve_persist`] settles the call.
    pub fn begin_persist(&mut self, new_tree: ReminderTree) -> Result<PersistTicket, SyncError> {
        if self.is_busy() {
            return Err(SyncError::PersistInFlight);
        }

        self.ticket_seq += 1;
        let ticket = PersistTicket(self.ticket_seq);
        let prior = std::mem::replace(&mut self.canonical, new_tree);
        self.in_flight = Some(InFlight { ticket, prior });
        info!("event=persist_begin module=sync ticket={ticket}");
        Ok(ticket)
    }

    /// Settles the in-flight persist with the remote outcome.
    ///
    /// Success keeps the optimistic snapshot canonical. Failure restores the
    /// prior snapshot and surfaces the failure to the caller.
    pub fn resolve_persist(
        &mut self,
        ticket: PersistTicket,
        outcome: Result<(), StoreFailure>,
    ) -> Result<(), SyncError> {
        let pending = self.in_flight.take().ok_or(SyncError::NoPersistInFlight)?;
        if pending.ticket != ticket {
            let expected = pending.ticket;
            self.in_flight = Some(pending);
            return Err(SyncError::TicketMismatch {
                expected,
                got: ticket,
            });
        }

        match outcome {
            Ok(()) => {
                info!("event=persist_confirm module=sync status=ok ticket={ticket}");
                Ok(())
            }
            Err(failure) => {
                warn!(
                    "event=persist_rollback module=sync status=error ticket={ticket} reason={failure}"
                );
                self.canonical = pending.prior;
                Err(SyncError::Persist { failure })
            }
        }
    }
}
