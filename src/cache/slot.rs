//! Per-path cache slot with in-flight probe deduplication.
//!
//! ```text
//!            get()                 probe Ok (epoch unchanged)
//!   Empty ─────────► Probing ───────────────────────────────► Ready
//!     ▲                 │                                        │
//!     │  probe Err /    │                                        │
//!     │  cancelled /    │                                        │
//!     └─── panicked ────┘                                        │
//!     ▲                                                          │
//!     └──────────────────────── invalidate() ────────────────────┘
//! ```
//!
//! `invalidate()` bumps the slot epoch. A probe started under an older epoch
//! never commits, so an invalidation that is logically later than the probe
//! always wins.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::cancel::CancelToken;
use crate::metadata::Metadata;

#[derive(Debug)]
enum SlotState {
    Empty,
    Probing,
    Ready(Metadata),
}

#[derive(Debug)]
struct SlotInner {
    state: SlotState,
    epoch: u64,
}

/// Outcome of claiming a slot.
pub(super) enum Claim<'a> {
    /// A snapshot is cached.
    Hit(Metadata),
    /// The caller owns the probe and must complete it through the ticket.
    Probe(ProbeTicket<'a>),
    /// The caller's token was cancelled while waiting.
    Cancelled,
}

/// Holds one cached snapshot for a path.
#[derive(Debug)]
pub(super) struct Slot {
    inner: Mutex<SlotInner>,
    ready: Condvar,
}

impl Slot {
    pub(super) fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                state: SlotState::Empty,
                epoch: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Return the cached snapshot, or claim the right to probe.
    ///
    /// Blocks while another caller's probe for the same path is in flight.
    pub(super) fn claim<'a>(
        &'a self,
        cancel: Option<&CancelToken>,
        poll: Duration,
    ) -> Claim<'a> {
        let mut inner = self.inner.lock();
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Claim::Cancelled;
            }
            let cached = match &inner.state {
                SlotState::Ready(meta) => meta.clone(),
                SlotState::Empty => break,
                SlotState::Probing => {
                    self.wait(&mut inner, cancel, poll);
                    continue;
                }
            };
            return Claim::Hit(cached);
        }

        inner.state = SlotState::Probing;
        Claim::Probe(ProbeTicket {
            slot: self,
            epoch: inner.epoch,
            finished: false,
        })
    }

    fn wait(&self, inner: &mut MutexGuard<'_, SlotInner>, cancel: Option<&CancelToken>, poll: Duration) {
        match cancel {
            Some(_) => {
                self.ready.wait_for(inner, poll);
            }
            None => self.ready.wait(inner),
        }
    }

    /// Cached snapshot without probing.
    pub(super) fn peek(&self) -> Option<Metadata> {
        match &self.inner.lock().state {
            SlotState::Ready(meta) => Some(meta.clone()),
            _ => None,
        }
    }

    /// Drop the snapshot and fence off in-flight probes.
    ///
    /// Returns whether a snapshot was cached.
    pub(super) fn invalidate(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        let had_snapshot = matches!(inner.state, SlotState::Ready(_));
        inner.state = SlotState::Empty;
        drop(inner);
        self.ready.notify_all();
        had_snapshot
    }
}

/// Exclusive right to probe a slot, returned by [`Slot::claim`].
///
/// Dropping an unfinished ticket (e.g. when the probe panics) resets the
/// slot so waiters can retry.
pub(super) struct ProbeTicket<'a> {
    slot: &'a Slot,
    epoch: u64,
    finished: bool,
}

impl ProbeTicket<'_> {
    /// Record the probe outcome.
    ///
    /// Returns whether the snapshot was committed. It is not committed if the
    /// probe failed, or if the slot was invalidated after the probe started.
    pub(super) fn complete(mut self, outcome: Option<&Metadata>) -> bool {
        self.finished = true;
        self.settle(outcome)
    }

    fn settle(&self, outcome: Option<&Metadata>) -> bool {
        let mut inner = self.slot.inner.lock();
        let current = inner.epoch == self.epoch && matches!(inner.state, SlotState::Probing);
        let committed = current && outcome.is_some();
        if current {
            inner.state = match outcome {
                Some(meta) => SlotState::Ready(meta.clone()),
                None => SlotState::Empty,
            };
        }
        drop(inner);
        self.slot.ready.notify_all();
        committed
    }
}

impl Drop for ProbeTicket<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.settle(None);
        }
    }
}
