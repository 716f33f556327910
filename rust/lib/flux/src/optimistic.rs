//! Optimistic mutation cell.
//!
//! Holds one displayed value that a mutation may overwrite before the
//! server confirms it. The cell is a small state machine:
//!
//! ```text
//!            begin                 confirm
//!   Synced ─────────► Pending ─────────────► Overridden
//!     ▲                  │                       │
//!     │    rollback      │                       │
//!     └──────────────────┘                       │
//!     ▲                  reset (any state)       │
//!     └──────────────────────────────────────────┘
//! ```
//!
//! Passive updates (`sync`) only land in `Synced`. `begin` hands out a
//! [`Ticket`] tied to the current generation; `reset` bumps the
//! generation, so a mutation that settles after the cell was reset for a
//! different item cannot write into it.

/// Receipt for an in-flight mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<T> {
    generation: u64,
    previous: T,
}

impl<T> Ticket<T> {
    /// The value displayed before the mutation began.
    pub fn previous(&self) -> &T {
        &self.previous
    }
}

#[derive(Debug, Clone)]
pub struct Optimistic<T> {
    value: T,
    pending: bool,
    overridden: bool,
    generation: u64,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            pending: false,
            overridden: false,
            generation: 0,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True from `begin` until a rollback or reset.
    pub fn has_override(&self) -> bool {
        self.overridden
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply `intended` immediately. Returns `None` while another
    /// mutation is pending.
    pub fn begin(&mut self, intended: T) -> Option<Ticket<T>> {
        if self.is_pending() {
            return None;
        }
        let previous = std::mem::replace(&mut self.value, intended);
        self.pending = true;
        self.overridden = true;
        Some(Ticket {
            generation: self.generation,
            previous,
        })
    }

    /// Settle successfully with `settled`. The override stays set.
    /// Returns false for a ticket from an earlier generation.
    pub fn confirm(&mut self, ticket: &Ticket<T>, settled: T) -> bool {
        if !self.owns(ticket) {
            return false;
        }
        self.value = settled;
        self.pending = false;
        true
    }

    /// Settle with failure: restore the value captured by `begin` and
    /// trust the next passive update again.
    pub fn rollback(&mut self, ticket: &Ticket<T>) -> bool {
        if !self.owns(ticket) {
            return false;
        }
        self.value = ticket.previous.clone();
        self.pending = false;
        self.overridden = false;
        true
    }

    /// Passive update from an authoritative source. Ignored while a
    /// mutation is pending or its result is still overriding.
    pub fn sync(&mut self, authoritative: T) -> bool {
        if self.is_pending() || self.overridden {
            return false;
        }
        self.value = authoritative;
        true
    }

    /// Start over with `value`, e.g. when a different item takes this
    /// cell's place. Outstanding tickets become stale.
    pub fn reset(&mut self, value: T) {
        self.value = value;
        self.pending = false;
        self.overridden = false;
        self.generation += 1;
    }

    fn owns(&self, ticket: &Ticket<T>) -> bool {
        ticket.generation == self.generation && self.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_applies_and_captures_previous() {
        let mut cell = Optimistic::new(5u32);
        let ticket = cell.begin(6).unwrap();
        assert_eq!(*cell.value(), 6);
        assert_eq!(*ticket.previous(), 5);
        assert!(cell.is_pending());
        assert!(cell.has_override());
    }

    #[test]
    fn second_begin_while_pending_is_refused() {
        let mut cell = Optimistic::new(5u32);
        let _ticket = cell.begin(6).unwrap();
        assert!(cell.begin(7).is_none());
        assert_eq!(*cell.value(), 6);
    }

    #[test]
    fn confirm_keeps_override() {
        let mut cell = Optimistic::new(5u32);
        let ticket = cell.begin(6).unwrap();
        assert!(cell.confirm(&ticket, 6));
        assert!(!cell.is_pending());
        assert!(cell.has_override());

        assert!(!cell.sync(5));
        assert_eq!(*cell.value(), 6);
    }

    #[test]
    fn rollback_restores_and_clears_override() {
        let mut cell = Optimistic::new(5u32);
        let ticket = cell.begin(6).unwrap();
        assert!(cell.rollback(&ticket));
        assert_eq!(*cell.value(), 5);
        assert!(!cell.has_override());

        assert!(cell.sync(9));
        assert_eq!(*cell.value(), 9);
    }

    #[test]
    fn sync_ignored_while_pending() {
        let mut cell = Optimistic::new(5u32);
        let _ticket = cell.begin(6).unwrap();
        assert!(!cell.sync(5));
        assert_eq!(*cell.value(), 6);
    }

    #[test]
    fn reset_invalidates_outstanding_ticket() {
        let mut cell = Optimistic::new(5u32);
        let ticket = cell.begin(6).unwrap();
        cell.reset(40);
        assert_eq!(cell.generation(), 1);

        assert!(!cell.confirm(&ticket, 6));
        assert!(!cell.rollback(&ticket));
        assert_eq!(*cell.value(), 40);
        assert!(!cell.has_override());
        assert!(cell.sync(41));
    }

    #[test]
    fn settled_ticket_cannot_settle_twice() {
        let mut cell = Optimistic::new(1u32);
        let ticket = cell.begin(2).unwrap();
        assert!(cell.confirm(&ticket, 2));
        assert!(!cell.rollback(&ticket));
        assert_eq!(*cell.value(), 2);
    }
}
