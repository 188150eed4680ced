//! Versioned state slots.
//!
//! Fetches for the same piece of state may complete out of order. Each fetch
//! takes a [`Ticket`] before it starts; its result is applied only if no
//! newer ticket has been issued for the slot since. Results from superseded
//! fetches are dropped.

/// Sequence number of one update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// The raw sequence number.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0
    }
}

/// A value plus the ticket bookkeeping that guards it.
#[derive(Debug, Clone, Default)]
pub struct Slot<T> {
    value: T,
    issued: u64,
    applied: u64,
}

impl<T> Slot<T> {
    /// A slot holding `value`, with no tickets issued.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            issued: 0,
            applied: 0,
        }
    }

    /// Current value.
    #[must_use]
    pub const fn get(&self) -> &T {
        &self.value
    }

    /// Issue the next ticket. Every earlier ticket becomes stale.
    pub const fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Whether `ticket` is the most recently issued one.
    #[must_use]
    pub const fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Apply `value` if `ticket` is still current. Returns whether it was
    /// applied.
    pub fn apply(&mut self, ticket: Ticket, value: T) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding superseded result"
            );
            return false;
        }
        self.value = value;
        self.applied = ticket.0;
        true
    }

    /// Issue a ticket and apply `value` with it at once.
    pub fn set(&mut self, value: T) -> Ticket {
        let ticket = self.issue();
        self.value = value;
        self.applied = ticket.0;
        ticket
    }

    /// Mutable access to the value for local edits.
    ///
    /// Local edits also supersede any fetch in flight.
    pub const fn edit(&mut self) -> &mut T {
        self.issued += 1;
        self.applied = self.issued;
        &mut self.value
    }

    /// Whether a fetch has been issued and not yet applied.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.applied < self.issued
    }
}
