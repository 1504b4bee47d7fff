use crate::error::ContainerErrors;
use derivative::Derivative;

/// Identifies an entry inside of a [`DeferredRelease`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseTicket {
    id: u64,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct DeferredReleaseEntry<T> {
    ticket: ReleaseTicket,
    #[derivative(Debug = "ignore")]
    entry: T,
    /// time to live
    ttl: usize,
    /// Ticks remaining
    t: usize,
}

/// [`DeferredRelease<T>`] holds on to values which have been retired, but may still be observed
/// for a few more ticks. Once an entry's time reaches zero it is handed back from [`Self::tick`]
/// so the caller can release it properly.
///
/// Entries come back in insertion order.
#[derive(Derivative)]
#[derivative(Debug, Default(bound = ""))]
pub struct DeferredRelease<T> {
    entries: Vec<DeferredReleaseEntry<T>>,
    next_ticket: u64,
}

impl<T> DeferredRelease<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_ticket: 0,
        }
    }

    /// If no `t` parameter is specified, defaults to `ttl` parameter
    pub fn insert(&mut self, element: T, ttl: usize, t: Option<usize>) -> ReleaseTicket {
        let ticket = ReleaseTicket {
            id: self.next_ticket,
        };
        self.next_ticket += 1;
        self.entries.push(DeferredReleaseEntry {
            ticket,
            entry: element,
            ttl,
            t: t.unwrap_or(ttl),
        });
        ticket
    }

    /// Advance every entry by one tick, returns all entries whose time ran out
    ///
    /// Entries inserted with a `t` of zero are returned on the next tick.
    pub fn tick(&mut self) -> Vec<T> {
        for entry in self.entries.iter_mut() {
            entry.t = entry.t.saturating_sub(1);
        }
        let (expired, alive): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.t == 0);
        self.entries = alive;
        expired.into_iter().map(|entry| entry.entry).collect()
    }

    /// Update the `t` of any release queue entry, if no `t` is specified, defaults to `ttl`
    pub fn update(&mut self, ticket: &ReleaseTicket, new_t: Option<usize>) -> Result<(), ContainerErrors> {
        self.entries
            .iter_mut()
            .find(|entry| entry.ticket == *ticket)
            .map(|entry| entry.t = new_t.unwrap_or(entry.ttl))
            .ok_or(ContainerErrors::NonexistentSlot)
    }

    /// Removes every entry regardless of their remaining time
    pub fn drain(&mut self) -> Vec<T> {
        self.entries.drain(..).map(|entry| entry.entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
