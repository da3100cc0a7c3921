//! Shared virtual cycle clock.
//!
//! Emulated components that run on their own threads (CPU, video chip)
//! register as participants of a [`Clock`] and spend virtual cycles through
//! their [`ClockHandle`]. The clock enforces one ordering constraint: no
//! active participant may run strictly ahead of another. [`ClockHandle::advance`]
//! blocks until the constraint is satisfied, so independently scheduled
//! threads observe a consistent virtual "current cycle" without any
//! real-time pacing of their own.
//!
//! A participant that temporarily has nothing to synchronise against (e.g. a
//! renderer whose output sink is not ready yet) can suspend its
//! participation; while suspended its `advance` calls return immediately and
//! it constrains nobody. Resuming re-aligns it to the leading edge so it does
//! not stall the other participants while catching up.

use std::sync::{Arc, Condvar, Mutex};

/// One registered participant.
#[derive(Debug)]
struct Participant {
    /// Virtual cycles spent so far.
    cycles: u64,
    /// Whether the participant takes part in arbitration.
    active: bool,
    /// Set when the owning handle is dropped; the slot is dead.
    released: bool,
}

#[derive(Debug, Default)]
struct ClockState {
    participants: Vec<Participant>,
}

impl ClockState {
    /// Leading edge: the highest cycle count among live active participants.
    fn leading_edge(&self) -> u64 {
        self.participants
            .iter()
            .filter(|p| p.active && !p.released)
            .map(|p| p.cycles)
            .max()
            .unwrap_or(0)
    }

    /// Trailing edge among live active participants other than `id`.
    ///
    /// `None` when no other active participant exists, in which case `id`
    /// is unconstrained.
    fn trailing_edge_excluding(&self, id: usize) -> Option<u64> {
        self.participants
            .iter()
            .enumerate()
            .filter(|(i, p)| *i != id && p.active && !p.released)
            .map(|(_, p)| p.cycles)
            .min()
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<ClockState>,
    moved: Condvar,
}

/// A shared virtual cycle clock.
///
/// Cheap to clone; all clones refer to the same clock.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    inner: Arc<Inner>,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new participant.
    ///
    /// The participant joins active, at the current leading edge, so that
    /// registering never makes existing participants appear ahead.
    #[must_use]
    pub fn register(&self) -> ClockHandle {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        let cycles = state.leading_edge();
        state.participants.push(Participant {
            cycles,
            active: true,
            released: false,
        });
        let id = state.participants.len() - 1;
        log::trace!("clock: participant {id} registered at cycle {cycles}");
        ClockHandle {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    /// The consistent global time: the trailing edge of the active
    /// participants (no active participant has advanced past it without
    /// every other active participant having reached it).
    #[must_use]
    pub fn current_cycle(&self) -> u64 {
        let state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .participants
            .iter()
            .filter(|p| p.active && !p.released)
            .map(|p| p.cycles)
            .min()
            .unwrap_or_else(|| state.leading_edge())
    }
}

/// Per-participant token of a [`Clock`].
///
/// Dropping the handle releases the participant and wakes any peers blocked
/// in [`advance`](ClockHandle::advance) on it.
#[derive(Debug)]
pub struct ClockHandle {
    inner: Arc<Inner>,
    id: usize,
}

impl ClockHandle {
    /// Per-thread setup before the first `advance` call.
    ///
    /// Re-aligns the participant to the leading edge in case other
    /// participants ran between `register` and the start of this thread.
    pub fn prepare(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        let edge = state.leading_edge();
        let p = &mut state.participants[self.id];
        if p.cycles < edge {
            p.cycles = edge;
        }
        drop(state);
        self.inner.moved.notify_all();
    }

    /// Spend `n` virtual cycles.
    ///
    /// Blocks while this participant is strictly ahead of any other active
    /// participant. Returns immediately when participation is suspended.
    pub fn advance(&self, n: u64) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.participants[self.id].active {
            return;
        }
        state.participants[self.id].cycles += n;
        self.inner.moved.notify_all();

        loop {
            let own = state.participants[self.id].cycles;
            match state.trailing_edge_excluding(self.id) {
                Some(trailing) if own > trailing => {
                    state = self
                        .inner
                        .moved
                        .wait(state)
                        .unwrap_or_else(|e| e.into_inner());
                    // A peer may have suspended us while we slept.
                    if !state.participants[self.id].active {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Charge a bus-contention penalty of `n` cycles to every *other* active
    /// participant: their counters jump forward by `n` without them doing
    /// any work, i.e. they lose `n` cycles of budget.
    ///
    /// Like [`advance`](Self::advance), a no-op while this participant's
    /// own participation is suspended.
    pub fn steal(&self, n: u64) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.participants[self.id].active {
            return;
        }
        for (i, p) in state.participants.iter_mut().enumerate() {
            if i != self.id && p.active && !p.released {
                p.cycles += n;
            }
        }
        drop(state);
        self.inner.moved.notify_all();
    }

    /// Temporarily leave arbitration.
    ///
    /// While suspended, `advance` returns immediately and this participant
    /// constrains nobody.
    pub fn suspend_participation(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        state.participants[self.id].active = false;
        drop(state);
        log::trace!("clock: participant {} suspended", self.id);
        self.inner.moved.notify_all();
    }

    /// Rejoin arbitration at the leading edge.
    pub fn resume_participation(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        let edge = state.leading_edge();
        let p = &mut state.participants[self.id];
        p.active = true;
        if p.cycles < edge {
            p.cycles = edge;
        }
        drop(state);
        log::trace!("clock: participant {} resumed", self.id);
        self.inner.moved.notify_all();
    }

    /// This participant's own cycle counter.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        let state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        state.participants[self.id].cycles
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        let p = &mut state.participants[self.id];
        p.active = false;
        p.released = true;
        drop(state);
        self.inner.moved.notify_all();
    }
}
