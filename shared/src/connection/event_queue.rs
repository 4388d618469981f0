use crate::protocol::index_of;

/// Result of offering an ordered event to an [`EventQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The event filled an empty position.
    Stored,
    /// The position was already filled. The first copy wins.
    Duplicate,
    /// The index is below the baseline and was already executed.
    Stale,
    /// The index is beyond the admission ceiling.
    TooFarAhead,
    /// The sequence carries no order index.
    Unordered,
}

/// Sparse reorder buffer of ordered events.
///
/// Position `n` of `events` holds the event with absolute index
/// `index + n`; `None` marks a known gap. The baseline only moves forward.
#[derive(Clone, Debug)]
pub struct EventQueue {
    index: u64,
    events: Vec<Option<Vec<u8>>>,
    max_ahead: u64,
}

impl EventQueue {
    pub fn new(max_ahead: u64) -> Self {
        Self {
            index: 0,
            events: Vec::new(),
            max_ahead,
        }
    }

    /// Absolute index of the next event to execute.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Number of buffered positions, gaps included.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offer an encoded ordered event.
    pub fn admit(&mut self, seq: &[u8]) -> Admission {
        let Some(index) = index_of(seq) else {
            return Admission::Unordered;
        };

        if index < self.index {
            return Admission::Stale;
        }

        let offset = index - self.index;
        if offset >= self.max_ahead {
            return Admission::TooFarAhead;
        }

        let offset = offset as usize;
        if offset >= self.events.len() {
            self.events.resize(offset + 1, None);
        }

        match &mut self.events[offset] {
            Some(_) => Admission::Duplicate,
            empty => {
                *empty = Some(seq.to_vec());
                Admission::Stored
            }
        }
    }

    /// Drain the contiguous run of events at the front and advance the
    /// baseline past them.
    pub fn take_ready(&mut self) -> Vec<Vec<u8>> {
        let count = self
            .events
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.events.len());

        self.index += count as u64;
        self.events.drain(..count).flatten().collect()
    }

    /// Absolute indices of the known gaps, at most `limit` of them.
    pub fn missing(&self, limit: usize) -> Vec<u64> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.is_none())
            .map(|(n, _)| self.index + n as u64)
            .take(limit)
            .collect()
    }
}
