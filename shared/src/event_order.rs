use std::cmp::Ordering;

use thiserror::Error;

/// Errors that can occur while deriving event orders
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventOrderError {
    /// The parent order already sits at the bottom of the event tree
    #[error("Cannot spawn a child event below depth {max_depth}. The event tree is too deep to keep a deterministic order")]
    DepthExceeded { max_depth: usize },
}

/// Position of an event inside the deterministic event tree.
///
/// A root order is created from a single index (for example the sequence
/// number the host assigns to an incoming command). Events queued while
/// another event is being performed become its children through
/// [`EventOrder::spawn`], so that their relative order depends only on the
/// order in which they were spawned, never on when they reached the queue.
///
/// Orders compare by depth first: every root sorts before every child, every
/// child before every grandchild. Orders of equal depth compare index by
/// index. The empty order sorts after every non-empty order: it doubles as
/// the "unordered" marker.
#[derive(Clone, Copy)]
pub struct EventOrder {
    indices: [u64; EventOrder::MAX_DEPTH],
    size: u8,
}

impl EventOrder {
    /// Maximum event tree depth.
    pub const MAX_DEPTH: usize = 16;

    /// Root order with the given index.
    pub const fn new(index: u64) -> Self {
        let mut indices = [0; Self::MAX_DEPTH];
        indices[0] = index;
        Self { indices, size: 1 }
    }

    /// The empty order, used for events that were never given a position.
    pub const fn empty() -> Self {
        Self {
            indices: [0; Self::MAX_DEPTH],
            size: 0,
        }
    }

    /// Spawn a child order. The child index is taken from `child_count`,
    /// which is then incremented.
    pub fn spawn(&self, child_count: &mut u64) -> Result<Self, EventOrderError> {
        let size = self.size as usize;
        if size == Self::MAX_DEPTH {
            return Err(EventOrderError::DepthExceeded {
                max_depth: Self::MAX_DEPTH,
            });
        }

        let mut child = *self;
        child.indices[size] = *child_count;
        child.size += 1;

        *child_count += 1;

        Ok(child)
    }

    /// Index of the root event, if the order is not empty.
    pub fn index(&self) -> Option<u64> {
        if self.size > 0 {
            Some(self.indices[0])
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn path(&self) -> &[u64] {
        &self.indices[..self.size as usize]
    }
}

impl Default for EventOrder {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<u64> for EventOrder {
    fn from(index: u64) -> Self {
        Self::new(index)
    }
}

impl PartialEq for EventOrder {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl Eq for EventOrder {}

impl Ord for EventOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .size
                .cmp(&other.size)
                .then_with(|| self.path().cmp(other.path())),
        }
    }
}

impl PartialOrd for EventOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for EventOrder {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path().hash(state);
    }
}

impl std::fmt::Debug for EventOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventOrder{:?}", self.path())
    }
}
