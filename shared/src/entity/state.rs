use crate::entity::sets;

/// One state value of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateRow {
    /// Semantic id, stable across entity kinds.
    pub id: u64,
    pub scale: i64,
    /// Committed value. Readers observe this one.
    pub value: i64,
    /// Pending change, folded into `value` by [`EntityState::adjust`].
    pub delta: i64,
}

impl StateRow {
    pub fn new(id: u64, scale: i64, value: i64) -> Self {
        Self {
            id,
            scale,
            value,
            delta: 0,
        }
    }
}

/// Row data of an entity. Only reachable through the entity lock.
///
/// Row indices are fixed once declared. An invalid index is a schema
/// mismatch between the entity declaration and the code accessing it, and
/// panics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityState {
    rows: Vec<StateRow>,
    clock: u64,
    is_changed: bool,
}

impl EntityState {
    /// Row index of the dynamic flag.
    pub const N_IS_DYNAMIC: usize = 0;
    /// Row index of the tick period.
    pub const N_TICK_PERIOD: usize = 1;

    pub fn new(is_dynamic: bool, tick_period: u64) -> Self {
        Self {
            rows: vec![
                StateRow::new(sets::IS_DYNAMIC, sets::SCALE_ONE, i64::from(is_dynamic)),
                StateRow::new(sets::TICK_PERIOD, sets::SCALE_ONE, tick_period as i64),
            ],
            clock: tick_period,
            is_changed: false,
        }
    }

    /// Declare a new row and return its index.
    pub fn push_row(&mut self, row: StateRow) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn rows(&self) -> &[StateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first row with the given semantic id.
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn id_of(&self, index: usize) -> u64 {
        self.rows[index].id
    }

    pub fn scale_of(&self, index: usize) -> i64 {
        self.rows[index].scale
    }

    pub fn get(&self, index: usize) -> i64 {
        self.rows[index].value
    }

    pub fn get_by_id(&self, id: u64) -> Option<i64> {
        self.index_of(id).map(|index| self.rows[index].value)
    }

    /// Stage a change so that the next adjust commits `value`.
    pub fn set(&mut self, index: usize, value: i64) {
        let row = &mut self.rows[index];
        row.delta = value.wrapping_sub(row.value);
    }

    pub fn apply_delta(&mut self, index: usize, delta: i64) {
        let row = &mut self.rows[index];
        row.delta = row.delta.wrapping_add(delta);
    }

    /// Overwrite the committed value directly, dropping any staged change.
    /// For initialization and in-lock handlers.
    pub fn init(&mut self, index: usize, value: i64) {
        let row = &mut self.rows[index];
        row.value = value;
        row.delta = 0;
    }

    /// Fold every staged delta into its value. Returns whether any value
    /// changed.
    pub fn adjust(&mut self) -> bool {
        let mut is_changed = false;
        for row in &mut self.rows {
            if row.delta != 0 {
                row.value = row.value.wrapping_add(row.delta);
                row.delta = 0;
                is_changed = true;
            }
        }
        self.is_changed = is_changed;
        is_changed
    }

    pub fn is_changed(&self) -> bool {
        self.is_changed
    }

    pub fn mark_changed(&mut self) {
        self.is_changed = true;
    }

    pub fn is_dynamic(&self) -> bool {
        self.get(Self::N_IS_DYNAMIC) != 0
    }

    pub fn tick_period(&self) -> u64 {
        self.get(Self::N_TICK_PERIOD).max(0) as u64
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn set_clock(&mut self, clock: u64) {
        self.clock = clock;
    }

    /// Count down one step. True when the countdown expires, which also
    /// restarts it.
    pub fn step_clock(&mut self) -> bool {
        if self.clock > 1 {
            self.clock -= 1;
            return false;
        }
        self.clock = self.tick_period();
        true
    }
}
