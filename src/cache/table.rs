//! Per-segment entry table and single-flight fill cells
//!
//! Each key maps to a cell that is `Filling` while one leader decodes and
//! `Filled` afterwards. Other callers that find a `Filling` cell block on it
//! and receive the leader's result. A failed cell is removed so the next
//! caller starts over.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::key::{CacheKey, EntryCustom, EntryKind};
use super::value::CachedValue;
use crate::error::{FieldCacheError, Result};

enum CellState {
    Filling,
    Filled(CachedValue),
    Failed(FieldCacheError),
}

pub(crate) struct FillCell {
    state: Mutex<CellState>,
    ready: Condvar,
    custom: EntryCustom,
}

impl FillCell {
    fn filling(custom: EntryCustom) -> Self {
        Self {
            state: Mutex::new(CellState::Filling),
            ready: Condvar::new(),
            custom,
        }
    }

    fn filled(value: CachedValue, custom: EntryCustom) -> Self {
        Self {
            state: Mutex::new(CellState::Filled(value)),
            ready: Condvar::new(),
            custom,
        }
    }

    /// Filled value, if the cell has one
    pub(crate) fn peek(&self) -> Option<CachedValue> {
        match &*self.state.lock() {
            CellState::Filled(value) => Some(value.clone()),
            _ => None,
        }
    }

    fn is_failed(&self) -> bool {
        matches!(*self.state.lock(), CellState::Failed(_))
    }

    /// Block until the leader publishes a result
    pub(crate) fn wait(&self) -> Result<CachedValue> {
        let mut state = self.state.lock();
        while matches!(*state, CellState::Filling) {
            self.ready.wait(&mut state);
        }
        match &*state {
            CellState::Filled(value) => Ok(value.clone()),
            CellState::Failed(err) => Err(err.clone()),
            CellState::Filling => Err(FieldCacheError::Internal(
                "fill cell woke while still filling".to_string(),
            )),
        }
    }

    fn publish(&self, state: CellState) {
        *self.state.lock() = state;
        self.ready.notify_all();
    }
}

/// Outcome of claiming a key
pub(crate) enum Claim {
    Hit(CachedValue),
    /// The caller must fill and then complete the guard
    Leader(FillGuard),
    /// Another caller is filling
    Waiter(Arc<FillCell>),
}

/// Entries cached for one segment
#[derive(Default)]
pub(crate) struct SegmentTable {
    entries: Mutex<HashMap<CacheKey, Arc<FillCell>>>,
}

impl SegmentTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, claiming it for filling when absent
    pub(crate) fn claim(self: &Arc<Self>, key: &CacheKey, custom: EntryCustom) -> Claim {
        let mut entries = self.entries.lock();
        if let Some(cell) = entries.get(key) {
            if let Some(value) = cell.peek() {
                return Claim::Hit(value);
            }
            if !cell.is_failed() {
                return Claim::Waiter(cell.clone());
            }
        }

        let cell = Arc::new(FillCell::filling(custom));
        entries.insert(key.clone(), cell.clone());
        Claim::Leader(FillGuard {
            table: self.clone(),
            key: key.clone(),
            cell,
            done: false,
        })
    }

    /// Store an already computed value unless the key is taken
    pub(crate) fn put_if_absent(&self, key: CacheKey, custom: EntryCustom, value: CachedValue) {
        self.entries
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(FillCell::filled(value, custom)));
    }

    fn remove_if_same(&self, key: &CacheKey, cell: &Arc<FillCell>) {
        let mut entries = self.entries.lock();
        if entries.get(key).map_or(false, |current| Arc::ptr_eq(current, cell)) {
            entries.remove(key);
        }
    }

    /// Snapshot of completed entries; in-flight fills are skipped
    pub(crate) fn filled_entries(&self) -> Vec<(CacheKey, EntryCustom, CachedValue)> {
        self.entries
            .lock()
            .iter()
            .filter_map(|(key, cell)| cell.peek().map(|value| (key.clone(), cell.custom, value)))
            .collect()
    }

    /// A kind already cached for `field` that cannot coexist with `kind`
    pub(crate) fn conflicting_kind(&self, field: &str, kind: EntryKind) -> Option<EntryKind> {
        self.entries
            .lock()
            .keys()
            .filter(|key| &*key.field == field)
            .map(|key| key.kind)
            .find(|existing| !existing.is_compatible_with(kind))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Leadership over one `Filling` cell.
///
/// Dropping the guard without completing it (the fill panicked) fails the
/// cell so waiters are released.
pub(crate) struct FillGuard {
    table: Arc<SegmentTable>,
    key: CacheKey,
    cell: Arc<FillCell>,
    done: bool,
}

impl FillGuard {
    pub(crate) fn complete(mut self, result: &Result<CachedValue>) {
        self.done = true;
        match result {
            Ok(value) => self.cell.publish(CellState::Filled(value.clone())),
            Err(err) => self.fail(err.clone()),
        }
    }

    fn fail(&self, err: FieldCacheError) {
        self.cell.publish(CellState::Failed(err));
        self.table.remove_if_same(&self.key, &self.cell);
    }
}

impl Drop for FillGuard {
    fn drop(&mut self) {
        if !self.done {
            self.fail(FieldCacheError::Internal(format!(
                "fill of '{}' as {} was abandoned",
                self.key.field, self.key.kind
            )));
        }
    }
}
