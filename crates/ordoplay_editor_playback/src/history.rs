// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of timeline edits.
//!
//! Every committed edit stores a binary snapshot of the timeline before and
//! after it ran. Undo restores the `before` snapshot, redo the `after` one.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default undo history depth
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Unique edit ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditId(u64);

impl EditId {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Serialized model state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Encoded state
    pub data: Vec<u8>,
    /// Timestamp when snapshot was taken
    pub timestamp: u64,
}

impl StateSnapshot {
    /// Encode a value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(value)?,
            timestamp: now_secs(),
        })
    }

    /// Decode the stored value
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One undoable edit
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Unique edit ID
    pub id: EditId,
    /// Human-readable description
    pub description: String,
    /// State before the edit
    pub before: StateSnapshot,
    /// State after the edit
    pub after: StateSnapshot,
}

impl HistoryEntry {
    /// Memory held by both snapshots
    pub fn memory_size(&self) -> usize {
        self.before.size() + self.after.size()
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Total memory used by snapshots (bytes)
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo stacks with a bounded depth
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    next_id: u64,
    max_depth: usize,
    memory_used: usize,
}

impl History {
    /// Create with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth: max_depth.max(1),
            memory_used: 0,
        }
    }

    /// Record a committed edit. Clears the redo stack.
    pub fn record(&mut self, description: impl Into<String>, before: StateSnapshot, after: StateSnapshot) -> EditId {
        let id = EditId(self.next_id);
        self.next_id += 1;

        self.redo_stack.clear();
        let entry = HistoryEntry {
            id,
            description: description.into(),
            before,
            after,
        };
        self.memory_used += entry.memory_size();
        self.undo_stack.push_back(entry);

        while self.undo_stack.len() > self.max_depth {
            if let Some(old) = self.undo_stack.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(old.memory_size());
            }
        }
        id
    }

    /// Pop the last edit onto the redo stack and return it
    pub fn undo(&mut self) -> Result<&HistoryEntry> {
        let entry = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.memory_used = self.memory_used.saturating_sub(entry.memory_size());
        self.redo_stack.push_back(entry);
        self.redo_stack.back().ok_or(HistoryError::NothingToRedo)
    }

    /// Pop the last undone edit back onto the undo stack and return it
    pub fn redo(&mut self) -> Result<&HistoryEntry> {
        let entry = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        self.memory_used += entry.memory_size();
        self.undo_stack.push_back(entry);
        self.undo_stack.back().ok_or(HistoryError::NothingToUndo)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_used: self.memory_used,
            max_depth: self.max_depth,
        }
    }

    /// Description of the next undo
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Description of the next redo
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(value: u32) -> StateSnapshot {
        StateSnapshot::from_value(&value).unwrap()
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new();
        history.record("one", snap(0), snap(1));
        history.record("two", snap(1), snap(2));
        assert_eq!(history.undo_description(), Some("two"));

        let undone: u32 = history.undo().unwrap().before.to_value().unwrap();
        assert_eq!(undone, 1);
        assert!(history.can_redo());

        let redone: u32 = history.redo().unwrap().after.to_value().unwrap();
        assert_eq!(redone, 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record("one", snap(0), snap(1));
        history.undo().unwrap();
        history.record("other", snap(0), snap(5));
        assert!(!history.can_redo());
        assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::with_max_depth(2);
        for i in 0..5 {
            history.record(format!("edit {i}"), snap(i), snap(i + 1));
        }
        let stats = history.stats();
        assert_eq!(stats.undo_count, 2);
        assert_eq!(stats.memory_used, 4 * snap(0).size());
    }
}
