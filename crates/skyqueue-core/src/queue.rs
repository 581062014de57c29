//! Nightly queue: up to six targets, frozen while the night runs.

use crate::catalog::{CatalogState, Observation, ObservationId};
use serde::{Deserialize, Serialize};
use skyqueue_logic::constants::MAX_QUEUE_SIZE;
use std::fmt;

/// Why a queue mutation was refused. Refusals never change the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRejection {
    /// Not in the available catalog (unknown or already completed).
    NotAvailable,
    AlreadyQueued,
    Full,
    /// The night is running.
    Locked,
    NotQueued,
}

impl fmt::Display for QueueRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotAvailable => "target is not available",
            Self::AlreadyQueued => "target is already queued",
            Self::Full => "queue is full",
            Self::Locked => "queue is locked while the night runs",
            Self::NotQueued => "target is not in the queue",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NightlyQueue {
    entries: Vec<Observation>,
    locked: bool,
}

impl NightlyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a copy of an available target.
    pub fn try_add(
        &mut self,
        id: ObservationId,
        available: &CatalogState,
    ) -> Result<(), QueueRejection> {
        if self.locked {
            return Err(QueueRejection::Locked);
        }
        let obs = available.get(id).ok_or(QueueRejection::NotAvailable)?;
        if self.contains(id) {
            return Err(QueueRejection::AlreadyQueued);
        }
        if self.is_full() {
            return Err(QueueRejection::Full);
        }
        self.entries.push(obs.clone());
        Ok(())
    }

    pub fn try_remove(&mut self, id: ObservationId) -> Result<Observation, QueueRejection> {
        if self.locked {
            return Err(QueueRejection::Locked);
        }
        let index = self
            .entries
            .iter()
            .position(|o| o.id == id)
            .ok_or(QueueRejection::NotQueued)?;
        Ok(self.entries.remove(index))
    }

    pub fn try_clear(&mut self) -> Result<(), QueueRejection> {
        if self.locked {
            return Err(QueueRejection::Locked);
        }
        self.entries.clear();
        Ok(())
    }

    /// Empty and unlock regardless of state. Used at night boundaries and on abort.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.locked = false;
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn contains(&self, id: ObservationId) -> bool {
        self.entries.iter().any(|o| o.id == id)
    }

    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.entries.get(index)
    }

    pub fn ids(&self) -> Vec<ObservationId> {
        self.entries.iter().map(|o| o.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_QUEUE_SIZE
    }

    /// Sum of queued targets' simulated minutes.
    pub fn total_duration(&self) -> u32 {
        self.entries.iter().map(|o| o.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn available() -> CatalogState {
        CatalogState::from_catalog(&Catalog::builtin().unwrap())
    }

    #[test]
    fn test_add_is_idempotent() {
        let catalog = available();
        let mut q = NightlyQueue::new();
        assert_eq!(q.try_add(1, &catalog), Ok(()));
        assert_eq!(q.try_add(1, &catalog), Err(QueueRejection::AlreadyQueued));
        assert_eq!(q.ids(), vec![1]);
    }

    #[test]
    fn test_capacity() {
        let catalog = available();
        let mut q = NightlyQueue::new();
        for id in 1..=6 {
            assert!(q.try_add(id, &catalog).is_ok());
        }
        assert!(q.is_full());
        assert_eq!(q.try_add(7, &catalog), Err(QueueRejection::Full));
        assert_eq!(q.len(), 6);
    }

    #[test]
    fn test_unavailable_rejected() {
        let mut catalog = available();
        catalog.retire(3);
        let mut q = NightlyQueue::new();
        assert_eq!(q.try_add(3, &catalog), Err(QueueRejection::NotAvailable));
        assert_eq!(q.try_add(999, &catalog), Err(QueueRejection::NotAvailable));
        assert!(q.is_empty());
    }

    #[test]
    fn test_locked_queue_is_frozen() {
        let catalog = available();
        let mut q = NightlyQueue::new();
        q.try_add(1, &catalog).unwrap();
        q.try_add(2, &catalog).unwrap();
        q.lock();
        assert_eq!(q.try_add(3, &catalog), Err(QueueRejection::Locked));
        assert_eq!(q.try_remove(1).unwrap_err(), QueueRejection::Locked);
        assert_eq!(q.try_clear(), Err(QueueRejection::Locked));
        assert_eq!(q.ids(), vec![1, 2]);

        q.reset();
        assert!(!q.is_locked());
        assert!(q.is_empty());
    }

    #[test]
    fn test_remove_keeps_order() {
        let catalog = available();
        let mut q = NightlyQueue::new();
        for id in [4, 9, 2] {
            q.try_add(id, &catalog).unwrap();
        }
        assert_eq!(q.try_remove(9).unwrap().id, 9);
        assert_eq!(q.try_remove(9).unwrap_err(), QueueRejection::NotQueued);
        assert_eq!(q.ids(), vec![4, 2]);
    }
}
