//! Ordered stop-pair list backing the planning form.

use crate::error::StoreError;
use crate::model::StopPair;

/// Holds at least one stop pair at all times.
#[derive(Debug, Clone)]
pub struct StopPairStore {
    pairs: Vec<StopPair>,
}

impl Default for StopPairStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StopPairStore {
    pub fn new() -> Self {
        Self {
            pairs: vec![StopPair::empty(1)],
        }
    }

    /// Seed the store; an empty iterator still yields one empty pair.
    pub fn from_pairs<I, S, E>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, E)>,
        S: Into<String>,
        E: Into<String>,
    {
        let pairs: Vec<StopPair> = pairs
            .into_iter()
            .zip(1u64..)
            .map(|((start, end), id)| StopPair {
                id,
                start: start.into(),
                end: end.into(),
            })
            .collect();
        if pairs.is_empty() {
            return Self::new();
        }
        Self { pairs }
    }

    pub fn pairs(&self) -> &[StopPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Always false; kept alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn snapshot(&self) -> Vec<StopPair> {
        self.pairs.clone()
    }

    /// Append an empty pair after the last one.
    pub fn append(&mut self) -> &StopPair {
        let next_id = self.pairs.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        self.pairs.push(StopPair::empty(next_id));
        tracing::debug!(id = next_id, len = self.pairs.len(), "stop pair appended");
        &self.pairs[self.pairs.len() - 1]
    }

    /// Remove the last pair unless it is the only one. Returns `None` for the no-op.
    pub fn remove_last(&mut self) -> Option<StopPair> {
        if self.pairs.len() <= 1 {
            return None;
        }
        let removed = self.pairs.pop();
        tracing::debug!(len = self.pairs.len(), "stop pair removed");
        removed
    }

    pub fn set_start(&mut self, index: usize, value: impl Into<String>) -> Result<(), StoreError> {
        self.row_mut(index)?.start = value.into();
        Ok(())
    }

    pub fn set_end(&mut self, index: usize, value: impl Into<String>) -> Result<(), StoreError> {
        self.row_mut(index)?.end = value.into();
        Ok(())
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut StopPair, StoreError> {
        let len = self.pairs.len();
        self.pairs
            .get_mut(index)
            .ok_or(StoreError::NoSuchStop { index, len })
    }
}
