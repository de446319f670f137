//! @acp:module "Sampling History"
//! @acp:summary "Bounded FIFO of recent sampling events, owned by the caller"
//! @acp:domain sampler
//! @acp:layer model

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingRecord {
    /// What was sampled, e.g. `"{element_id}.{variable}"` or a design category
    pub key: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

/// @acp:summary "Recent choices per key, oldest evicted first"
///
/// Not synchronized; share one history per request stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingHistory {
    capacity: usize,
    records: VecDeque<SamplingRecord>,
}

impl Default for SamplingHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SamplingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(SamplingRecord {
            key: key.into(),
            value: value.into(),
            timestamp: Utc::now(),
        });
    }

    /// Last `n` values recorded under `key`, newest first
    pub fn recent(&self, key: &str, n: usize) -> Vec<&str> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.key == key)
            .take(n)
            .map(|r| r.value.as_str())
            .collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &SamplingRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction() {
        let mut history = SamplingHistory::new(3);
        for value in ["a", "b", "c", "d"] {
            history.record("k", value);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent("k", 10), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_recent_is_per_key() {
        let mut history = SamplingHistory::default();
        history.record("colors", "warm");
        history.record("borders", "round");
        history.record("colors", "pastel");
        assert_eq!(history.recent("colors", 1), vec!["pastel"]);
        assert_eq!(history.recent("borders", 2), vec!["round"]);
        assert!(history.recent("decorations", 2).is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = SamplingHistory::new(0);
        history.record("k", "v");
        assert!(history.is_empty());
    }
}
