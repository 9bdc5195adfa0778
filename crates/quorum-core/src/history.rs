//! Query history ring buffer and derived usage statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use crate::model::ModelId;

/// Default number of history entries retained before eviction.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// One completed query, appended after blending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub category: String,
    pub model: ModelId,
    pub confidence: f64,
    pub response: String,
}

impl HistoryEntry {
    pub fn new(
        query: impl Into<String>,
        category: impl Into<String>,
        model: ModelId,
        confidence: f64,
        response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: query.into(),
            category: category.into(),
            model,
            confidence,
            response: response.into(),
        }
    }
}

/// Bounded, append-only query log.
///
/// A ring buffer rather than an unbounded list: a long-running gateway
/// records every query, so retention must be capped. Eviction drops the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Consistent point-in-time copy for statistics computation.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Rolling usage statistics, always recomputed from history.
///
/// Never stored independently: a pure function of the entries it is
/// computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_queries: usize,
    pub categories: HashMap<String, usize>,
    pub models: HashMap<String, usize>,
    pub average_confidence: f64,
}

impl UsageStats {
    pub fn compute<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a HistoryEntry>,
    {
        let mut stats = UsageStats::default();
        let mut total_confidence = 0.0;

        for entry in entries {
            stats.total_queries += 1;
            *stats.categories.entry(entry.category.clone()).or_insert(0) += 1;
            *stats.models.entry(entry.model.as_str().to_string()).or_insert(0) += 1;
            total_confidence += entry.confidence;
        }

        if stats.total_queries > 0 {
            stats.average_confidence = total_confidence / stats.total_queries as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, model: ModelId, confidence: f64) -> HistoryEntry {
        HistoryEntry::new("q", category, model, confidence, "r")
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut history = History::new(2);
        history.push(entry("a", ModelId::Claude3, 0.5));
        history.push(entry("b", ModelId::Claude3, 0.5));
        history.push(entry("c", ModelId::Claude3, 0.5));

        assert_eq!(history.len(), 2);
        let categories: Vec<_> = history.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["b", "c"]);
    }

    #[test]
    fn test_stats_counts_sum_to_total() {
        let mut history = History::default();
        history.push(entry("debugging", ModelId::Claude3, 1.0));
        history.push(entry("debugging", ModelId::Claude3, 0.5));
        history.push(entry("unit_testing", ModelId::OpenAiGpt4, 0.75));

        let stats = UsageStats::compute(history.iter());
        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.categories.values().sum::<usize>(), 3);
        assert_eq!(stats.models.values().sum::<usize>(), 3);
        assert_eq!(stats.categories["debugging"], 2);
        assert_eq!(stats.models["claude_3"], 2);
        assert!((stats.average_confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty_history() {
        let stats = UsageStats::compute(std::iter::empty());
        assert_eq!(stats.total_queries, 0);
        assert_eq!(stats.average_confidence, 0.0);
        assert!(stats.categories.is_empty());
    }
}
