//! Query-service metrics.
//!
//! Counters and latency histograms recorded by the query lifecycle, with
//! optional space-labeled variants. Gating of the space-labeled emission on
//! configuration is done by the callers; this module only stores and serves
//! the numbers. Exporting to a metrics backend is out of scope.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Stable metric identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricId {
    NumSentences,
    OptimizerLatencyUs,
    QueryLatencyUs,
    NumSlowQueries,
    SlowQueryLatencyUs,
    NumQueryErrors,
    NumQueryErrorsLeaderChanges,
}

impl MetricId {
    pub fn name(&self) -> &'static str {
        match self {
            MetricId::NumSentences => "num_sentences",
            MetricId::OptimizerLatencyUs => "optimizer_latency_us",
            MetricId::QueryLatencyUs => "query_latency_us",
            MetricId::NumSlowQueries => "num_slow_queries",
            MetricId::SlowQueryLatencyUs => "slow_query_latency_us",
            MetricId::NumQueryErrors => "num_query_errors",
            MetricId::NumQueryErrorsLeaderChanges => "num_query_errors_leader_changes",
        }
    }

    pub fn is_histogram(&self) -> bool {
        matches!(
            self,
            MetricId::OptimizerLatencyUs | MetricId::QueryLatencyUs | MetricId::SlowQueryLatencyUs
        )
    }
}

/// Minimal latency histogram: count, sum and extrema.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        if self.count == 0 || value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Metric store shared across queries.
#[derive(Debug, Default)]
pub struct StatsManager {
    counters: RwLock<HashMap<MetricId, u64>>,
    histograms: RwLock<HashMap<MetricId, Histogram>>,
    space_counters: RwLock<HashMap<String, HashMap<MetricId, u64>>>,
    space_histograms: RwLock<HashMap<String, HashMap<MetricId, Histogram>>>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&self, id: MetricId) {
        self.add_value_with_amount(id, 1);
    }

    pub fn add_value_with_amount(&self, id: MetricId, amount: u64) {
        let mut counters = self.counters.write();
        *counters.entry(id).or_insert(0) += amount;
    }

    pub fn add_space_value(&self, space: &str, id: MetricId) {
        self.add_space_value_with_amount(space, id, 1);
    }

    pub fn add_space_value_with_amount(&self, space: &str, id: MetricId, amount: u64) {
        let mut spaces = self.space_counters.write();
        let counters = spaces.entry(space.to_string()).or_default();
        *counters.entry(id).or_insert(0) += amount;
    }

    pub fn record_histo(&self, id: MetricId, value: u64) {
        let mut histograms = self.histograms.write();
        histograms.entry(id).or_default().record(value);
    }

    pub fn record_space_histo(&self, space: &str, id: MetricId, value: u64) {
        let mut spaces = self.space_histograms.write();
        let histograms = spaces.entry(space.to_string()).or_default();
        histograms.entry(id).or_default().record(value);
    }

    pub fn get_value(&self, id: MetricId) -> u64 {
        self.counters.read().get(&id).copied().unwrap_or(0)
    }

    pub fn get_space_value(&self, space: &str, id: MetricId) -> u64 {
        self.space_counters
            .read()
            .get(space)
            .and_then(|counters| counters.get(&id).copied())
            .unwrap_or(0)
    }

    pub fn get_histo(&self, id: MetricId) -> Histogram {
        self.histograms.read().get(&id).copied().unwrap_or_default()
    }

    pub fn get_space_histo(&self, space: &str, id: MetricId) -> Histogram {
        self.space_histograms
            .read()
            .get(space)
            .and_then(|histograms| histograms.get(&id).copied())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates() {
        let stats = StatsManager::new();
        assert_eq!(stats.get_value(MetricId::NumSentences), 0);

        stats.add_value(MetricId::NumSentences);
        stats.add_value_with_amount(MetricId::NumSentences, 3);
        assert_eq!(stats.get_value(MetricId::NumSentences), 4);
    }

    #[test]
    fn test_space_counters_are_isolated() {
        let stats = StatsManager::new();
        stats.add_space_value("nba", MetricId::NumQueryErrors);
        stats.add_space_value("nba", MetricId::NumQueryErrors);
        stats.add_space_value("shop", MetricId::NumQueryErrors);

        assert_eq!(stats.get_space_value("nba", MetricId::NumQueryErrors), 2);
        assert_eq!(stats.get_space_value("shop", MetricId::NumQueryErrors), 1);
        assert_eq!(stats.get_value(MetricId::NumQueryErrors), 0);
    }

    #[test]
    fn test_histogram() {
        let stats = StatsManager::new();
        stats.record_histo(MetricId::QueryLatencyUs, 100);
        stats.record_histo(MetricId::QueryLatencyUs, 300);

        let histo = stats.get_histo(MetricId::QueryLatencyUs);
        assert_eq!(histo.count, 2);
        assert_eq!(histo.sum, 400);
        assert_eq!(histo.min, 100);
        assert_eq!(histo.max, 300);
        assert!((histo.mean() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(MetricId::NumSlowQueries.name(), "num_slow_queries");
        assert!(MetricId::SlowQueryLatencyUs.is_histogram());
        assert!(!MetricId::NumSentences.is_histogram());
    }
}
