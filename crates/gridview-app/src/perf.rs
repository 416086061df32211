// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub const FILTER_BUDGET: Duration = Duration::from_millis(50);
pub const SORT_BUDGET: Duration = Duration::from_millis(50);
pub const SELECT_ALL_BUDGET: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSample {
    pub elapsed: Duration,
    pub budget: Duration,
}

impl PerfSample {
    pub fn over_budget(&self) -> bool {
        self.elapsed > self.budget
    }
}

/// Times named stages of one component and warns when a stage runs over its
/// budget. Keeps only the latest sample per label.
#[derive(Debug, Clone, Default)]
pub struct PerfMonitor {
    component: &'static str,
    samples: BTreeMap<&'static str, PerfSample>,
}

impl PerfMonitor {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            samples: BTreeMap::new(),
        }
    }

    pub fn measure<T>(
        &mut self,
        label: &'static str,
        budget: Duration,
        work: impl FnOnce() -> T,
    ) -> T {
        let started = Instant::now();
        let output = work();
        self.record(label, started.elapsed(), budget);
        output
    }

    pub fn record(&mut self, label: &'static str, elapsed: Duration, budget: Duration) {
        let sample = PerfSample { elapsed, budget };
        if sample.over_budget() {
            tracing::warn!(
                component = self.component,
                stage = label,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_millis() as u64,
                "stage exceeded its time budget"
            );
        } else {
            tracing::debug!(
                component = self.component,
                stage = label,
                elapsed_us = elapsed.as_micros() as u64,
                "stage timed"
            );
        }
        self.samples.insert(label, sample);
    }

    pub fn last(&self, label: &str) -> Option<PerfSample> {
        self.samples.get(label).copied()
    }

    pub fn over_budget_labels(&self) -> Vec<&'static str> {
        self.samples
            .iter()
            .filter(|(_, sample)| sample.over_budget())
            .map(|(label, _)| *label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::PerfMonitor;
    use std::time::Duration;

    #[test]
    fn measure_returns_work_output_and_records_sample() {
        let mut monitor = PerfMonitor::new("grid");
        let value = monitor.measure("filter", Duration::from_secs(60), || 21 * 2);
        assert_eq!(value, 42);
        let sample = monitor.last("filter").expect("sample recorded");
        assert!(!sample.over_budget());
        assert!(monitor.over_budget_labels().is_empty());
    }

    #[test]
    fn record_flags_stages_over_budget() {
        let mut monitor = PerfMonitor::new("grid");
        monitor.record("sort", Duration::from_millis(80), Duration::from_millis(50));
        monitor.record("filter", Duration::from_millis(10), Duration::from_millis(50));
        assert_eq!(monitor.over_budget_labels(), vec!["sort"]);

        monitor.record("sort", Duration::from_millis(5), Duration::from_millis(50));
        assert!(monitor.over_budget_labels().is_empty());
    }
}
