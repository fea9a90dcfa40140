//! Lock-free per-connector counters. The venue's I/O task is the only
//! writer; exporters read snapshots from other threads, so relaxed
//! ordering is sufficient throughout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use argus_core::prelude::{DataType, Venue};

#[derive(Debug, Default)]
pub struct LatencySummary {
    count: AtomicU64,
    sum_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl LatencySummary {
    pub fn observe(&self, nanos: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let sum_nanos = self.sum_nanos.load(Ordering::Relaxed);
        LatencySnapshot {
            count,
            mean_micros: if count == 0 { 0.0 } else { sum_nanos as f64 / count as f64 / 1_000.0 },
            max_micros: self.max_nanos.load(Ordering::Relaxed) as f64 / 1_000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencySnapshot {
    pub count: u64,
    pub mean_micros: f64,
    pub max_micros: f64,
}

#[derive(Debug)]
pub struct ConnectorMetrics {
    venue: Venue,
    received: [AtomicU64; DataType::COUNT],
    published: [AtomicU64; DataType::COUNT],
    parse_errors: AtomicU64,
    connected: AtomicBool,
    parse_latency: LatencySummary,
}

impl ConnectorMetrics {
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            received: Default::default(),
            published: Default::default(),
            parse_errors: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            parse_latency: LatencySummary::default(),
        }
    }

    pub fn venue(&self) -> Venue {
        self.venue
    }

    pub fn record_received(&self, data_type: DataType) {
        self.received[data_type.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self, data_type: DataType) {
        self.published[data_type.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_parse_latency(&self, nanos: u64) {
        self.parse_latency.observe(nanos);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn received(&self, data_type: DataType) -> u64 {
        self.received[data_type.index()].load(Ordering::Relaxed)
    }

    pub fn published(&self, data_type: DataType) -> u64 {
        self.published[data_type.index()].load(Ordering::Relaxed)
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counters: &[AtomicU64; DataType::COUNT]| {
            [
                counters[0].load(Ordering::Relaxed),
                counters[1].load(Ordering::Relaxed),
                counters[2].load(Ordering::Relaxed),
                counters[3].load(Ordering::Relaxed),
            ]
        };
        MetricsSnapshot {
            venue: self.venue,
            received: load(&self.received),
            published: load(&self.published),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            connected: self.connected.load(Ordering::Relaxed),
            parse_latency: self.parse_latency.snapshot(),
        }
    }
}

/// Point-in-time view for an exporter; the gateway never reads it back.
#[derive(Clone, Copy, Debug)]
pub struct MetricsSnapshot {
    pub venue: Venue,
    pub received: [u64; DataType::COUNT],
    pub published: [u64; DataType::COUNT],
    pub parse_errors: u64,
    pub connected: bool,
    pub parse_latency: LatencySnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = ConnectorMetrics::new(Venue::Binance);
        metrics.record_received(DataType::Trade);
        metrics.record_received(DataType::Trade);
        metrics.record_received(DataType::Unknown);
        metrics.record_published(DataType::Trade);
        metrics.record_parse_error();

        assert_eq!(metrics.received(DataType::Trade), 2);
        assert_eq!(metrics.received(DataType::Unknown), 1);
        assert_eq!(metrics.received(DataType::Ticker), 0);
        assert_eq!(metrics.published(DataType::Trade), 1);
        assert_eq!(metrics.parse_errors(), 1);
    }

    #[test]
    fn test_latency_summary() {
        let summary = LatencySummary::default();
        summary.observe(1_000);
        summary.observe(3_000);
        let snap = summary.snapshot();
        assert_eq!(snap.count, 2);
        assert_eq!(snap.mean_micros, 2.0);
        assert_eq!(snap.max_micros, 3.0);
    }

    #[test]
    fn test_connection_gauge() {
        let metrics = ConnectorMetrics::new(Venue::Okx);
        assert!(!metrics.is_connected());
        metrics.set_connected(true);
        assert!(metrics.snapshot().connected);
        metrics.set_connected(false);
        assert!(!metrics.snapshot().connected);
    }
}
