use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct TickMetricsSnapshot {
    pub(crate) tps: f32,
    pub(crate) mean_entities: f32,
    pub(crate) peak_entities: usize,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    entity_sum: u64,
    peak_entities: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            entity_sum: 0,
            peak_entities: 0,
        }
    }

    pub(crate) fn record_tick(&mut self, live_entities: usize) {
        self.ticks = self.ticks.saturating_add(1);
        self.entity_sum = self.entity_sum.saturating_add(live_entities as u64);
        self.peak_entities = self.peak_entities.max(live_entities);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<TickMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let mean_entities = if self.ticks == 0 {
            0.0
        } else {
            self.entity_sum as f32 / self.ticks as f32
        };

        let snapshot = TickMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            mean_entities,
            peak_entities: self.peak_entities,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.entity_sum = 0;
        self.peak_entities = 0;

        Some(snapshot)
    }
}
