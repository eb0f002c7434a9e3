//! Mock telemetry: periodic stats samples and a fake uptime query.

use std::time::{Duration, Instant};

use rand::Rng;
use rand::rngs::ThreadRng;
use shared::{SystemStats, Temperature, Uptime};

pub trait StatsSource {
    fn sample(&mut self) -> SystemStats;
}

pub trait UptimeSource {
    fn uptime(&mut self) -> Uptime;
}

/// Uniform random telemetry. Each sample is independent of the last.
pub struct MockStats<R = ThreadRng> {
    rng: R,
}

impl MockStats {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for MockStats {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MockStats<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> StatsSource for MockStats<R> {
    fn sample(&mut self) -> SystemStats {
        SystemStats {
            cpu: self.rng.gen_range(0..100),
            temp: Temperature::from_tenths(self.rng.gen_range(400..600)),
            storage: self.rng.gen_range(0..100),
        }
    }
}

/// Stand-in for a real uptime query: 0–47 hours, 0–59 minutes, unrelated to
/// how long the process has been running.
pub struct MockUptime<R = ThreadRng> {
    rng: R,
}

impl MockUptime {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for MockUptime {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MockUptime<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> UptimeSource for MockUptime<R> {
    fn uptime(&mut self) -> Uptime {
        Uptime {
            hours: self.rng.gen_range(0..48),
            minutes: self.rng.gen_range(0..60),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Sampler
// ═══════════════════════════════════════════════════════════════════════════════

pub struct StatsSampler {
    source: Box<dyn StatsSource>,
    interval: Duration,
    next_due: Option<Instant>,
    current: SystemStats,
}

impl StatsSampler {
    pub fn new(source: impl StatsSource + 'static, interval_ms: u32) -> Self {
        Self {
            source: Box::new(source),
            interval: Duration::from_millis(u64::from(interval_ms)),
            next_due: None,
            current: SystemStats::default(),
        }
    }

    /// Takes a sample right away and starts the periodic schedule.
    pub fn activate(&mut self, now: Instant) -> SystemStats {
        self.current = self.source.sample();
        self.next_due = Some(now + self.interval);
        log::debug!("stats sampler active every {:?}", self.interval);
        self.current
    }

    /// Cancels the pending sample. `poll` yields nothing until reactivated.
    pub fn deactivate(&mut self) {
        if self.next_due.take().is_some() {
            log::debug!("stats sampler stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the period; when active, the next sample is one new period
    /// from `now`.
    pub fn set_interval(&mut self, interval_ms: u32, now: Instant) {
        self.interval = Duration::from_millis(u64::from(interval_ms));
        if self.next_due.is_some() {
            self.next_due = Some(now + self.interval);
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<SystemStats> {
        let due = self.next_due?;
        if now < due {
            return None;
        }
        self.current = self.source.sample();
        // A stalled loop gets one sample, not a burst of catch-up samples.
        self.next_due = Some(now + self.interval);
        Some(self.current)
    }

    pub fn current(&self) -> SystemStats {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    struct Counter(u8);

    impl StatsSource for Counter {
        fn sample(&mut self) -> SystemStats {
            self.0 += 1;
            SystemStats {
                cpu: self.0,
                ..SystemStats::default()
            }
        }
    }

    #[test]
    fn mock_samples_stay_in_range() {
        let mut src = MockStats::with_rng(StdRng::seed_from_u64(7));
        for _ in 0..5000 {
            let s = src.sample();
            assert!(s.cpu < 100);
            assert!(s.storage < 100);
            let t = s.temp.celsius();
            assert!((40.0..60.0).contains(&t), "temp {t}");
            let text = s.temp.to_string();
            let (_, frac) = text.split_once('.').unwrap();
            assert_eq!(frac.len(), 1);
        }
    }

    #[test]
    fn mock_uptime_stays_in_range() {
        let mut src = MockUptime::with_rng(StdRng::seed_from_u64(3));
        for _ in 0..2000 {
            let u = src.uptime();
            assert!(u.hours < 48);
            assert!(u.minutes < 60);
        }
    }

    #[test]
    fn activation_samples_immediately_then_on_interval() {
        let t0 = Instant::now();
        let mut sampler = StatsSampler::new(Counter(0), 5000);

        assert_eq!(sampler.activate(t0).cpu, 1);
        assert_eq!(sampler.poll(t0 + Duration::from_millis(4999)), None);
        assert_eq!(sampler.poll(t0 + Duration::from_millis(5000)).map(|s| s.cpu), Some(2));
        assert_eq!(sampler.poll(t0 + Duration::from_millis(9000)), None);
        assert_eq!(sampler.poll(t0 + Duration::from_millis(10_000)).map(|s| s.cpu), Some(3));
        assert_eq!(sampler.current().cpu, 3);
    }

    #[test]
    fn deactivation_cancels_pending_sample() {
        let t0 = Instant::now();
        let mut sampler = StatsSampler::new(Counter(0), 1000);
        sampler.activate(t0);
        sampler.deactivate();

        assert!(!sampler.is_active());
        assert_eq!(sampler.next_due(), None);
        assert_eq!(sampler.poll(t0 + Duration::from_secs(60)), None);
    }

    #[test]
    fn interval_change_reschedules_from_now() {
        let t0 = Instant::now();
        let mut sampler = StatsSampler::new(Counter(0), 5000);
        sampler.activate(t0);

        let t1 = t0 + Duration::from_millis(2000);
        sampler.set_interval(1000, t1);
        assert_eq!(sampler.next_due(), Some(t1 + Duration::from_millis(1000)));
        assert!(sampler.poll(t1 + Duration::from_millis(1000)).is_some());
    }

    #[test]
    fn interval_change_while_inactive_does_not_activate() {
        let mut sampler = StatsSampler::new(Counter(0), 5000);
        sampler.set_interval(2000, Instant::now());
        assert!(!sampler.is_active());
        assert_eq!(sampler.interval(), Duration::from_millis(2000));
    }
}
