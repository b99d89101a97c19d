//! Step pacing for the simulation driver

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Default pause between two steps
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pause between the end of one step and the start of the next
    pub step_delay: Duration,
    pub mode: SchedulerMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            mode: SchedulerMode::FixedDelay,
        }
    }
}

/// Scheduling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerMode {
    /// Sleep the full delay after each step
    FixedDelay,
    /// Never sleep (tests, benchmarks, JSON output)
    BestEffort,
}

/// Paces steps and records how long each one took
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    last_tick: Option<Instant>,
    tick_count: u64,
    total_execution_time: Duration,
    min_execution_time: Option<Duration>,
    max_execution_time: Option<Duration>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            last_tick: None,
            tick_count: 0,
            total_execution_time: Duration::ZERO,
            min_execution_time: None,
            max_execution_time: None,
        }
    }

    /// Fixed-delay scheduler
    pub fn with_delay(step_delay: Duration) -> Self {
        Self::new(SchedulerConfig {
            step_delay,
            mode: SchedulerMode::FixedDelay,
        })
    }

    /// Scheduler that never waits
    pub fn immediate() -> Self {
        Self::new(SchedulerConfig {
            step_delay: Duration::ZERO,
            mode: SchedulerMode::BestEffort,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Suspend until the next step may start
    ///
    /// The first call never waits. Later calls wait out whatever remains of
    /// the delay since the previous tick.
    pub fn wait_for_next_tick(&mut self) -> TickInfo {
        let now = Instant::now();

        if self.config.mode == SchedulerMode::FixedDelay {
            if let Some(last) = self.last_tick {
                let elapsed = now.duration_since(last);
                if elapsed < self.config.step_delay {
                    std::thread::sleep(self.config.step_delay - elapsed);
                }
            }
        }

        let waited = now.elapsed();
        self.last_tick = Some(Instant::now());
        self.tick_count += 1;

        TickInfo {
            tick_number: self.tick_count,
            waited,
        }
    }

    /// Mark the end of a step so the delay is measured from here
    pub fn mark_step_end(&mut self) {
        self.last_tick = Some(Instant::now());
    }

    /// Record how long a step's transform and hand-off took
    pub fn record_execution_time(&mut self, duration: Duration) {
        self.total_execution_time += duration;

        if self.min_execution_time.is_none_or(|min| duration < min) {
            self.min_execution_time = Some(duration);
        }

        if self.max_execution_time.is_none_or(|max| duration > max) {
            self.max_execution_time = Some(duration);
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        let avg_execution_time = if self.tick_count > 0 {
            self.total_execution_time / self.tick_count as u32
        } else {
            Duration::ZERO
        };

        SchedulerStats {
            tick_count: self.tick_count,
            step_delay: self.config.step_delay,
            avg_execution_time,
            min_execution_time: self.min_execution_time.unwrap_or(Duration::ZERO),
            max_execution_time: self.max_execution_time.unwrap_or(Duration::ZERO),
        }
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
        self.tick_count = 0;
        self.total_execution_time = Duration::ZERO;
        self.min_execution_time = None;
        self.max_execution_time = None;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Information about one tick
#[derive(Debug, Clone)]
pub struct TickInfo {
    pub tick_number: u64,
    /// Time spent waiting for this tick
    pub waited: Duration,
}

/// Scheduler statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub tick_count: u64,
    pub step_delay: Duration,
    pub avg_execution_time: Duration,
    pub min_execution_time: Duration,
    pub max_execution_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_creation() {
        let scheduler = Scheduler::default();
        assert_eq!(scheduler.tick_count(), 0);
        assert_eq!(scheduler.config().step_delay, DEFAULT_STEP_DELAY);
    }

    #[test]
    fn test_first_tick_does_not_wait() {
        let mut scheduler = Scheduler::with_delay(Duration::from_secs(5));
        let tick = scheduler.wait_for_next_tick();
        assert_eq!(tick.tick_number, 1);
        assert!(tick.waited < Duration::from_secs(1));
    }

    #[test]
    fn test_fixed_delay_waits() {
        let mut scheduler = Scheduler::with_delay(Duration::from_millis(20));
        let start = Instant::now();
        scheduler.wait_for_next_tick();
        scheduler.wait_for_next_tick();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(scheduler.tick_count(), 2);
    }

    #[test]
    fn test_best_effort_mode() {
        let mut scheduler = Scheduler::new(SchedulerConfig {
            step_delay: Duration::from_secs(1),
            mode: SchedulerMode::BestEffort,
        });

        let start = Instant::now();
        for _ in 0..10 {
            scheduler.wait_for_next_tick();
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_execution_time_recording() {
        let mut scheduler = Scheduler::immediate();

        scheduler.record_execution_time(Duration::from_millis(5));
        scheduler.record_execution_time(Duration::from_millis(10));
        scheduler.record_execution_time(Duration::from_millis(3));

        let stats = scheduler.stats();
        assert_eq!(stats.min_execution_time, Duration::from_millis(3));
        assert_eq!(stats.max_execution_time, Duration::from_millis(10));
    }

    #[test]
    fn test_scheduler_reset() {
        let mut scheduler = Scheduler::immediate();
        scheduler.wait_for_next_tick();
        assert_eq!(scheduler.tick_count(), 1);

        scheduler.reset();
        assert_eq!(scheduler.tick_count(), 0);
    }
}
