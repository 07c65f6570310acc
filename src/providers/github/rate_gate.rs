use std::time::Duration;

use log::debug;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// Fixed-interval pacing for annotation requests.
///
/// Each call to [`RateGate::wait`] completes at most once per interval. The
/// first call passes immediately; missed ticks are not accumulated, so there
/// is never a burst.
pub struct RateGate {
    ticker: Interval,
}

impl RateGate {
    pub fn new(period: Duration) -> Self {
        // tokio panics on a zero period
        let mut ticker = interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { ticker }
    }

    pub async fn wait(&mut self) {
        let started = Instant::now();
        self.ticker.tick().await;
        debug!("Rate gate released after {:?}", started.elapsed());
    }

    pub fn period(&self) -> Duration {
        self.ticker.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let mut gate = RateGate::new(Duration::from_secs(30));
        let started = Instant::now();
        gate.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_waits_are_spaced_by_period() {
        let period = Duration::from_millis(25);
        let mut gate = RateGate::new(period);
        let started = Instant::now();

        for _ in 0..3 {
            gate.wait().await;
        }

        assert!(started.elapsed() >= period * 2);
    }

    #[tokio::test]
    async fn test_no_burst_after_idle() {
        let period = Duration::from_millis(20);
        let mut gate = RateGate::new(period);
        gate.wait().await;

        tokio::time::sleep(period * 4).await;

        gate.wait().await;
        let after_idle = Instant::now();
        gate.wait().await;
        assert!(after_idle.elapsed() >= period / 2);
    }

    #[tokio::test]
    async fn test_zero_period_is_clamped() {
        let gate = RateGate::new(Duration::ZERO);
        assert_eq!(gate.period(), Duration::from_millis(1));
    }
}
