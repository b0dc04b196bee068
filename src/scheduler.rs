//! Fixed-interval scheduling of pipeline passes.
//!
//! The first pass starts immediately. Each following pass starts one `period`
//! after the previous pass finished, so passes never overlap and a slow pass
//! simply pushes the next one back instead of queueing extra runs.

use chrono::Local;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

/// Run `job` now and then every `period` until `shutdown` resolves.
///
/// Shutdown is observed between passes; a running pass is always allowed to
/// finish. Returns the number of passes started.
pub async fn run_every<J, Fut, S>(period: Duration, shutdown: S, mut job: J) -> usize
where
    J: FnMut() -> Fut,
    Fut: Future,
    S: Future<Output = ()>,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut passes = 0usize;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(passes, "Shutdown requested; scheduler stopping");
                break;
            }
            _ = ticker.tick() => {
                passes += 1;
                job().await;
                ticker.reset();
                let next = chrono::Duration::from_std(period)
                    .ok()
                    .and_then(|delta| Local::now().checked_add_signed(delta));
                match next {
                    Some(next) => {
                        info!(next_run = %next.format("%Y-%m-%d %H:%M:%S"), "Next pass scheduled")
                    }
                    None => info!(period_secs = period.as_secs(), "Next pass scheduled"),
                }
            }
        }
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_runs_immediately() {
        let passes = run_every(Duration::from_secs(600), time::sleep(Duration::from_secs(1)), || async {})
            .await;
        assert_eq!(passes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_beyond_calendar_range_does_not_panic() {
        let period = Duration::from_secs(200_000_000_000 * 60);
        let passes = run_every(period, time::sleep(Duration::from_secs(1)), || async {}).await;
        assert_eq!(passes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_are_spaced_from_the_end_of_the_previous_pass() {
        let origin = Instant::now();
        let starts: Arc<Mutex<Vec<Duration>>> = Arc::default();

        let job = {
            let starts = Arc::clone(&starts);
            move || {
                let starts = Arc::clone(&starts);
                async move {
                    let n = {
                        let mut starts = starts.lock().unwrap();
                        starts.push(origin.elapsed());
                        starts.len()
                    };
                    // The first pass overruns the 60s period by a wide margin.
                    if n == 1 {
                        time::sleep(Duration::from_secs(150)).await;
                    }
                }
            }
        };

        let passes = run_every(Duration::from_secs(60), time::sleep(Duration::from_secs(250)), job).await;

        let starts = starts.lock().unwrap();
        assert_eq!(passes, 2);
        assert_eq!(starts.len(), 2);
        assert!(starts[0] < Duration::from_secs(1));
        assert!(starts[1] >= Duration::from_secs(210) && starts[1] < Duration::from_secs(211));
    }
}
