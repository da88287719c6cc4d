//! Terminal progress for waits and batch runs.
//!
//! Everything here draws only when asked to; otherwise the helpers reduce to
//! plain sleeps and hidden bars.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Instant;

const TICK: Duration = Duration::from_millis(100);

/// Sleeps for `delay`, drawing a countdown bar labelled `reason` when `visible`.
pub async fn wait_with_progress(delay: Duration, reason: &str, visible: bool) {
    if delay.is_zero() {
        return;
    }
    if !visible {
        tokio::time::sleep(delay).await;
        return;
    }

    let total_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let bar = ProgressBar::new(total_ms);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {percent}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(reason.to_string());

    let started = Instant::now();
    let deadline = started + delay;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        bar.set_position(u64::try_from((now - started).as_millis()).unwrap_or(total_ms));
        tokio::time::sleep(TICK.min(deadline - now)).await;
    }
    bar.finish_and_clear();
}

/// Spinner for a batch run; hidden unless `visible`.
#[must_use]
pub fn batch_spinner(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(TICK);
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hidden_wait_sleeps_full_delay() {
        let start = Instant::now();
        wait_with_progress(Duration::from_secs(5), "waiting", false).await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_wait_sleeps_full_delay() {
        let start = Instant::now();
        wait_with_progress(Duration::from_millis(350), "waiting", true).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(350), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(450), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_wait_returns_immediately() {
        let start = Instant::now();
        wait_with_progress(Duration::ZERO, "waiting", true).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_hidden_spinner_is_hidden() {
        assert!(batch_spinner(false).is_hidden());
    }
}
