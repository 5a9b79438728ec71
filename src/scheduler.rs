//! Daily ingestion scheduling.
//!
//! The trigger is a plain tokio task owned by the composition root, not
//! global state: it sleeps until the configured UTC wall-clock time, invokes
//! the coordinator, and repeats. The coordinator's own run lock serializes a
//! scheduled run against any manual out-of-band invocation.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::IngestionCoordinator;

/// Run the ingestion pass once a day at `hour:minute` UTC, forever.
pub async fn daily_ingestion_task(coordinator: Arc<IngestionCoordinator>, hour: u32, minute: u32) {
    log::info!("⏰ Scheduler started: daily ingestion at {:02}:{:02} UTC", hour, minute);

    loop {
        let wait = duration_until_next(Utc::now(), hour, minute);
        log::info!("Next ingestion in {}s", wait.as_secs());
        tokio::time::sleep(wait).await;

        log::info!("Starting daily data ingestion...");
        match coordinator.run_ingestion_pass().await {
            Ok(report) => log::info!(
                "✅ Daily ingestion completed successfully. Processed {} records.",
                report.records_processed
            ),
            Err(err) => log::error!("❌ Daily ingestion failed: {}", err),
        }
    }
}

/// Time until the next occurrence of `hour:minute` UTC, strictly in the
/// future (a trigger instant that is exactly now rolls to tomorrow).
fn duration_until_next(now: DateTime<Utc>, hour: u32, minute: u32) -> Duration {
    let fire_time = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0)
        .unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(fire_time);
    let candidate = DateTime::<Utc>::from_naive_utc_and_offset(today, Utc);

    let target = if candidate > now {
        candidate
    } else {
        candidate + TimeDelta::days(1)
    };

    (target - now).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        rfc3339.parse().unwrap()
    }

    #[test]
    fn fires_later_today_when_trigger_is_ahead() {
        let now = at("2024-06-01T01:30:00Z");
        let wait = duration_until_next(now, 2, 0);
        assert_eq!(wait, Duration::from_secs(30 * 60));
    }

    #[test]
    fn rolls_to_tomorrow_when_trigger_has_passed() {
        let now = at("2024-06-01T03:00:00Z");
        let wait = duration_until_next(now, 2, 0);
        assert_eq!(wait, Duration::from_secs(23 * 3600));
    }

    #[test]
    fn exact_trigger_instant_rolls_to_tomorrow() {
        let now = at("2024-06-01T02:00:00Z");
        let wait = duration_until_next(now, 2, 0);
        assert_eq!(wait, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn minute_component_is_honored() {
        let now = at("2024-06-01T02:10:00Z");
        let wait = duration_until_next(now, 2, 45);
        assert_eq!(wait, Duration::from_secs(35 * 60));
    }
}
