//! Auto-refresh of the reports feed.

use super::client::{ReportsClient, UploadError};
use super::types::ReportsPage;
use crate::capture::RefreshConfig;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Shortest refresh period; shorter requests are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Periodic reports refresh that can be toggled on and off.
///
/// The first refresh happens one full period after enabling.
pub struct AutoRefresh {
    period: Duration,
    interval: Option<Interval>,
}

impl AutoRefresh {
    /// Creates a disabled refresh. Periods below [`MIN_PERIOD`] are clamped.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            interval: None,
        }
    }

    /// Creates a disabled refresh with the configured period.
    pub fn from_config(config: &RefreshConfig) -> Self {
        Self::new(Duration::from_secs(config.interval_secs))
    }

    /// Time between refreshes.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// True while refreshes are scheduled.
    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Schedules refreshes, restarting the period if already enabled.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        tracing::info!(period_secs = self.period.as_secs(), "Auto refresh enabled");
    }

    /// Cancels scheduled refreshes.
    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            tracing::info!("Auto refresh disabled");
        }
    }

    /// Flips the refresh on or off, returning the new state.
    pub fn toggle(&mut self) -> bool {
        if self.is_active() {
            self.stop();
        } else {
            self.start();
        }
        self.is_active()
    }

    /// Waits for the next refresh and fetches the reports.
    ///
    /// Returns `None` immediately while disabled.
    pub async fn next<C: ReportsClient>(
        &mut self,
        client: &C,
    ) -> Option<Result<ReportsPage, UploadError>> {
        let interval = self.interval.as_mut()?;
        interval.tick().await;
        Some(client.list_reports().await)
    }
}
