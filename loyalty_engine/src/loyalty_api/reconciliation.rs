//! # Reconciliation loop
//!
//! The background task that resolves `Pending` and `InProgress` orders against the external accrual oracle.
//!
//! The loop is single-flight: cycles run strictly one after the other on one task, and when a cycle overruns the
//! polling interval the next one starts straight away. Every wait (the idle wait between cycles, rate-limit pauses and
//! in-flight oracle queries) is raced against the shutdown token. Storage writes are never raced, so an order is
//! either fully updated or left untouched when the loop is cancelled.
use std::{fmt::Display, time::Duration};

use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    db_types::{Order, OrderAccrualUpdate, OrderStatusType},
    helpers::Clock,
    traits::{AccrualOracle, OracleOutcome, OrderManagement},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_BATCH_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationConfig {
    /// The time between the start of one cycle and the start of the next.
    pub interval: Duration,
    /// The maximum number of orders fetched per cycle.
    pub batch_size: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, batch_size: DEFAULT_BATCH_SIZE }
    }
}

/// A summary of what one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Orders in the fetched batch.
    pub fetched: usize,
    /// Oracle queries issued.
    pub queried: usize,
    /// Orders whose status or accrual was written.
    pub updated: usize,
    /// Orders the oracle had nothing new on (unknown order, unknown status, or no change).
    pub unchanged: usize,
    /// Orders left for the next cycle because of a transient oracle or storage failure.
    pub skipped: usize,
    /// Rate-limit pauses taken.
    pub rate_limited: usize,
    /// The cycle was cut short by the shutdown token.
    pub cancelled: bool,
}

impl Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fetched: {}, queried: {}, updated: {}, unchanged: {}, skipped: {}, rate limited: {}{}",
            self.fetched,
            self.queried,
            self.updated,
            self.unchanged,
            self.skipped,
            self.rate_limited,
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

enum Step {
    Continue,
    Stop,
}

pub struct ReconciliationLoop<B, O, C> {
    db: B,
    oracle: O,
    clock: C,
    config: ReconciliationConfig,
}

impl<B, O, C> ReconciliationLoop<B, O, C>
where
    B: OrderManagement,
    O: AccrualOracle,
    C: Clock,
{
    pub fn new(db: B, oracle: O, clock: C, config: ReconciliationConfig) -> Self {
        Self { db, oracle, clock, config }
    }

    /// Runs cycles until `shutdown` is cancelled.
    ///
    /// Per-order and per-cycle failures are logged and never end the loop.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "🔄️ Reconciliation loop started. Polling every {:?}, {} orders per cycle",
            self.config.interval, self.config.batch_size
        );
        while !shutdown.is_cancelled() {
            let started = self.clock.now();
            let report = self.run_cycle(&shutdown).await;
            if report.cancelled {
                break;
            }
            let elapsed = (self.clock.now() - started).to_std().unwrap_or_default();
            let wait = self.config.interval.saturating_sub(elapsed);
            if wait.is_zero() {
                debug!("🔄️ Cycle took {elapsed:?}, longer than the polling interval. Starting the next one now");
            }
            if let Step::Stop = self.pause(wait, &shutdown).await {
                break;
            }
        }
        info!("🔄️ Reconciliation loop stopped");
    }

    /// Runs a single reconciliation cycle over the oldest unresolved orders.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        let batch = match self.db.fetch_unresolved_orders(self.config.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                error!("🔄️ Could not fetch unresolved orders. Will retry next cycle. {e}");
                return report;
            },
        };
        report.fetched = batch.len();
        for order in &batch {
            if shutdown.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => {
                    report.cancelled = true;
                    break;
                },
                outcome = self.oracle.query(&order.number) => outcome,
            };
            report.queried += 1;
            if let Step::Stop = self.apply_outcome(order, outcome, &mut report, shutdown).await {
                report.cancelled = true;
                break;
            }
        }
        if report.fetched > 0 || report.cancelled {
            info!("🔄️ Reconciliation cycle complete. {report}");
        } else {
            trace!("🔄️ Reconciliation cycle complete. Nothing to do");
        }
        report
    }

    async fn apply_outcome(
        &self,
        order: &Order,
        outcome: OracleOutcome,
        report: &mut CycleReport,
        shutdown: &CancellationToken,
    ) -> Step {
        match outcome {
            OracleOutcome::Scored { status, accrual } => {
                let Some(new_status) = status.local_status() else {
                    debug!("🔄️ Order {} has unrecognised accrual status {status:?}. Ignoring it", order.number);
                    report.unchanged += 1;
                    return Step::Continue;
                };
                let mut update = OrderAccrualUpdate::new(new_status);
                // Only a final score carries a reward
                if let (OrderStatusType::Scored, Some(amount)) = (new_status, accrual) {
                    update = update.with_accrual(amount);
                }
                self.write_update(order, update, report).await;
                Step::Continue
            },
            OracleOutcome::NotYetKnown => {
                trace!("🔄️ Order {} is not known to the accrual system yet", order.number);
                report.unchanged += 1;
                Step::Continue
            },
            OracleOutcome::TransientFailure(reason) => {
                warn!("🔄️ Could not query accrual for order {}. Skipping it this cycle. {reason}", order.number);
                report.skipped += 1;
                Step::Continue
            },
            OracleOutcome::RateLimited { retry_after } => {
                warn!(
                    "🔄️ Accrual system rate limit hit on order {}. Pausing the batch for {retry_after:?}",
                    order.number
                );
                report.rate_limited += 1;
                report.skipped += 1;
                self.pause(retry_after, shutdown).await
            },
        }
    }

    async fn write_update(&self, order: &Order, update: OrderAccrualUpdate, report: &mut CycleReport) {
        if update.is_noop_for(order) {
            trace!("🔄️ Order {} is still {}", order.number, order.status);
            report.unchanged += 1;
            return;
        }
        match self.db.update_order_accrual(&order.number, update).await {
            Ok(Some(updated)) => {
                debug!("🔄️ Order {} moved from {} to {}", order.number, order.status, updated.status);
                report.updated += 1;
            },
            Ok(None) => {
                debug!("🔄️ Order {} was resolved elsewhere. Nothing written", order.number);
                report.unchanged += 1;
            },
            Err(e) => {
                error!("🔄️ Could not store the accrual update for order {}. Will retry next cycle. {e}", order.number);
                report.skipped += 1;
            },
        }
    }

    /// Waits for `duration` on the clock, returning early with `Step::Stop` if `shutdown` fires first.
    async fn pause(&self, duration: Duration, shutdown: &CancellationToken) -> Step {
        if duration.is_zero() {
            return if shutdown.is_cancelled() { Step::Stop } else { Step::Continue };
        }
        tokio::select! {
            _ = shutdown.cancelled() => Step::Stop,
            _ = self.clock.sleep(duration) => Step::Continue,
        }
    }
}
