use log::*;
use loyalty_engine::{helpers::TokioClock, AccrualOracle, ReconciliationConfig, ReconciliationLoop, SqliteDatabase};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Starts the accrual worker, which keeps resolving pending orders until `shutdown` is cancelled.
///
/// The returned handle completes once the worker has stopped. Any storage write that was in progress when the token
/// fired is finished first.
pub fn start_accrual_worker<O>(
    db: SqliteDatabase,
    oracle: O,
    config: ReconciliationConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    O: AccrualOracle + 'static,
{
    tokio::spawn(async move {
        info!("🕰️ Accrual worker started");
        let reconciler = ReconciliationLoop::new(db, oracle, TokioClock, config);
        reconciler.run(shutdown).await;
        info!("🕰️ Accrual worker stopped");
    })
}
