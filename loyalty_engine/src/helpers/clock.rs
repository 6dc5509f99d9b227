use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};

/// A source of time for background tasks.
///
/// Long-running loops take their notion of "now" and their idle waits from a `Clock`, so that tests can substitute a
/// clock that records requested sleeps instead of actually waiting.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// The wall clock, with sleeps delegated to the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
