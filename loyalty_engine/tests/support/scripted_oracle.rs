use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use loyalty_engine::{db_types::OrderNumber, helpers::Clock, AccrualOracle, OracleOutcome};

#[derive(Debug, Clone)]
pub struct OracleCall {
    pub number: String,
    pub at: DateTime<Utc>,
}

/// An oracle that replays queued outcomes per order number and answers `NotYetKnown` once a queue runs dry.
/// Every query is recorded along with the clock time it was made at.
#[derive(Debug, Clone)]
pub struct ScriptedOracle<C> {
    clock: C,
    script: Arc<Mutex<HashMap<String, VecDeque<OracleOutcome>>>>,
    calls: Arc<Mutex<Vec<OracleCall>>>,
}

impl<C: Clock> ScriptedOracle<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, script: Arc::default(), calls: Arc::default() }
    }

    pub fn push(&self, number: &OrderNumber, outcome: OracleOutcome) {
        let mut script = self.script.lock().unwrap();
        script.entry(number.as_str().to_string()).or_default().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl<C: Clock> AccrualOracle for ScriptedOracle<C> {
    fn query(&self, number: &OrderNumber) -> impl Future<Output = OracleOutcome> + Send {
        let key = number.as_str().to_string();
        self.calls.lock().unwrap().push(OracleCall { number: key.clone(), at: self.clock.now() });
        let outcome = self
            .script
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(OracleOutcome::NotYetKnown);
        std::future::ready(outcome)
    }
}

/// An oracle whose queries never complete.
#[derive(Debug, Clone, Default)]
pub struct HangingOracle {
    calls: Arc<Mutex<usize>>,
}

impl HangingOracle {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl AccrualOracle for HangingOracle {
    fn query(&self, _number: &OrderNumber) -> impl Future<Output = OracleOutcome> + Send {
        *self.calls.lock().unwrap() += 1;
        std::future::pending()
    }
}
