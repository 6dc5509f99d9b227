use std::collections::HashMap;

use cucumber::World;
use log::*;
use loyalty_engine::{
    traits::{LedgerError, OrderRegistryError},
    LedgerApi,
    OrderRegistryApi,
    ReconciliationConfig,
    ReconciliationLoop,
    SqliteDatabase,
};

use crate::support::{
    manual_clock::ManualClock,
    prepare_env::{prepare_test_env, random_db_path},
    scripted_oracle::ScriptedOracle,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub users: HashMap<String, i64>,
    pub last_registration: Option<Result<bool, OrderRegistryError>>,
    pub last_withdrawal: Option<Result<(), LedgerError>>,
}

#[derive(Debug)]
pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub registry: OrderRegistryApi<SqliteDatabase>,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub clock: ManualClock,
    pub oracle: ScriptedOracle<ManualClock>,
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("Loyalty system not initialised")
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("User '{login}' has not been created"))
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let clock = ManualClock::new();
        let oracle = ScriptedOracle::new(clock.clone());
        let registry = OrderRegistryApi::new(db.clone());
        let ledger = LedgerApi::new(db.clone());
        Self { db_path, db, registry, ledger, clock, oracle }
    }

    pub fn reconciler(&self) -> ReconciliationLoop<SqliteDatabase, ScriptedOracle<ManualClock>, ManualClock> {
        ReconciliationLoop::new(self.db.clone(), self.oracle.clone(), self.clock.clone(), ReconciliationConfig::default())
    }
}
