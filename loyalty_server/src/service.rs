//! The programmatic surface of the loyalty service.
//!
//! `LoyaltyService` bundles the engine APIs over one SQLite store and exposes them in the shape that a transport
//! layer needs: amounts as decimals, statuses as the client-facing labels.
use log::*;
use loyalty_engine::{
    db_types::{NewUser, OrderNumber, Points, UserAccount},
    ledger_objects::{BalanceView, WithdrawalView},
    order_objects::OrderView,
    traits::{AccountApiError, LedgerError, OrderRegistryError},
    AccountApi,
    AccrualOracle,
    LedgerApi,
    OrderRegistryApi,
    ReconciliationConfig,
    SqliteDatabase,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::accrual_worker::start_accrual_worker;

#[derive(Debug)]
pub struct LoyaltyService {
    db: SqliteDatabase,
    registry: OrderRegistryApi<SqliteDatabase>,
    ledger: LedgerApi<SqliteDatabase>,
    accounts: AccountApi<SqliteDatabase>,
}

impl LoyaltyService {
    pub fn new(db: SqliteDatabase) -> Self {
        let registry = OrderRegistryApi::new(db.clone());
        let ledger = LedgerApi::new(db.clone());
        let accounts = AccountApi::new(db.clone());
        Self { db, registry, ledger, accounts }
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.db
    }

    pub async fn create_user(&self, login: &str, password_hash: Vec<u8>) -> Result<UserAccount, AccountApiError> {
        self.accounts.create_user(NewUser::new(login, password_hash)).await
    }

    pub async fn user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        self.accounts.account_by_login(login).await
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        self.accounts.account_by_id(user_id).await
    }

    /// Registers an order number for the user. Returns `true` if the user had already registered it.
    pub async fn register(&self, user_id: i64, number: &OrderNumber) -> Result<bool, OrderRegistryError> {
        self.registry.register_order(user_id, number).await.map(|r| r.already_exists)
    }

    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<OrderView>, OrderRegistryError> {
        let orders = self.registry.orders_for_user(user_id).await?;
        Ok(orders.into_iter().map(OrderView::from).collect())
    }

    pub async fn balance(&self, user_id: i64) -> Result<BalanceView, LedgerError> {
        self.ledger.balance(user_id).await.map(BalanceView::from)
    }

    pub async fn withdraw(&self, user_id: i64, reference: OrderNumber, amount: Points) -> Result<(), LedgerError> {
        self.ledger.withdraw(user_id, reference, amount).await.map(|_| ())
    }

    pub async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<WithdrawalView>, LedgerError> {
        let withdrawals = self.ledger.withdrawals_for_user(user_id).await?;
        Ok(withdrawals.into_iter().map(WithdrawalView::from).collect())
    }

    /// Starts background reconciliation against `oracle`. It runs until `shutdown` is cancelled.
    pub fn start_reconciliation<O>(
        &self,
        oracle: O,
        config: ReconciliationConfig,
        shutdown: CancellationToken,
    ) -> JoinHandle<()>
    where
        O: AccrualOracle + 'static,
    {
        debug!("🚀️ Starting reconciliation for {}", self.db.url());
        start_accrual_worker(self.db.clone(), oracle, config, shutdown)
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::VecDeque,
        future::{ready, Future},
        sync::Mutex,
        time::Duration,
    };

    use loyalty_engine::{AccrualStatus, OracleOutcome};

    use super::*;

    /// Hands out the scripted outcomes in order, then reports the order as unknown.
    struct SequenceOracle(Mutex<VecDeque<OracleOutcome>>);

    impl AccrualOracle for SequenceOracle {
        fn query(&self, _number: &OrderNumber) -> impl Future<Output = OracleOutcome> + Send {
            let next = self.0.lock().ok().and_then(|mut q| q.pop_front()).unwrap_or(OracleOutcome::NotYetKnown);
            ready(next)
        }
    }

    async fn service() -> (LoyaltyService, std::path::PathBuf) {
        let _ = env_logger::try_init();
        let path = std::env::temp_dir().join(format!("loyalty_service_{}.db", rand::random::<u64>()));
        let url = format!("sqlite://{}", path.display());
        let db = SqliteDatabase::open_and_migrate(&url, 5).await.unwrap();
        (LoyaltyService::new(db), path)
    }

    async fn wait_for_status(service: &LoyaltyService, user_id: i64, status: &str) {
        for _ in 0..200 {
            let orders = service.list_orders(user_id).await.unwrap();
            if orders.first().map(|o| o.status.as_str()) == Some(status) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Order never reached status {status}");
    }

    #[tokio::test]
    async fn accrual_then_spend() {
        let (service, path) = service().await;
        let user = service.create_user("U1", b"hash".to_vec()).await.unwrap();
        let number: OrderNumber = "4539578763621486".parse().unwrap();

        assert!(!service.register(user.id, &number).await.unwrap());
        assert!(service.register(user.id, &number).await.unwrap());
        let orders = service.list_orders(user.id).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, "NEW");
        assert_eq!(orders[0].accrual, None);

        let oracle = SequenceOracle(Mutex::new(VecDeque::from([
            OracleOutcome::Scored { status: AccrualStatus::Processing, accrual: None },
            OracleOutcome::Scored { status: AccrualStatus::Processed, accrual: Some(Points::from(50_000)) },
        ])));
        let shutdown = CancellationToken::new();
        let config = ReconciliationConfig { interval: Duration::from_millis(10), batch_size: 100 };
        let worker = service.start_reconciliation(oracle, config, shutdown.clone());
        wait_for_status(&service, user.id, "PROCESSED").await;
        shutdown.cancel();
        worker.await.unwrap();

        let orders = service.list_orders(user.id).await.unwrap();
        assert_eq!(orders[0].accrual, Some(500.0));
        assert_eq!(service.balance(user.id).await.unwrap(), BalanceView { current: 500.0, withdrawn: 0.0 });

        let reference: OrderNumber = "2377225624".parse().unwrap();
        service.withdraw(user.id, reference, Points::from(50_000)).await.unwrap();
        assert_eq!(service.balance(user.id).await.unwrap(), BalanceView { current: 0.0, withdrawn: 500.0 });

        let err = service.withdraw(user.id, "79927398713".parse().unwrap(), Points::from(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds(_)));

        let withdrawals = service.list_withdrawals(user.id).await.unwrap();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].order, "2377225624");
        assert_eq!(withdrawals[0].sum, 500.0);

        service.db().close().await;
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn registry_conflicts_surface_as_errors() {
        let (service, path) = service().await;
        let alice = service.create_user("alice", vec![]).await.unwrap();
        let bob = service.create_user("bob", vec![]).await.unwrap();
        let number: OrderNumber = "79927398713".parse().unwrap();
        service.register(alice.id, &number).await.unwrap();
        let err = service.register(bob.id, &number).await.unwrap_err();
        assert!(matches!(err, OrderRegistryError::OwnedByAnotherUser(_)));
        assert!(service.list_orders(bob.id).await.unwrap().is_empty());
        assert_eq!(service.list_orders(alice.id).await.unwrap().len(), 1);
        assert!(matches!(service.create_user("bob", vec![]).await, Err(AccountApiError::UserAlreadyExists(_))));
        assert_eq!(service.user_by_login("alice").await.unwrap().map(|u| u.id), Some(alice.id));
        assert_eq!(service.user_by_id(bob.id).await.unwrap().map(|u| u.login), Some("bob".to_string()));
        assert!(service.user_by_id(bob.id + 100).await.unwrap().is_none());

        service.db().close().await;
        let _ = std::fs::remove_file(path);
    }
}
