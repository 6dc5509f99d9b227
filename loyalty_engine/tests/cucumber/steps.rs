use std::time::Duration;

use cucumber::{then, when};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, Points},
    traits::{LedgerError, OrderRegistryError},
    AccrualStatus,
    OracleOutcome,
    OrderManagement,
};
use tokio_util::sync::CancellationToken;

use crate::cucumber::LoyaltyWorld;

fn number(s: &str) -> OrderNumber {
    s.parse().unwrap_or_else(|e| panic!("{s} is not a valid order number: {e}"))
}

fn points(s: &str) -> Points {
    s.parse().unwrap_or_else(|e| panic!("{s} is not a valid amount: {e}"))
}

#[when(expr = "'{word}' registers order {word}")]
async fn register_order(world: &mut LoyaltyWorld, login: String, order: String) {
    let user_id = world.user_id(&login);
    let result = world.system().registry.register_order(user_id, &number(&order)).await;
    world.last_registration = Some(result.map(|r| r.already_exists));
}

#[when(expr = "the accrual system reports order {word} as '{word}'")]
async fn oracle_reports(world: &mut LoyaltyWorld, order: String, status: String) {
    let outcome = OracleOutcome::Scored { status: AccrualStatus::from(status.as_str()), accrual: None };
    world.system().oracle.push(&number(&order), outcome);
}

#[when(expr = "the accrual system reports order {word} as '{word}' with {word} points")]
async fn oracle_reports_with_accrual(world: &mut LoyaltyWorld, order: String, status: String, amount: String) {
    let outcome = OracleOutcome::Scored { status: AccrualStatus::from(status.as_str()), accrual: Some(points(&amount)) };
    world.system().oracle.push(&number(&order), outcome);
}

#[when(expr = "the accrual system rate limits order {word} for {int} seconds")]
async fn oracle_rate_limits(world: &mut LoyaltyWorld, order: String, secs: u64) {
    let outcome = OracleOutcome::RateLimited { retry_after: Duration::from_secs(secs) };
    world.system().oracle.push(&number(&order), outcome);
}

#[when("a reconciliation cycle runs")]
async fn reconciliation_cycle(world: &mut LoyaltyWorld) {
    let report = world.system().reconciler().run_cycle(&CancellationToken::new()).await;
    assert!(!report.cancelled);
}

#[when(expr = "'{word}' withdraws {word} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, amount: String, reference: String) {
    let user_id = world.user_id(&login);
    let result = world.system().ledger.withdraw(user_id, number(&reference), points(&amount)).await;
    world.last_withdrawal = Some(result.map(|_| ()));
}

#[then("the registration was new")]
async fn registration_was_new(world: &mut LoyaltyWorld) {
    match &world.last_registration {
        Some(Ok(false)) => {},
        other => panic!("Expected a new registration, got {other:?}"),
    }
}

#[then("the registration was already known")]
async fn registration_was_known(world: &mut LoyaltyWorld) {
    match &world.last_registration {
        Some(Ok(true)) => {},
        other => panic!("Expected an existing registration, got {other:?}"),
    }
}

#[then("the registration fails because another user owns the order")]
async fn registration_conflict(world: &mut LoyaltyWorld) {
    match &world.last_registration {
        Some(Err(OrderRegistryError::OwnedByAnotherUser(_))) => {},
        other => panic!("Expected an ownership conflict, got {other:?}"),
    }
}

#[then(expr = "'{word}' has {int} order(s)")]
async fn order_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let user_id = world.user_id(&login);
    let orders = world.system().registry.orders_for_user(user_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the order {word} has status {word}")]
async fn order_status(world: &mut LoyaltyWorld, order: String, status: String) {
    let expected: OrderStatusType = status.parse().expect("Not a valid order status");
    let order = world.system().db.fetch_order_by_number(&number(&order)).await.unwrap().expect("Order not found");
    assert_eq!(order.status, expected);
}

#[then(expr = "the order {word} has status {word} with an accrual of {int} minor units")]
async fn order_status_and_accrual(world: &mut LoyaltyWorld, order: String, status: String, accrual: i64) {
    let expected: OrderStatusType = status.parse().expect("Not a valid order status");
    let order = world.system().db.fetch_order_by_number(&number(&order)).await.unwrap().expect("Order not found");
    assert_eq!(order.status, expected);
    assert_eq!(order.accrual, Some(Points::from(accrual)));
}

#[then(expr = "the balance of '{word}' is {word} current and {word} withdrawn")]
async fn balance(world: &mut LoyaltyWorld, login: String, current: String, withdrawn: String) {
    let user_id = world.user_id(&login);
    let balance = world.system().ledger.balance(user_id).await.expect("Error fetching balance");
    assert_eq!(balance.current, points(&current));
    assert_eq!(balance.withdrawn, points(&withdrawn));
}

#[then("the withdrawal succeeds")]
async fn withdrawal_succeeds(world: &mut LoyaltyWorld) {
    match &world.last_withdrawal {
        Some(Ok(())) => {},
        other => panic!("Expected the withdrawal to succeed, got {other:?}"),
    }
}

#[then("the withdrawal fails with insufficient funds")]
async fn withdrawal_insufficient(world: &mut LoyaltyWorld) {
    match &world.last_withdrawal {
        Some(Err(LedgerError::InsufficientFunds(_))) => {},
        other => panic!("Expected insufficient funds, got {other:?}"),
    }
}

#[then(expr = "no accrual query was made within {int} seconds of the rate limit")]
async fn backpressure(world: &mut LoyaltyWorld, secs: i64) {
    let calls = world.system().oracle.calls();
    assert!(calls.len() >= 2, "Expected at least two accrual queries, got {}", calls.len());
    assert!(calls[1].at - calls[0].at >= chrono::Duration::seconds(secs));
}
