mod account_locks;
mod clock;
mod luhn;

pub use account_locks::{AccountGuard, AccountLocks};
pub use clock::{Clock, TokioClock};
pub use luhn::is_valid_luhn;
