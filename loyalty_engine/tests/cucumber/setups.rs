use cucumber::given;

use crate::{
    cucumber::{LoyaltySystem, LoyaltyWorld},
    support::prepare_env::create_user,
};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user '{word}'")]
async fn a_user(world: &mut LoyaltyWorld, login: String) {
    let id = create_user(&world.system().db, &login).await;
    world.users.insert(login, id);
}
