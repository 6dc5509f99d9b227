use log::*;
use loyalty_engine::{
    db_types::{NewUser, OrderNumber},
    AccountManagement,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 25).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

/// A fresh database in a throw-away file.
pub async fn fresh_database() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("loyalty_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("🚀️ Nothing to drop at {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

pub async fn drop_database(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e:?}");
    }
}

pub async fn create_user(db: &SqliteDatabase, login: &str) -> i64 {
    let user = NewUser::new(login, b"not-a-real-hash".to_vec());
    db.create_user(user).await.expect("Error creating user").id
}

/// Builds a valid order number by appending the Luhn check digit to `seed`.
pub fn order_number(seed: u64) -> OrderNumber {
    let body = seed.to_string();
    let sum: u32 = body
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 {
                let d = d * 2;
                if d > 9 {
                    d - 9
                } else {
                    d
                }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    format!("{body}{check}").parse().expect("Generated an invalid order number")
}
