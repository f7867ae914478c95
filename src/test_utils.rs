// Helpers partagés par les tests: base SQLite en mémoire + insertion rapide

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;

use crate::db;
use crate::models::dto::CreateUserRequest;
use crate::models::{category, product, users};

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Une seule connexion: chaque connexion ":memory:" aurait sa propre base
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .expect("failed to open in-memory database")
}

pub async fn setup_test_db() -> DatabaseConnection {
    init_test_tracing();
    let db = memory_db().await;
    db::create_tables(&db)
        .await
        .expect("failed to create tables");
    db
}

pub fn new_user_request(username: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "secret".to_string(),
        role: "staff".to_string(),
        is_active: true,
    }
}

pub async fn seed_user(db: &DatabaseConnection, username: &str) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password: Set("secret".to_string()),
        role: Set("staff".to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed user")
}

pub async fn seed_category(db: &DatabaseConnection, name: &str) -> category::Model {
    category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed category")
}

pub async fn seed_product(
    db: &DatabaseConnection,
    name: &str,
    price: i32,
    quantity: i32,
    category_id: i32,
) -> product::Model {
    product::ActiveModel {
        name: Set(name.to_string()),
        price: Set(price),
        quantity: Set(quantity),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed product")
}
