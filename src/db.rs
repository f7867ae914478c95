// connexion BD + création du schéma

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::{debug, info};

use crate::models::{category, order_items, orders, product, users};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    debug!("Connecting to {}", database_url);
    Database::connect(database_url).await
}

/// Crée les tables à partir des entités SeaORM (IF NOT EXISTS).
/// L'ordre respecte les clés étrangères: parents avant enfants.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, category::Entity).await?;
    create_table(db, product::Entity).await?;
    create_table(db, orders::Entity).await?;
    create_table(db, order_items::Entity).await?;

    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;

    // Index uniques/indexés déclarés sur les colonnes (username, email)
    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}
