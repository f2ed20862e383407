// connexion BD + création du schéma au démarrage

use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use secrecy::{ExposeSecret, SecretString};

use crate::models::{drafts, users, vendor_applications};

pub const DRAFTS_USER_ROLE_INDEX: &str = "idx_drafts_user_role";
pub const USERS_EMAIL_INDEX: &str = "idx_users_email";

/// Pool {min 5, max 10}, idle 30s, connexion 30s
pub async fn establish_connection(database_url: &SecretString) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.expose_secret().to_owned());
    options
        .min_connections(5)
        .max_connections(10)
        .idle_timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Crée les tables et les index uniques s'ils n'existent pas (idempotent).
/// Appelé une fois au démarrage, jamais sur le chemin d'une requête.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // 1. Tables (users d'abord, les deux autres la référencent)
    let mut tables = [
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(drafts::Entity),
        schema.create_table_from_entity(vendor_applications::Entity),
    ];
    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    // 2. Un seul brouillon par (user_id, role)
    let drafts_index = Index::create()
        .name(DRAFTS_USER_ROLE_INDEX)
        .table(drafts::Entity)
        .col(drafts::Column::UserId)
        .col(drafts::Column::Role)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&drafts_index)).await?;

    // 3. Email unique (toujours stocké en minuscules)
    let email_index = Index::create()
        .name(USERS_EMAIL_INDEX)
        .table(users::Entity)
        .col(users::Column::Email)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&email_index)).await?;

    tracing::info!(backend = ?backend, "Database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = test_db().await;
        // test_db l'a déjà appliqué une fois
        ensure_schema(&db).await.unwrap();
        ensure_schema(&db).await.unwrap();
    }
}
