// ============================================================================
// DRAFT STORE
// ============================================================================
//
// Description:
//   Lecture / écriture des brouillons d'onboarding. Chaque soumission est un
//   seul INSERT ... ON CONFLICT (user_id, role) DO UPDATE ... RETURNING *:
//     - absent  -> insertion avec version = 1
//     - présent -> fusion des clés dans step_data, version + 1
//   Pas de lecture préalable, donc pas de fenêtre entre lecture et écriture.
//
// Points d'attention:
//   - Fusion au premier niveau seulement: une étape remplace son bucket entier
//     et ne touche pas aux autres clés
//   - PostgreSQL: jsonb ||, SQLite: json_set clé par clé
//   - Les étapes dédiées ne font qu'amorcer step / stepCompleted; seule la
//     soumission générique les écrase
//
// ============================================================================

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, Statement, Value,
};
use uuid::Uuid;

use crate::models::drafts::{self, Entity as Drafts};
use crate::models::onboarding::OnboardingRole;

/// Une écriture de brouillon: les clés à fusionner et l'état d'étape
pub struct DraftWrite {
    pub user_id: Uuid,
    pub role: OnboardingRole,
    pub step: i32,
    pub step_completed: bool,
    /// true = step et step_completed écrasent l'existant, false = valeurs d'amorçage
    pub overwrite_step: bool,
    /// Objet JSON { clé: bucket }
    pub patch: serde_json::Value,
}

pub struct DraftStore;

impl DraftStore {
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        role: OnboardingRole,
    ) -> Result<Option<drafts::Model>, DbErr> {
        Drafts::find()
            .filter(drafts::Column::UserId.eq(user_id))
            .filter(drafts::Column::Role.eq(role))
            .one(db)
            .await
    }

    /// Upsert atomique, renvoie le brouillon après écriture
    pub async fn upsert_step<C: ConnectionTrait>(db: &C, write: DraftWrite) -> Result<drafts::Model, DbErr> {
        let keys: Vec<String> = match &write.patch {
            serde_json::Value::Object(map) if !map.is_empty() => map.keys().cloned().collect(),
            _ => return Err(DbErr::Custom("draft patch must be a non-empty object".to_string())),
        };

        let backend = db.get_database_backend();
        let now = Utc::now();
        let statement = match backend {
            DbBackend::Postgres => Statement::from_sql_and_values(
                backend,
                postgres_upsert_sql(),
                [
                    Value::from(Uuid::new_v4()),
                    Value::from(write.user_id),
                    Value::from(write.role.as_str()),
                    Value::from(write.step),
                    Value::from(write.step_completed),
                    Value::from(write.patch),
                    Value::from(now),
                    Value::from(write.overwrite_step),
                ],
            ),
            DbBackend::Sqlite => Statement::from_sql_and_values(
                backend,
                sqlite_upsert_sql(&keys)?,
                [
                    Value::from(Uuid::new_v4()),
                    Value::from(write.user_id),
                    Value::from(write.role.as_str()),
                    Value::from(write.step),
                    Value::from(write.step_completed),
                    Value::from(write.patch),
                    Value::from(now),
                    Value::from(now),
                    Value::from(write.overwrite_step),
                    Value::from(write.overwrite_step),
                ],
            ),
            other => {
                return Err(DbErr::Custom(format!("draft upsert not supported on {other:?}")));
            }
        };

        Drafts::find()
            .from_raw_sql(statement)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("draft upsert returned no row".to_string()))
    }
}

fn postgres_upsert_sql() -> &'static str {
    r#"INSERT INTO drafts (id, user_id, role, step, step_completed, step_data, version, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $7)
ON CONFLICT (user_id, role) DO UPDATE SET
    step = CASE WHEN $8 THEN excluded.step ELSE drafts.step END,
    step_completed = CASE WHEN $8 THEN excluded.step_completed ELSE drafts.step_completed END,
    step_data = drafts.step_data || excluded.step_data,
    version = drafts.version + 1,
    updated_at = excluded.updated_at
RETURNING *"#
}

/// Les clés viennent de DraftStep::key (liste fermée), elles sont revérifiées ici
/// avant d'être écrites dans le chemin JSON.
fn sqlite_upsert_sql(keys: &[String]) -> Result<String, DbErr> {
    let mut merge = String::from("drafts.step_data");
    for key in keys {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DbErr::Custom(format!("invalid step_data key: {key}")));
        }
        merge = format!("json_set({merge}, '$.{key}', json(json_extract(excluded.step_data, '$.{key}')))");
    }

    Ok(format!(
        r#"INSERT INTO drafts (id, user_id, role, step, step_completed, step_data, version, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
ON CONFLICT (user_id, role) DO UPDATE SET
    step = CASE WHEN ? THEN excluded.step ELSE drafts.step END,
    step_completed = CASE WHEN ? THEN excluded.step_completed ELSE drafts.step_completed END,
    step_data = {merge},
    version = drafts.version + 1,
    updated_at = excluded.updated_at
RETURNING *"#
    ))
}
