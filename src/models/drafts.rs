// ============================================================================
// MODÈLE : DRAFTS (brouillons d'onboarding)
// ============================================================================
//
// Colonnes de la table drafts:
//   - id (UUID, PRIMARY KEY)
//   - user_id (UUID, FK -> users.id)
//   - role ('customer' | 'vendor')
//   - step (INTEGER >= 1), step_completed (BOOLEAN)
//   - step_data (JSONB) - agrégat du rôle, une clé par étape
//   - version (BIGINT) - +1 à chaque soumission, 1 à la création
//
// Points d'attention:
//   - Index unique (user_id, role): un seul brouillon par rôle et par user
//   - Toutes les écritures passent par DraftStore::upsert_step (SQL brut,
//     INSERT ... ON CONFLICT), jamais par ActiveModel::update
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::onboarding::{OnboardingRole, StepData};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "drafts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: OnboardingRole,
    pub step: i32,
    pub step_completed: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub step_data: Json,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Brouillon tel que renvoyé par l'API, step_data typé selon le rôle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub role: OnboardingRole,
    pub step: i32,
    pub step_completed: bool,
    pub step_data: StepData,
    pub version: i64,
    pub updated_at: DateTimeUtc,
}

impl TryFrom<Model> for Draft {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let step_data = StepData::from_json(model.role, model.step_data)
            .map_err(|e| DbErr::Json(format!("drafts.step_data: {e}")))?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            role: model.role,
            step: model.step,
            step_completed: model.step_completed,
            step_data,
            version: model.version,
            updated_at: model.updated_at,
        })
    }
}
