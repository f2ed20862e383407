// ============================================================================
// MODÈLE : VENDOR_APPLICATIONS (candidatures vendeur, parcours simple)
// ============================================================================
//
// Une ligne par candidature soumise via /api/v1/vendor/apply.
// Les champs reviewed_* sont réservés à la revue admin (hors périmètre).
//
// ============================================================================

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::users::VendorStatus;

/// Liste de chaînes stockée en JSON (réseaux sociaux, produits)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "vendor_applications")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub business_type: String,
    #[sea_orm(column_type = "Text")]
    pub business_description: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub business_address: String,
    pub tax_id: Option<String>,
    pub website: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub social_media: StringList,
    #[sea_orm(column_type = "JsonBinary")]
    pub products: StringList,
    #[sea_orm(column_type = "Text")]
    pub experience: String,
    #[sea_orm(column_type = "Text")]
    pub motivation: String,
    pub status: VendorStatus,
    pub applied_at: DateTimeUtc,
    pub reviewed_at: Option<DateTimeUtc>,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: Option<String>,
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
