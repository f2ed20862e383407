// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Colonnes de la table users:
//   - id (UUID, PRIMARY KEY)
//   - email (VARCHAR, UNIQUE) - toujours stocké en minuscules
//   - password_hash (VARCHAR) - bcrypt
//   - role ('customer' | 'vendor', défaut customer)
//   - is_verified, onboarding_completed (BOOLEAN)
//   - vendor_status (NULL | 'pending' | 'approved' | 'rejected')
//   - reset_token / reset_token_expiry - présents ensemble ou absents ensemble
//   - profile / preferences / interests (JSONB, NULL tant que non renseignés)
//
// Points d'attention:
//   - password_hash, reset_token, reset_token_expiry et password_reset_at ne
//     sont JAMAIS sérialisés en JSON
//   - onboarding_completed = true implique profile non NULL
//
// ============================================================================

use std::collections::BTreeMap;

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "vendor")]
    Vendor,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Profil client, écrit par l'étape finale de l'onboarding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub location: String,
    pub bio: String,
    pub profile_image_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub categories: Vec<String>,
    pub budget_range: String,
    pub shopping_frequency: String,
    #[serde(default)]
    pub special_prefs: BTreeMap<String, bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct Interests {
    pub categories: Vec<String>,
    pub is_set: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AccountRole,
    pub is_verified: bool,
    pub onboarding_completed: bool,
    pub vendor_status: Option<VendorStatus>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTimeUtc>,
    #[serde(skip_serializing)]
    pub password_reset_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub profile: Option<Profile>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub preferences: Option<Preferences>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub interests: Option<Interests>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::drafts::Entity")]
    Drafts,

    #[sea_orm(has_many = "super::vendor_applications::Entity")]
    VendorApplications,
}

impl Related<super::drafts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drafts.def()
    }
}

impl Related<super::vendor_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VendorApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
