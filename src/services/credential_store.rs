// ============================================================================
// CREDENTIAL STORE
// ============================================================================
//
// Accès à la table users. Méthodes statiques génériques sur ConnectionTrait
// pour être utilisables aussi bien avec le pool qu'à l'intérieur d'une
// transaction.
//
// Points d'attention:
//   - L'email est normalisé (trim + minuscules) avant toute lecture/écriture
//   - Les mises à jour conditionnelles renvoient le nombre de lignes touchées,
//     à l'appelant de décider si 0 veut dire "introuvable" ou "refusé"
//
// ============================================================================

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use crate::models::users::{
    self, AccountRole, Entity as Users, Interests, Preferences, Profile, VendorStatus,
};

pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub struct CredentialStore;

impl CredentialStore {
    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        Users::find_by_id(id).one(db).await
    }

    pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await
    }

    pub async fn find_by_reset_token<C: ConnectionTrait>(
        db: &C,
        token: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::ResetToken.eq(token))
            .one(db)
            .await
    }

    /// Insère un client non vérifié. Un doublon d'email remonte en violation d'unicité.
    pub async fn insert<C: ConnectionTrait>(db: &C, new_user: NewUser) -> Result<users::Model, DbErr> {
        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&new_user.email)),
            name: Set(new_user.name),
            phone: Set(new_user.phone),
            address: Set(new_user.address),
            password_hash: Set(new_user.password_hash),
            role: Set(AccountRole::Customer),
            is_verified: Set(false),
            onboarding_completed: Set(false),
            vendor_status: Set(None),
            reset_token: Set(None),
            reset_token_expiry: Set(None),
            password_reset_at: Set(None),
            profile: Set(None),
            preferences: Set(None),
            interests: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        user.insert(db).await
    }

    /// is_verified = true. Idempotent: renvoie 1 même si déjà vérifié.
    pub async fn mark_verified<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::IsVerified, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Écrase tout token précédent: un seul token de reset vivant par utilisateur
    pub async fn set_reset_token<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::ResetToken, Expr::value(token))
            .col_expr(users::Column::ResetTokenExpiry, Expr::value(expiry))
            .filter(users::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Change le mot de passe et consomme le token, seulement s'il est toujours
    /// celui de l'utilisateur et non expiré. 0 ligne = token déjà utilisé ou expiré.
    pub async fn complete_password_reset<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(users::Column::ResetTokenExpiry, Expr::value(Option::<DateTime<Utc>>::None))
            .col_expr(users::Column::PasswordResetAt, Expr::value(now))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(
                Condition::all()
                    .add(users::Column::Id.eq(id))
                    .add(users::Column::ResetToken.eq(token))
                    .add(users::Column::ResetTokenExpiry.gt(now)),
            )
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn set_interests<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        interests: Interests,
    ) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::Interests, Expr::value(interests))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn set_preferences<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        preferences: Preferences,
    ) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::Preferences, Expr::value(preferences))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Étape finale client: profil + onboarding_completed dans la même écriture
    pub async fn finalize_profile<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        profile: Profile,
    ) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::Profile, Expr::value(profile))
            .col_expr(users::Column::OnboardingCompleted, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Passe vendor_status à pending si aucune candidature n'est en cours ou acceptée
    pub async fn mark_vendor_pending<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::VendorStatus, Expr::value(VendorStatus::Pending))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(
                Condition::all().add(users::Column::Id.eq(id)).add(
                    Condition::any()
                        .add(users::Column::VendorStatus.is_null())
                        .add(users::Column::VendorStatus.eq(VendorStatus::Rejected)),
                ),
            )
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
