// Candidature vendeur (parcours simple, indépendant des brouillons)

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::dto::{VendorApplicationRequest, VendorApplicationResponse};
use crate::models::users::VendorStatus;
use crate::models::vendor_applications::{self, StringList};
use crate::services::credential_store::CredentialStore;
use crate::utils::deadline::Deadline;

pub const ALREADY_VENDOR: &str = "User is already a verified vendor";
pub const ALREADY_PENDING: &str = "Vendor application already pending review";

pub struct VendorService {
    db: DatabaseConnection,
}

fn status_rejection(status: Option<&VendorStatus>) -> Option<AppError> {
    match status {
        Some(VendorStatus::Approved) => Some(AppError::BadRequest(ALREADY_VENDOR.to_string())),
        Some(VendorStatus::Pending) => Some(AppError::BadRequest(ALREADY_PENDING.to_string())),
        Some(VendorStatus::Rejected) | None => None,
    }
}

impl VendorService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn apply(
        &self,
        user_id: Uuid,
        req: VendorApplicationRequest,
        deadline: Deadline,
    ) -> Result<VendorApplicationResponse, AppError> {
        // 1. Statut actuel
        let user = deadline
            .run(CredentialStore::find_by_id(&self.db, user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if let Some(err) = status_rejection(user.vendor_status.as_ref()) {
            return Err(err);
        }

        // 2. Validation du dossier
        req.validate()?;

        // 3. Statut + candidature dans la même transaction
        let application = vendor_applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            business_name: Set(req.business_name),
            business_type: Set(req.business_type),
            business_description: Set(req.business_description),
            contact_email: Set(req.contact_email),
            contact_phone: Set(req.contact_phone),
            business_address: Set(req.business_address),
            tax_id: Set(req.tax_id),
            website: Set(req.website),
            social_media: Set(StringList(req.social_media)),
            products: Set(StringList(req.products)),
            experience: Set(req.experience),
            motivation: Set(req.motivation),
            status: Set(VendorStatus::Pending),
            applied_at: Set(Utc::now()),
            reviewed_at: Set(None),
            reviewed_by: Set(None),
            review_notes: Set(None),
        };

        let saved = deadline
            .run(async {
                let txn = self.db.begin().await?;

                // mise à jour conditionnelle: une candidature concurrente a pu passer entre-temps
                if CredentialStore::mark_vendor_pending(&txn, user_id).await? == 0 {
                    return Err(AppError::BadRequest(ALREADY_PENDING.to_string()));
                }
                let saved = application.insert(&txn).await?;

                txn.commit().await?;
                Ok::<_, AppError>(saved)
            })
            .await?;

        tracing::info!(user_id = %user_id, application_id = %saved.id, "Vendor application submitted");

        Ok(VendorApplicationResponse {
            application_id: saved.id,
            status: saved.status,
            message: "Vendor application submitted successfully".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users;
    use crate::test_support::TestContext;
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    fn application() -> VendorApplicationRequest {
        VendorApplicationRequest {
            business_name: "Ada Crafts".to_string(),
            business_type: "sole-proprietor".to_string(),
            business_description: "Handmade leather goods".to_string(),
            contact_email: "shop@adacrafts.com".to_string(),
            contact_phone: "07027262819".to_string(),
            business_address: "12 Marina Road, Lagos".to_string(),
            tax_id: None,
            website: Some("https://adacrafts.com".to_string()),
            social_media: vec!["@adacrafts".to_string()],
            products: vec!["bags".to_string()],
            experience: "Five years at local markets".to_string(),
            motivation: "Reach customers nationwide".to_string(),
        }
    }

    async fn set_status(ctx: &TestContext, user_id: Uuid, status: VendorStatus) {
        users::Entity::update_many()
            .col_expr(users::Column::VendorStatus, Expr::value(status))
            .filter(users::Column::Id.eq(user_id))
            .exec(&ctx.db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_apply_sets_pending() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;

        let res = ctx.vendor().apply(user.id, application(), Deadline::standard()).await.unwrap();
        assert_eq!(res.status, VendorStatus::Pending);

        let stored = CredentialStore::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
        assert_eq!(stored.vendor_status, Some(VendorStatus::Pending));

        let app = vendor_applications::Entity::find_by_id(res.application_id)
            .one(&ctx.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(app.products, StringList(vec!["bags".to_string()]));

        // seconde candidature refusée
        let err = ctx.vendor().apply(user.id, application(), Deadline::standard()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == ALREADY_PENDING));
    }

    #[tokio::test]
    async fn test_apply_rejected_for_approved_vendor() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        set_status(&ctx, user.id, VendorStatus::Approved).await;

        let err = ctx.vendor().apply(user.id, application(), Deadline::standard()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == ALREADY_VENDOR));
    }

    #[tokio::test]
    async fn test_rejected_vendor_may_reapply() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        set_status(&ctx, user.id, VendorStatus::Rejected).await;

        assert!(ctx.vendor().apply(user.id, application(), Deadline::standard()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_application() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;

        let mut req = application();
        req.products.clear();
        req.contact_phone = "123".to_string();
        let err = ctx.vendor().apply(user.id, req, Deadline::standard()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let stored = CredentialStore::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
        assert!(stored.vendor_status.is_none());
    }
}
