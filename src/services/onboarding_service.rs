// ============================================================================
// SERVICE ONBOARDING (moteur de brouillons)
// ============================================================================
//
// Machine à états par (utilisateur, rôle):
//   absent -> en cours      : première étape soumise, version = 1
//   en cours -> en cours    : toute étape, version + 1
//   en cours -> finalisé    : profile_finalize (client uniquement pour l'instant)
//
// Points d'attention:
//   - Une étape n'écrit que sa clé de step_data, les autres restent intactes
//   - L'upload d'image a lieu AVANT toute écriture: un échec Cloudinary ne
//     modifie ni l'utilisateur ni le brouillon
//   - interests / preferences mettent à jour users ET le brouillon dans la
//     même transaction
//   - Pas d'étape terminale vendeur: les brouillons vendeur s'accumulent
//
// ============================================================================

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr, SqlErr, TransactionTrait};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::drafts::Draft;
use crate::models::dto::{DraftSubmission, SavedStep};
use crate::models::onboarding::{
    CustomerStep, DraftStep, InterestsStep, OnboardingRole, PreferencesStep, StoreDetailsStep, VendorStep,
    step_patch,
};
use crate::models::users::{self, Interests, Preferences, Profile};
use crate::services::blob::{BlobStore, PROFILE_FOLDER, STORE_LOGO_FOLDER};
use crate::services::credential_store::CredentialStore;
use crate::services::draft_store::{DraftStore, DraftWrite};
use crate::utils::deadline::Deadline;
use crate::utils::multipart::UploadedFile;

/// Étape finale client (multipart)
pub struct ProfileForm {
    pub location: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<UploadedFile>,
}

/// Détails boutique vendeur (multipart, logo obligatoire)
pub struct StoreDetailsForm {
    pub store_name: Option<String>,
    pub store_description: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub logo: Option<UploadedFile>,
}

/// Sous-document utilisateur écrit en même temps que le brouillon client
enum UserRecord {
    Interests(Interests),
    Preferences(Preferences),
}

pub struct OnboardingService {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Un brouillon pour un utilisateur supprimé viole la clé étrangère
fn map_draft_error(err: AppError) -> AppError {
    match err {
        AppError::Database(db_err) if is_foreign_key_violation(&db_err) => user_not_found(),
        other => other,
    }
}

fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

/// `{ clé: bucket, version }` renvoyé par les étapes dédiées
fn echo(step: &DraftStep, version: i64) -> SavedStep<Map<String, Value>> {
    let mut data = Map::new();
    data.insert(step.key().to_string(), step.bucket());
    SavedStep { data, version }
}

impl OnboardingService {
    pub fn new(db: DatabaseConnection, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Soumission générique: stepData non typé projeté vers les étapes du rôle.
    /// step et stepCompleted du client sont écrits tels quels.
    pub async fn save_draft(
        &self,
        user_id: Uuid,
        submission: DraftSubmission,
        deadline: Deadline,
    ) -> Result<Draft, AppError> {
        // 1. Validation de l'enveloppe
        submission.validate()?;
        let role = OnboardingRole::parse(&submission.role)
            .ok_or_else(|| AppError::invalid_input("role must be 'customer' or 'vendor'"))?;
        if submission.step_data.is_empty() {
            return Err(AppError::invalid_input("stepData must not be empty"));
        }

        // 2. Projection + validation de chaque clé
        let steps = DraftStep::project_all(role, submission.step_data)?;

        // 3. Upsert atomique
        let write = DraftWrite {
            user_id,
            role,
            step: submission.step,
            step_completed: submission.step_completed,
            overwrite_step: true,
            patch: step_patch(&steps),
        };
        let model = deadline
            .run(DraftStore::upsert_step(&self.db, write))
            .await
            .map_err(map_draft_error)?;

        tracing::debug!(user_id = %user_id, role = role.as_str(), version = model.version, "Draft saved");
        Ok(Draft::try_from(model)?)
    }

    /// Rôle par défaut: customer. Un rôle inconnu donne "pas de brouillon".
    pub async fn get_draft(
        &self,
        user_id: Uuid,
        role: Option<&str>,
        deadline: Deadline,
    ) -> Result<Option<Draft>, AppError> {
        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            None => OnboardingRole::Customer,
            Some(raw) => match OnboardingRole::parse(raw) {
                Some(role) => role,
                None => return Ok(None),
            },
        };

        let model = deadline.run(DraftStore::find(&self.db, user_id, role)).await?;
        model.map(Draft::try_from).transpose().map_err(AppError::from)
    }

    /// Étape dédiée (une seule clé). step / stepCompleted ne servent qu'à la création.
    pub async fn submit_step(
        &self,
        user_id: Uuid,
        step: DraftStep,
        deadline: Deadline,
    ) -> Result<SavedStep<Map<String, Value>>, AppError> {
        step.validate()?;

        let write = DraftWrite {
            user_id,
            role: step.role(),
            step: step.ordinal(),
            step_completed: true,
            overwrite_step: false,
            patch: step_patch(std::slice::from_ref(&step)),
        };
        let model = deadline
            .run(DraftStore::upsert_step(&self.db, write))
            .await
            .map_err(map_draft_error)?;

        Ok(echo(&step, model.version))
    }

    /// Centres d'intérêt: users.interests + brouillon client, en une transaction
    pub async fn update_interests(
        &self,
        user_id: Uuid,
        interests: InterestsStep,
        deadline: Deadline,
    ) -> Result<SavedStep<Map<String, Value>>, AppError> {
        interests.validate()?;

        let record = Interests {
            categories: interests.categories.clone(),
            is_set: true,
        };
        let step = DraftStep::Customer(CustomerStep::Interests(interests));
        let version = self
            .write_user_and_draft(user_id, UserRecord::Interests(record), &step, deadline)
            .await?;

        Ok(echo(&step, version))
    }

    /// Préférences d'achat: users.preferences + brouillon client, en une transaction
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        preferences: PreferencesStep,
        deadline: Deadline,
    ) -> Result<SavedStep<Map<String, Value>>, AppError> {
        preferences.validate()?;

        let record = Preferences {
            categories: preferences.categories.clone(),
            budget_range: preferences.budget_range.clone(),
            shopping_frequency: preferences.shopping_frequency.clone(),
            special_prefs: preferences.special_prefs.clone(),
        };
        let step = DraftStep::Customer(CustomerStep::Preferences(preferences));
        let version = self
            .write_user_and_draft(user_id, UserRecord::Preferences(record), &step, deadline)
            .await?;

        Ok(echo(&step, version))
    }

    async fn write_user_and_draft(
        &self,
        user_id: Uuid,
        record: UserRecord,
        step: &DraftStep,
        deadline: Deadline,
    ) -> Result<i64, AppError> {
        let write = DraftWrite {
            user_id,
            role: step.role(),
            step: step.ordinal(),
            step_completed: true,
            overwrite_step: false,
            patch: step_patch(std::slice::from_ref(step)),
        };

        deadline
            .run(async {
                let txn = self.db.begin().await?;

                // 1. Sous-document utilisateur
                let updated = match record {
                    UserRecord::Interests(interests) => {
                        CredentialStore::set_interests(&txn, user_id, interests).await?
                    }
                    UserRecord::Preferences(preferences) => {
                        CredentialStore::set_preferences(&txn, user_id, preferences).await?
                    }
                };
                if updated == 0 {
                    // txn abandonnée au drop => rollback
                    return Err(user_not_found());
                }

                // 2. Brouillon
                let draft = DraftStore::upsert_step(&txn, write).await?;

                txn.commit().await?;
                Ok::<_, AppError>(draft.version)
            })
            .await
    }

    /// Étape terminale client: upload, puis profil + onboarding_completed
    pub async fn complete_profile(
        &self,
        user_id: Uuid,
        form: ProfileForm,
        deadline: Deadline,
    ) -> Result<users::Model, AppError> {
        // 1. Champs et image validés avant tout appel externe
        let (Some(location), Some(bio)) = (form.location, form.bio) else {
            return Err(AppError::invalid_input("location and bio are required"));
        };
        let image = form
            .picture
            .ok_or_else(|| AppError::invalid_input("Profile picture is required"))?
            .into_image()?;

        // 2. Upload
        let profile_image_url = deadline.run(self.blobs.upload(image, PROFILE_FOLDER)).await?;

        // 3. Écriture du profil
        let profile = Profile {
            location,
            bio,
            profile_image_url,
        };
        let updated = deadline
            .run(CredentialStore::finalize_profile(&self.db, user_id, profile))
            .await?;
        if updated == 0 {
            return Err(user_not_found());
        }

        tracing::info!(user_id = %user_id, "Customer onboarding completed");

        deadline
            .run(CredentialStore::find_by_id(&self.db, user_id))
            .await?
            .ok_or_else(user_not_found)
    }

    /// Détails boutique: upload du logo puis écriture dans le brouillon vendeur
    pub async fn save_store_details(
        &self,
        user_id: Uuid,
        form: StoreDetailsForm,
        deadline: Deadline,
    ) -> Result<SavedStep<Map<String, Value>>, AppError> {
        let store_name = form
            .store_name
            .ok_or_else(|| AppError::invalid_input("storeName is required"))?;
        let store_description = form
            .store_description
            .ok_or_else(|| AppError::invalid_input("storeDescription is required"))?;
        let logo = form
            .logo
            .ok_or_else(|| AppError::invalid_input("storeLogo is required"))?
            .into_image()?;

        let store_logo = deadline.run(self.blobs.upload(logo, STORE_LOGO_FOLDER)).await?;

        let step = DraftStep::Vendor(VendorStep::StoreDetails(StoreDetailsStep {
            store_name,
            store_description,
            primary_color: form.primary_color,
            accent_color: form.accent_color,
            store_logo,
        }));
        self.submit_step(user_id, step, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::onboarding::{BusinessInfoStep, BusinessSize, BusinessType, CategoriesStep, Experience};
    use crate::services::draft_store::DraftStore;
    use crate::test_support::TestContext;
    use serde_json::json;

    fn submission(role: &str, step: i32, step_data: Value) -> DraftSubmission {
        DraftSubmission {
            role: role.to_string(),
            step,
            step_completed: true,
            step_data: serde_json::from_value(step_data).unwrap(),
        }
    }

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: b"\x89PNG\r\n\x1a\n".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_customer_draft_accumulation() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let first = onboarding
            .save_draft(
                user.id,
                submission("customer", 1, json!({"interests": {"categories": ["tech", "books"]}})),
                Deadline::standard(),
            )
            .await
            .unwrap();
        assert_eq!(first.version, 1);

        let second = onboarding
            .save_draft(
                user.id,
                submission(
                    "customer",
                    2,
                    json!({"preferences": {"budgetRange": "100-500", "shoppingFrequency": "weekly"}}),
                ),
                Deadline::standard(),
            )
            .await
            .unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.step, 2);

        let json = serde_json::to_value(&second).unwrap();
        assert_eq!(json["stepData"]["interests"]["categories"], json!(["tech", "books"]));
        assert_eq!(json["stepData"]["preferences"]["shoppingFrequency"], "weekly");

        let fetched = onboarding
            .get_draft(user.id, Some("customer"), Deadline::standard())
            .await
            .unwrap();
        assert_eq!(fetched, Some(second));
    }

    #[tokio::test]
    async fn test_save_draft_rejects_bad_envelopes() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let cases = [
            submission("admin", 1, json!({"interests": {"categories": ["a"]}})),
            submission("customer", 1, json!({})),
            submission("customer", 1, json!({"storeDetails": {}})),
            submission("customer", 1, json!({"interests": {"categories": []}})),
        ];
        for case in cases {
            let err = onboarding.save_draft(user.id, case, Deadline::standard()).await.unwrap_err();
            assert!(
                matches!(err, AppError::InvalidInput(_) | AppError::Validation(_)),
                "unexpected error: {err:?}"
            );
        }

        assert!(DraftStore::find(&ctx.db, user.id, OnboardingRole::Customer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_draft_defaults_and_unknown_role() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        assert!(onboarding.get_draft(user.id, None, Deadline::standard()).await.unwrap().is_none());

        onboarding
            .save_draft(
                user.id,
                submission("customer", 1, json!({"interests": {"categories": ["tech"]}})),
                Deadline::standard(),
            )
            .await
            .unwrap();

        assert!(onboarding.get_draft(user.id, None, Deadline::standard()).await.unwrap().is_some());
        assert!(onboarding.get_draft(user.id, Some("vendor"), Deadline::standard()).await.unwrap().is_none());
        assert!(onboarding.get_draft(user.id, Some("wizard"), Deadline::standard()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_vendor_steps_merge_and_version() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let info = onboarding
            .submit_step(
                user.id,
                DraftStep::Vendor(VendorStep::BusinessInfo(BusinessInfoStep {
                    business_type: BusinessType::Llc,
                    size: BusinessSize::From2To10,
                    experience: Experience::UpTo2Years,
                })),
                Deadline::standard(),
            )
            .await
            .unwrap();
        assert_eq!(info.version, 1);
        assert_eq!(info.data["businessInfo"]["type"], "llc");

        let categories = onboarding
            .submit_step(
                user.id,
                DraftStep::Vendor(VendorStep::Categories(CategoriesStep {
                    categories: vec!["fashion".to_string()],
                })),
                Deadline::standard(),
            )
            .await
            .unwrap();
        assert_eq!(categories.version, 2);

        let draft = onboarding
            .get_draft(user.id, Some("vendor"), Deadline::standard())
            .await
            .unwrap()
            .unwrap();
        // la première étape amorce step, les suivantes ne le changent pas
        assert_eq!(draft.step, 1);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["stepData"]["businessInfo"]["size"], "2-10");
        assert_eq!(json["stepData"]["categories"], json!(["fashion"]));
    }

    #[tokio::test]
    async fn test_interests_update_user_and_draft() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let saved = onboarding
            .update_interests(
                user.id,
                InterestsStep {
                    categories: vec!["tech".to_string()],
                },
                Deadline::standard(),
            )
            .await
            .unwrap();
        assert_eq!(saved.version, 1);

        let stored = CredentialStore::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
        let interests = stored.interests.unwrap();
        assert!(interests.is_set);
        assert_eq!(interests.categories, vec!["tech"]);

        let draft = DraftStore::find(&ctx.db, user.id, OnboardingRole::Customer).await.unwrap().unwrap();
        assert_eq!(draft.step_data["interests"]["categories"], json!(["tech"]));
    }

    #[tokio::test]
    async fn test_interests_for_missing_user_rolls_back() {
        let ctx = TestContext::new().await;
        let onboarding = ctx.onboarding();
        let ghost = Uuid::new_v4();

        let err = onboarding
            .update_interests(
                ghost,
                InterestsStep {
                    categories: vec!["tech".to_string()],
                },
                Deadline::standard(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(DraftStore::find(&ctx.db, ghost, OnboardingRole::Customer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_profile_finalizes_user() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let updated = onboarding
            .complete_profile(
                user.id,
                ProfileForm {
                    location: Some("Lagos".to_string()),
                    bio: Some("Hello".to_string()),
                    picture: Some(png("me.png")),
                },
                Deadline::upload(),
            )
            .await
            .unwrap();

        assert!(updated.onboarding_completed);
        let profile = updated.profile.unwrap();
        assert_eq!(profile.location, "Lagos");
        assert!(profile.profile_image_url.contains(PROFILE_FOLDER));
        assert_eq!(ctx.blobs.uploads(), vec![(PROFILE_FOLDER.to_string(), "me.png".to_string())]);
    }

    #[tokio::test]
    async fn test_complete_profile_rejects_gif_without_upload() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let mut picture = png("me.gif");
        picture.content_type = Some("image/gif".to_string());
        let err = onboarding
            .complete_profile(
                user.id,
                ProfileForm {
                    location: Some("Lagos".to_string()),
                    bio: Some("Hello".to_string()),
                    picture: Some(picture),
                },
                Deadline::upload(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(ctx.blobs.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_blob_failure_leaves_state_untouched() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        ctx.blobs.fail_next();
        let onboarding = ctx.onboarding();

        let err = onboarding
            .save_store_details(
                user.id,
                StoreDetailsForm {
                    store_name: Some("Ada's".to_string()),
                    store_description: Some("Handmade things".to_string()),
                    primary_color: None,
                    accent_color: None,
                    logo: Some(png("logo.png")),
                },
                Deadline::upload(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Blob(_)));
        assert!(DraftStore::find(&ctx.db, user.id, OnboardingRole::Vendor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_details_saved_with_logo_url() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let onboarding = ctx.onboarding();

        let saved = onboarding
            .save_store_details(
                user.id,
                StoreDetailsForm {
                    store_name: Some("Ada's".to_string()),
                    store_description: Some("Handmade things".to_string()),
                    primary_color: Some("#112233".to_string()),
                    accent_color: None,
                    logo: Some(png("logo.png")),
                },
                Deadline::upload(),
            )
            .await
            .unwrap();

        assert_eq!(saved.version, 1);
        let logo = saved.data["storeDetails"]["storeLogo"].as_str().unwrap();
        assert!(logo.contains(STORE_LOGO_FOLDER));
        assert_eq!(saved.data["storeDetails"]["primaryColor"], "#112233");
    }
}
