use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{DraftQuery, DraftSubmission};
use crate::models::onboarding::{InterestsStep, PreferencesStep};
use crate::routes::seller;
use crate::services::onboarding_service::{OnboardingService, ProfileForm};
use crate::utils::deadline::Deadline;
use crate::utils::multipart::FormData;
use crate::utils::response::ApiResponse;

/// POST /api/v1/onboarding/interests - Centres d'intérêt du client (PROTÉGÉ)
#[post("/interests")]
pub async fn update_interests(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    body: web::Json<InterestsStep>,
) -> Result<HttpResponse, AppError> {
    let saved = onboarding
        .update_interests(user.user_id, body.into_inner(), Deadline::standard())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Interests updated successfully", saved)))
}

/// POST /api/v1/onboarding/preferences - Préférences d'achat (PROTÉGÉ)
#[post("/preferences")]
pub async fn update_preferences(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    body: web::Json<PreferencesStep>,
) -> Result<HttpResponse, AppError> {
    let saved = onboarding
        .update_preferences(user.user_id, body.into_inner(), Deadline::standard())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("User preference updated successfully", saved)))
}

const PROFILE_FIELDS: &[&str] = &["location", "bio", "profile_picture"];

/// POST /api/v1/onboarding/complete - Étape finale client, multipart (PROTÉGÉ)
/// Champs: location, bio, profile_picture (jpeg/png)
#[post("/complete")]
pub async fn complete_profile(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let deadline = Deadline::upload();
    let mut form = FormData::read(payload, PROFILE_FIELDS).await?;
    let profile = ProfileForm {
        location: form.text("location"),
        bio: form.text("bio"),
        picture: form.take_file("profile_picture"),
    };

    let updated = onboarding.complete_profile(user.user_id, profile, deadline).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Onboarding completed successfully", updated)))
}

/// POST /api/v1/onboarding/draft - Enregistrer une étape de brouillon (PROTÉGÉ)
#[post("/draft")]
pub async fn save_draft(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    body: web::Json<DraftSubmission>,
) -> Result<HttpResponse, AppError> {
    let draft = onboarding
        .save_draft(user.user_id, body.into_inner(), Deadline::standard())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Draft saved successfully", draft)))
}

/// GET /api/v1/onboarding/draft?role= - Lire le brouillon (PROTÉGÉ)
#[get("/draft")]
pub async fn get_draft(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    query: web::Query<DraftQuery>,
) -> Result<HttpResponse, AppError> {
    let draft = onboarding
        .get_draft(user.user_id, query.role.as_deref(), Deadline::standard())
        .await?;

    let message = if draft.is_some() {
        "Draft fetched successfully"
    } else {
        "No draft found"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(message, draft)))
}

pub fn onboarding_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/onboarding")
            .service(update_interests)
            .service(update_preferences)
            .service(complete_profile)
            .service(save_draft)
            .service(get_draft)
            .service(web::scope("/seller").configure(seller::seller_routes)),
    );
}

#[cfg(test)]
mod tests {
    use crate::services::blob::PROFILE_FOLDER;
    use crate::test_support::{MultipartBody, TestContext, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    fn draft_body(step: i32, step_data: Value) -> Value {
        json!({"role": "customer", "step": step, "stepCompleted": true, "stepData": step_data})
    }

    #[actix_web::test]
    async fn test_customer_draft_accumulation() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/draft")
            .insert_header(ctx.bearer(&user))
            .set_json(draft_body(1, json!({"interests": {"categories": ["tech", "books"]}})))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["version"], 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/draft")
            .insert_header(ctx.bearer(&user))
            .set_json(draft_body(
                2,
                json!({"preferences": {"budgetRange": "100-500", "shoppingFrequency": "weekly"}}),
            ))
            .to_request();
        let saved: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(saved["data"]["version"], 2);
        assert_eq!(saved["data"]["stepData"]["interests"]["categories"], json!(["tech", "books"]));
        assert_eq!(saved["data"]["stepData"]["preferences"]["budgetRange"], "100-500");

        let req = test::TestRequest::get()
            .uri("/api/v1/onboarding/draft?role=customer")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: Value = test::read_body_json(resp).await;
        assert_eq!(fetched["data"], saved["data"]);
    }

    #[actix_web::test]
    async fn test_get_draft_without_draft() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get()
            .uri("/api/v1/onboarding/draft?role=vendor")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "No draft found");
        assert!(body["data"].is_null());
    }

    #[actix_web::test]
    async fn test_onboarding_requires_token() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/interests")
            .insert_header(("Authorization", "Bearer garbage"))
            .set_json(json!({"categories": ["tech"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid or missing token");
    }

    #[actix_web::test]
    async fn test_interests_limit() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/interests")
            .insert_header(ctx.bearer(&user))
            .set_json(json!({"categories": ["a", "b", "c", "d"]}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/interests")
            .insert_header(ctx.bearer(&user))
            .set_json(json!({"categories": ["tech"]}))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["interests"]["categories"], json!(["tech"]));
        assert_eq!(body["data"]["version"], 1);
    }

    #[actix_web::test]
    async fn test_complete_profile_multipart() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let app = test_app!(ctx);

        let form = MultipartBody::new()
            .text("location", "Lagos")
            .text("bio", "Hello")
            .file("profile_picture", "me.png", "image/png", b"\x89PNG\r\n\x1a\n");
        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/complete")
            .insert_header(ctx.bearer(&user))
            .insert_header(("Content-Type", form.content_type()))
            .set_payload(form.finish())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["onboardingCompleted"], true);

        // l'état est visible via /auth/me
        let req = test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let me: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(me["data"]["onboardingCompleted"], true);
        assert!(
            me["data"]["profile"]["profileImageUrl"]
                .as_str()
                .unwrap()
                .contains(PROFILE_FOLDER)
        );
    }

    #[actix_web::test]
    async fn test_complete_profile_missing_picture() {
        let ctx = TestContext::new().await;
        let user = ctx.seed_user("a@b.co", "secret1", true).await;
        let app = test_app!(ctx);

        let form = MultipartBody::new().text("location", "Lagos").text("bio", "Hello");
        let req = test::TestRequest::post()
            .uri("/api/v1/onboarding/complete")
            .insert_header(ctx.bearer(&user))
            .insert_header(("Content-Type", form.content_type()))
            .set_payload(form.finish())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Profile picture is required");
        assert!(ctx.blobs.uploads().is_empty());
    }
}
