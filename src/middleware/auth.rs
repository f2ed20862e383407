use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::{Ready, ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::jwt::TokenService;

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

/// Implémentation de FromRequest pour AuthUser
/// Token absent, mal formé, expiré ou mal signé => 403 "Invalid or missing token"
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    // 1. Service de tokens enregistré dans l'App
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::Internal("TokenService is not registered".to_string()))?;

    // 2. Header Authorization: "Bearer <token>"
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(AppError::forbidden_token)?;

    // 3. Vérification du JWT
    let claims = tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::forbidden_token()
    })?;

    // 4. Identifiant utilisateur
    let user_id = Uuid::parse_str(&claims.user_id).map_err(|_| AppError::forbidden_token())?;

    Ok(AuthUser {
        user_id,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::AccountRole;
    use actix_web::test::TestRequest;
    use chrono::Duration;
    use secrecy::SecretString;

    fn tokens() -> web::Data<TokenService> {
        web::Data::new(TokenService::new(&SecretString::from("test-secret"), Duration::hours(1)))
    }

    #[actix_web::test]
    async fn test_valid_bearer_token() {
        let tokens = tokens();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, &AccountRole::Customer).unwrap();

        let req = TestRequest::default()
            .app_data(tokens.clone())
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();

        let user = authenticate(&req).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, "customer");
    }

    #[actix_web::test]
    async fn test_missing_or_bad_tokens_are_forbidden() {
        let tokens = tokens();
        let expired = tokens
            .issue_for(Uuid::new_v4(), &AccountRole::Customer, Duration::hours(-2))
            .unwrap();

        let headers = [
            None,
            Some("Token abc".to_string()),
            Some("Bearer ".to_string()),
            Some("Bearer not.a.jwt".to_string()),
            Some(format!("Bearer {expired}")),
        ];
        for value in headers {
            let mut req = TestRequest::default().app_data(tokens.clone());
            if let Some(value) = &value {
                req = req.insert_header((header::AUTHORIZATION, value.clone()));
            }
            let err = authenticate(&req.to_http_request()).unwrap_err();
            assert_eq!(err.to_string(), "Invalid or missing token", "header {value:?}");
        }
    }
}
