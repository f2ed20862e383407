use serde::Serialize;

/// Enveloppe commune à toutes les réponses JSON de l'API
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success("ok", vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "ok", "data": [1, 2]}));
    }

    #[test]
    fn test_message_only_envelope() {
        let json = serde_json::to_value(ApiResponse::<()>::message("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));
    }
}
