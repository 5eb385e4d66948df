// Authentication wire types
// The backend speaks camelCase JSON

use serde::{Deserialize, Serialize};

/// Login request body, same shape for both realms
#[derive(Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response carrying a fresh token pair
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Refresh request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response. The backend may rotate the refresh token; when absent
/// the old one stays valid.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_response_with_rotation() {
        let json = r#"{"token": "new-access", "refreshToken": "rotated"}"#;
        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "new-access");
        assert_eq!(parsed.refresh_token.as_deref(), Some("rotated"));
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let json = r#"{"token": "new-access"}"#;
        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "new-access");
        assert!(parsed.refresh_token.is_none());
    }

    #[test]
    fn test_refresh_request_shape() {
        let body = RefreshRequest {
            refresh_token: "r-1".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["refreshToken"], "r-1");
    }

    #[test]
    fn test_login_response_shape() {
        let json = r#"{"token": "a", "refreshToken": "r"}"#;
        let parsed: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "a");
        assert_eq!(parsed.refresh_token, "r");
    }
}
