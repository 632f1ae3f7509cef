//! Wire types for the remote resource provider.
//!
//! Every endpoint responds with the same JSON envelope
//! `{statusCode, message, data}`. Auth endpoints exchange the credential
//! payloads defined here.

use serde::{Deserialize, Serialize};

/// The provider's uniform response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Take the payload, or surface the envelope's message when absent.
    pub fn into_data(self) -> Result<T, String> {
        self.data.ok_or(self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Body of the dedicated credential-refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh endpoint response: a new credential triple. `expires_in` is
/// seconds from now, per the provider contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Login/signup response payload: credentials plus the user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_camel_case_fields() {
        let json = r#"{"statusCode": 200, "message": "ok", "data": {"value": 1}}"#;
        let env: ApiEnvelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(env.status_code, 200);
        assert_eq!(env.into_data().unwrap()["value"], 1);
    }

    #[test]
    fn test_envelope_missing_data_yields_message() {
        let json = r#"{"statusCode": 404, "message": "not found"}"#;
        let env: ApiEnvelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(env.into_data().unwrap_err(), "not found");
    }

    #[test]
    fn test_refresh_request_wire_shape() {
        let req = RefreshRequest {
            refresh_token: "r-1".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"refreshToken": "r-1"}));
    }

    #[test]
    fn test_refresh_response_parses_triple() {
        let json = r#"{"accessToken": "a-2", "refreshToken": "r-2", "expiresIn": 900}"#;
        let resp: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "a-2");
        assert_eq!(resp.expires_in, Some(900));
    }
}
