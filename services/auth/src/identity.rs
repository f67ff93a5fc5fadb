//! Client for the managed user pool
//!
//! Speaks the Cognito Identity Provider JSON protocol directly. Only the
//! public, client-id authenticated operations are used, so no AWS request
//! signing is involved.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, info, warn};

use common::token::IdentityPoolConfig;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Error categories reported by the user pool, matched by their exception name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolErrorKind {
    NotAuthorized,
    UserNotConfirmed,
    UserNotFound,
    UsernameExists,
    InvalidPassword,
    InvalidParameter,
    CodeMismatch,
    ExpiredCode,
    TooManyRequests,
    Other(String),
}

impl PoolErrorKind {
    /// Classify an exception name such as `NotAuthorizedException`
    ///
    /// Fully qualified names (`com.amazonaws...#NotAuthorizedException`) are
    /// accepted too.
    pub fn from_type(error_type: &str) -> Self {
        let name = error_type
            .rsplit_once('#')
            .map(|(_, name)| name)
            .unwrap_or(error_type);
        let name = name.split(':').next().unwrap_or(name);

        match name {
            "NotAuthorizedException" => PoolErrorKind::NotAuthorized,
            "UserNotConfirmedException" => PoolErrorKind::UserNotConfirmed,
            "UserNotFoundException" => PoolErrorKind::UserNotFound,
            "UsernameExistsException" => PoolErrorKind::UsernameExists,
            "InvalidPasswordException" => PoolErrorKind::InvalidPassword,
            "InvalidParameterException" => PoolErrorKind::InvalidParameter,
            "CodeMismatchException" => PoolErrorKind::CodeMismatch,
            "ExpiredCodeException" => PoolErrorKind::ExpiredCode,
            "LimitExceededException"
            | "TooManyRequestsException"
            | "TooManyFailedAttemptsException" => PoolErrorKind::TooManyRequests,
            other => PoolErrorKind::Other(other.to_string()),
        }
    }
}

/// Errors raised while talking to the user pool
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The pool rejected the request
    #[error("User pool rejected request: {kind:?}: {message}")]
    Pool { kind: PoolErrorKind, message: String },

    /// The pool could not be reached
    #[error("User pool unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The pool answered with something unexpected
    #[error("Unexpected user pool response: {0}")]
    UnexpectedResponse(String),
}

impl IdentityError {
    pub fn kind(&self) -> Option<&PoolErrorKind> {
        match self {
            IdentityError::Pool { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct PoolErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Where a confirmation code was sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeDeliveryDetails {
    pub destination: Option<String>,
    pub delivery_medium: Option<String>,
    pub attribute_name: Option<String>,
}

/// Result of a pool sign-up
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignUpOutput {
    pub user_confirmed: bool,
    pub user_sub: Option<String>,
    pub code_delivery_details: Option<CodeDeliveryDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResendCodeOutput {
    code_delivery_details: Option<CodeDeliveryDetails>,
}

/// Tokens issued by the pool
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub id_token: String,
    pub access_token: String,
    /// Absent when refreshing
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub token_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthOutput {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
    session: Option<String>,
}

/// Outcome of a sign-in attempt
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// Credentials accepted, tokens issued
    Authenticated(AuthenticationResult),
    /// The pool requires another step (new password, MFA, ...)
    Challenge {
        name: String,
        session: Option<String>,
    },
}

/// Client for the user pool API
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl IdentityClient {
    pub fn new(config: &IdentityPoolConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint(),
            client_id: config.client_id.clone(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<T, IdentityError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let error_type_header = response
            .headers()
            .get("x-amzn-ErrorType")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if status.is_success() {
            // Operations without output answer with an empty body.
            let payload: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
            return serde_json::from_slice(payload).map_err(|e| {
                error!("Failed to decode {} response: {}", operation, e);
                IdentityError::UnexpectedResponse(e.to_string())
            });
        }

        Err(parse_pool_error(status, error_type_header, &bytes))
    }

    /// Register a new account; the pool emails a confirmation code
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, IdentityError> {
        info!("Signing up {}", email);
        self.call(
            "SignUp",
            json!({
                "ClientId": self.client_id,
                "Username": email,
                "Password": password,
                "UserAttributes": [{ "Name": "email", "Value": email }],
            }),
        )
        .await
    }

    /// Confirm an account with the emailed code
    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        info!("Confirming sign-up for {}", email);
        let _: serde_json::Value = self
            .call(
                "ConfirmSignUp",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "ConfirmationCode": code,
                }),
            )
            .await?;
        Ok(())
    }

    /// Send a fresh confirmation code
    pub async fn resend_confirmation_code(
        &self,
        email: &str,
    ) -> Result<Option<CodeDeliveryDetails>, IdentityError> {
        info!("Resending confirmation code to {}", email);
        let output: ResendCodeOutput = self
            .call(
                "ResendConfirmationCode",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                }),
            )
            .await?;
        Ok(output.code_delivery_details)
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthOutcome, IdentityError> {
        let mut parameters = HashMap::new();
        parameters.insert("USERNAME", email);
        parameters.insert("PASSWORD", password);
        self.initiate_auth("USER_PASSWORD_AUTH", parameters).await
    }

    /// Exchange a refresh token for fresh ID and access tokens
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, IdentityError> {
        let mut parameters = HashMap::new();
        parameters.insert("REFRESH_TOKEN", refresh_token);
        self.initiate_auth("REFRESH_TOKEN_AUTH", parameters).await
    }

    async fn initiate_auth(
        &self,
        flow: &str,
        parameters: HashMap<&str, &str>,
    ) -> Result<AuthOutcome, IdentityError> {
        let output: InitiateAuthOutput = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": flow,
                    "ClientId": self.client_id,
                    "AuthParameters": parameters,
                }),
            )
            .await?;

        interpret_initiate_auth(output)
    }

    /// Invalidate every refresh token issued to the access token's user
    pub async fn global_sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let _: serde_json::Value = self
            .call("GlobalSignOut", json!({ "AccessToken": access_token }))
            .await?;
        Ok(())
    }
}

fn interpret_initiate_auth(output: InitiateAuthOutput) -> Result<AuthOutcome, IdentityError> {
    if let Some(result) = output.authentication_result {
        return Ok(AuthOutcome::Authenticated(result));
    }

    match output.challenge_name {
        Some(name) => Ok(AuthOutcome::Challenge {
            name,
            session: output.session,
        }),
        None => Err(IdentityError::UnexpectedResponse(
            "neither tokens nor a challenge were returned".to_string(),
        )),
    }
}

fn parse_pool_error(
    status: reqwest::StatusCode,
    error_type_header: Option<String>,
    body: &[u8],
) -> IdentityError {
    let parsed: Option<PoolErrorBody> = serde_json::from_slice(body).ok();
    let (body_type, message) = match parsed {
        Some(body) => (body.error_type, body.message),
        None => (None, None),
    };

    match body_type.or(error_type_header) {
        Some(error_type) => {
            let kind = PoolErrorKind::from_type(&error_type);
            warn!("User pool returned {} ({:?})", status, kind);
            IdentityError::Pool {
                kind,
                message: message.unwrap_or_default(),
            }
        }
        None => IdentityError::UnexpectedResponse(format!(
            "status {} without an error type",
            status
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_kind_from_type() {
        assert_eq!(
            PoolErrorKind::from_type("NotAuthorizedException"),
            PoolErrorKind::NotAuthorized
        );
        assert_eq!(
            PoolErrorKind::from_type(
                "com.amazonaws.cognito.identity.idp.model#UsernameExistsException"
            ),
            PoolErrorKind::UsernameExists
        );
        assert_eq!(
            PoolErrorKind::from_type("CodeMismatchException:http://internal.amazon.com/"),
            PoolErrorKind::CodeMismatch
        );
        assert_eq!(
            PoolErrorKind::from_type("LimitExceededException"),
            PoolErrorKind::TooManyRequests
        );
        assert_eq!(
            PoolErrorKind::from_type("InternalErrorException"),
            PoolErrorKind::Other("InternalErrorException".to_string())
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = br#"{"__type":"UserNotConfirmedException","message":"User is not confirmed."}"#;
        let error = parse_pool_error(StatusCode::BAD_REQUEST, None, body);
        match error {
            IdentityError::Pool { kind, message } => {
                assert_eq!(kind, PoolErrorKind::UserNotConfirmed);
                assert_eq!(message, "User is not confirmed.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_header_fallback() {
        let error = parse_pool_error(
            StatusCode::BAD_REQUEST,
            Some("ExpiredCodeException".to_string()),
            b"",
        );
        assert_eq!(error.kind(), Some(&PoolErrorKind::ExpiredCode));
    }

    #[test]
    fn test_parse_error_without_type() {
        let error = parse_pool_error(StatusCode::BAD_GATEWAY, None, b"<html>");
        assert!(matches!(error, IdentityError::UnexpectedResponse(_)));
        assert_eq!(error.kind(), None);
    }

    #[test]
    fn test_decode_sign_up_output() {
        let output: SignUpOutput = serde_json::from_str(
            r#"{
                "UserConfirmed": false,
                "UserSub": "1234",
                "CodeDeliveryDetails": {
                    "Destination": "v***@e***.com",
                    "DeliveryMedium": "EMAIL",
                    "AttributeName": "email"
                }
            }"#,
        )
        .unwrap();
        assert!(!output.user_confirmed);
        let delivery = output.code_delivery_details.unwrap();
        assert_eq!(delivery.destination.as_deref(), Some("v***@e***.com"));
    }

    #[test]
    fn test_interpret_tokens() {
        let output: InitiateAuthOutput = serde_json::from_str(
            r#"{
                "AuthenticationResult": {
                    "IdToken": "id",
                    "AccessToken": "access",
                    "RefreshToken": "refresh",
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                },
                "ChallengeParameters": {}
            }"#,
        )
        .unwrap();
        match interpret_initiate_auth(output).unwrap() {
            AuthOutcome::Authenticated(result) => {
                assert_eq!(result.id_token, "id");
                assert_eq!(result.refresh_token.as_deref(), Some("refresh"));
                assert_eq!(result.expires_in, 3600);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_challenge() {
        let output: InitiateAuthOutput = serde_json::from_str(
            r#"{"ChallengeName": "NEW_PASSWORD_REQUIRED", "Session": "abc", "ChallengeParameters": {}}"#,
        )
        .unwrap();
        assert!(matches!(
            interpret_initiate_auth(output).unwrap(),
            AuthOutcome::Challenge { name, .. } if name == "NEW_PASSWORD_REQUIRED"
        ));
    }

    #[test]
    fn test_interpret_empty_output() {
        let output: InitiateAuthOutput = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            interpret_initiate_auth(output),
            Err(IdentityError::UnexpectedResponse(_))
        ));
    }
}
