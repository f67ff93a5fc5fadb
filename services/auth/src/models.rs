//! Request and response bodies of the authentication service

use serde::{Deserialize, Serialize};

use crate::identity::{AuthenticationResult, CodeDeliveryDetails};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub agreed_to_terms: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SignOutRequest {
    pub access_token: String,
}

/// What the client should do next
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NextStep {
    /// Enter the code that was emailed
    ConfirmSignUp {
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery: Option<CodeDelivery>,
    },
    /// Answer a pool challenge
    Challenge {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session: Option<String>,
    },
    SignIn,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeDelivery {
    pub destination: Option<String>,
    pub medium: Option<String>,
}

impl From<CodeDeliveryDetails> for CodeDelivery {
    fn from(details: CodeDeliveryDetails) -> Self {
        Self {
            destination: details.destination,
            medium: details.delivery_medium,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user_sub: Option<String>,
    pub next_step: NextStep,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub next_step: NextStep,
}

/// Tokens handed to the client
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id_token: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: u64,
}

impl From<AuthenticationResult> for TokenResponse {
    fn from(result: AuthenticationResult) -> Self {
        Self {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            token_type: result.token_type,
            expires_in: result.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenResponse>,
    pub next_step: NextStep,
}
