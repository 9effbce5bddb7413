//! One-time code verification through an external provider.
//!
//! [`VerificationProvider`] is the seam to the SMS service. The HTTP
//! implementation speaks the Twilio Verify form API; [`Unconfigured`] is
//! used when no credentials were supplied and rejects every call with
//! [`VerificationError::NotConfigured`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{OneTimeCode, PhoneNumber, VerificationError};

/// Provider error code for "max check attempts reached".
const MAX_ATTEMPTS_CODE: u32 = 60202;
/// Provider error code for "max send attempts reached".
const MAX_SENDS_CODE: u32 = 60203;

#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Sends a fresh code to `phone`.
    async fn send_code(&self, phone: &PhoneNumber) -> Result<(), VerificationError>;

    /// Checks `code` for `phone`; `Ok(())` means approved.
    async fn check_code(
        &self,
        phone: &PhoneNumber,
        code: &OneTimeCode,
    ) -> Result<(), VerificationError>;
}

/// Provider used when verification is not configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconfigured;

#[async_trait]
impl VerificationProvider for Unconfigured {
    async fn send_code(&self, _phone: &PhoneNumber) -> Result<(), VerificationError> {
        Err(VerificationError::NotConfigured)
    }

    async fn check_code(
        &self,
        _phone: &PhoneNumber,
        _code: &OneTimeCode,
    ) -> Result<(), VerificationError> {
        Err(VerificationError::NotConfigured)
    }
}

/// Credentials and endpoint of the HTTP provider.
#[derive(Clone, Debug)]
pub struct HttpProviderConfig {
    pub base_url: String,
    pub service_sid: String,
    pub account_sid: String,
    pub auth_token: String,
}

#[derive(Clone, Debug)]
pub struct HttpVerificationProvider {
    client: Client,
    config: HttpProviderConfig,
}

#[derive(Debug, Deserialize)]
struct CheckBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u32>,
    message: Option<String>,
}

impl HttpVerificationProvider {
    pub fn new(client: Client, config: HttpProviderConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v2/Services/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.service_sid,
            path.trim_start_matches('/')
        )
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, VerificationError> {
        self.client
            .post(self.url(path))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|err| VerificationError::Transient(err.to_string()))
    }
}

/// Maps a non-success provider response to a [`VerificationError`].
async fn classify_failure(resp: reqwest::Response) -> VerificationError {
    let status = resp.status();
    let body = resp.json::<ErrorBody>().await.ok();
    let code = body.as_ref().and_then(|b| b.code);
    let message = body
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.to_string());

    match (status, code) {
        (StatusCode::TOO_MANY_REQUESTS, _) => VerificationError::TooManyAttempts,
        (_, Some(MAX_ATTEMPTS_CODE | MAX_SENDS_CODE)) => VerificationError::TooManyAttempts,
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            tracing::error!("verification provider rejected credentials: {message}");
            VerificationError::NotConfigured
        }
        // An expired or already consumed verification is reported as missing.
        (StatusCode::NOT_FOUND, _) => VerificationError::IncorrectCode,
        (s, _) if s.is_server_error() => VerificationError::Transient(message),
        _ => VerificationError::InvalidRecipient(message),
    }
}

#[async_trait]
impl VerificationProvider for HttpVerificationProvider {
    async fn send_code(&self, phone: &PhoneNumber) -> Result<(), VerificationError> {
        let resp = self
            .post_form("Verifications", &[("To", phone.as_str()), ("Channel", "sms")])
            .await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(classify_failure(resp).await)
    }

    async fn check_code(
        &self,
        phone: &PhoneNumber,
        code: &OneTimeCode,
    ) -> Result<(), VerificationError> {
        let resp = self
            .post_form(
                "VerificationCheck",
                &[("To", phone.as_str()), ("Code", code.as_str())],
            )
            .await?;
        if !resp.status().is_success() {
            return Err(classify_failure(resp).await);
        }

        let body = resp
            .json::<CheckBody>()
            .await
            .map_err(|err| VerificationError::Transient(err.to_string()))?;
        match body.status.as_str() {
            "approved" => Ok(()),
            "max_attempts_reached" => Err(VerificationError::TooManyAttempts),
            // `pending` means the code did not match.
            _ => Err(VerificationError::IncorrectCode),
        }
    }
}
