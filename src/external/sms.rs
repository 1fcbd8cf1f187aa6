use crate::config::SmsConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;

#[derive(Clone)]
pub struct SmsService {
    client: Client,
    config: SmsConfig,
}

impl SmsService {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Without credentials delivery degrades to log-only; the code stays
    /// valid and consumable either way.
    pub async fn send_verification_code(&self, phone: &str, code: &str) -> AppResult<()> {
        let body = format!("Your verification code is {code}. It is valid for 5 minutes.");

        if self.config.api_key.is_empty() || self.config.base_url.is_empty() {
            log::info!("SMS credentials not configured, log-only delivery to {phone}: {body}");
            return Ok(());
        }

        let params = [
            ("to", phone),
            ("sender", self.config.sender_id.as_str()),
            ("message", &body),
        ];

        let response = self
            .client
            .post(&self.config.base_url)
            .header("authkey", &self.config.api_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("SMS request failed: {e}")))?;

        if response.status().is_success() {
            log::info!("Verification code SMS sent successfully: {phone}");
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Verification code SMS failed to send: {phone}, Error: {error_text}");
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {error_text}"
            )))
        }
    }
}
