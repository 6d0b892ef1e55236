//! Out-of-band delivery of verification codes.
//!
//! The gateway is chosen once at startup: [`TwilioVerifyGateway`] when all
//! Twilio credentials are configured, [`LocalGateway`] otherwise.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::TwilioConfig;

const TWILIO_VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    Sms,
    Local,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Sms => "sms",
            GatewayKind::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendReceipt {
    /// The provider accepted the request; `status` is its own wording.
    Dispatched { status: String },
    /// Nothing left the process.
    NotDispatched,
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    fn kind(&self) -> GatewayKind;

    async fn send_code(&self, phone_number: &str, code: &str) -> Result<SendReceipt>;

    /// `Ok(None)` means the gateway does not check codes itself and the
    /// stored code decides.
    async fn check_code(&self, phone_number: &str, code: &str) -> Result<Option<bool>>;
}

pub fn gateway_from_config(twilio: Option<&TwilioConfig>) -> Result<Arc<dyn SmsGateway>> {
    match twilio {
        Some(config) => {
            tracing::info!("sms delivery enabled via Twilio Verify");
            Ok(Arc::new(TwilioVerifyGateway::new(config.clone())?))
        }
        None => {
            tracing::warn!("Twilio is not configured, verification codes are returned in responses");
            Ok(Arc::new(LocalGateway))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalGateway;

#[async_trait]
impl SmsGateway for LocalGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Local
    }

    async fn send_code(&self, phone_number: &str, _code: &str) -> Result<SendReceipt> {
        tracing::debug!(phone_number, "local gateway: code not dispatched");
        Ok(SendReceipt::NotDispatched)
    }

    async fn check_code(&self, _phone_number: &str, _code: &str) -> Result<Option<bool>> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    status: String,
}

/// Twilio Verify v2. Twilio generates and checks its own code, so the code
/// passed to [`SmsGateway::send_code`] is only used if the caller falls back.
#[derive(Debug, Clone)]
pub struct TwilioVerifyGateway {
    config: TwilioConfig,
    client: Client,
    base_url: String,
}

impl TwilioVerifyGateway {
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building Twilio HTTP client")?;
        Ok(Self {
            config,
            client,
            base_url: TWILIO_VERIFY_BASE_URL.to_string(),
        })
    }

    fn service_url(&self, resource: &str) -> String {
        format!(
            "{}/Services/{}/{}",
            self.base_url, self.config.verify_service_sid, resource
        )
    }

    async fn post_form(&self, resource: &str, form: &[(&str, &str)]) -> Result<VerificationResponse> {
        let response = self
            .client
            .post(self.service_url(resource))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .context("request to Twilio failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Twilio returned {status}: {body}"));
        }

        response
            .json::<VerificationResponse>()
            .await
            .context("parsing Twilio response")
    }
}

#[async_trait]
impl SmsGateway for TwilioVerifyGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Sms
    }

    async fn send_code(&self, phone_number: &str, _code: &str) -> Result<SendReceipt> {
        let verification = self
            .post_form("Verifications", &[("To", phone_number), ("Channel", "sms")])
            .await?;
        Ok(SendReceipt::Dispatched {
            status: verification.status,
        })
    }

    async fn check_code(&self, phone_number: &str, code: &str) -> Result<Option<bool>> {
        let check = self
            .post_form("VerificationCheck", &[("To", phone_number), ("Code", code)])
            .await?;
        Ok(Some(check.status == "approved"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_gateway_never_dispatches_or_checks() {
        let gateway = LocalGateway;
        assert_eq!(gateway.kind(), GatewayKind::Local);
        assert_eq!(
            gateway.send_code("+911234567890", "123456").await.unwrap(),
            SendReceipt::NotDispatched
        );
        assert_eq!(
            gateway.check_code("+911234567890", "123456").await.unwrap(),
            None
        );
    }

    #[test]
    fn gateway_selection_follows_configuration() {
        let local = gateway_from_config(None).unwrap();
        assert_eq!(local.kind(), GatewayKind::Local);

        let twilio = gateway_from_config(Some(&TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            verify_service_sid: "VA123".into(),
        }))
        .unwrap();
        assert_eq!(twilio.kind(), GatewayKind::Sms);
    }

    #[test]
    fn service_urls_target_the_verify_service() {
        let gateway = TwilioVerifyGateway::new(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            verify_service_sid: "VA999".into(),
        })
        .unwrap();
        assert_eq!(
            gateway.service_url("VerificationCheck"),
            "https://verify.twilio.com/v2/Services/VA999/VerificationCheck"
        );
    }
}
