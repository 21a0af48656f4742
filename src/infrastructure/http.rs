use crate::domain::order::{Order, OrderRequest};
use crate::domain::payment::{StatusReport, VerificationReceipt, VerifyRequest};
use crate::domain::ports::PaymentBackend;
use crate::domain::registration::{NewRegistration, PaymentStatus, Registration};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const REGISTRATIONS_PATH: &str = "registrations";
pub const CREATE_ORDER_PATH: &str = "payments/create-order";
pub const VERIFY_PATH: &str = "payments/verify";
pub const STATUS_PATH: &str = "payments/status";

/// Response envelope every backend endpoint answers with.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

/// `PaymentBackend` over the backend's JSON REST API.
///
/// All paths are joined onto one configured base URL.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let base = base.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(PaymentError::Config(format!(
                "API base '{base}' must be an http(s) URL"
            )));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "backend response");
        decode(status.as_u16(), &body)
    }
}

/// Unwraps an envelope. Anything but a successful envelope with data becomes
/// `PaymentError::Backend`, carrying the backend's message when it sent one.
fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T> {
    let ok = (200..300).contains(&status);
    match serde_json::from_slice::<Envelope<T>>(body) {
        Ok(Envelope {
            success: true,
            data: Some(data),
            ..
        }) if ok => Ok(data),
        Ok(Envelope { message, .. }) => Err(PaymentError::Backend {
            status: Some(status),
            message,
        }),
        Err(err) if ok => Err(PaymentError::Serialization(err)),
        Err(_) => Err(PaymentError::Backend {
            status: Some(status),
            message: None,
        }),
    }
}

#[async_trait]
impl PaymentBackend for HttpBackend {
    async fn create_registration(&self, registration: &NewRegistration) -> Result<Registration> {
        let response = self
            .http
            .post(self.url(REGISTRATIONS_PATH))
            .json(registration)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn fetch_registration(&self, registration_id: &str) -> Result<Registration> {
        let response = self
            .http
            .get(self.url(&format!("{REGISTRATIONS_PATH}/{registration_id}")))
            .send()
            .await?;
        Self::read(response).await
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order> {
        let response = self
            .http
            .post(self.url(CREATE_ORDER_PATH))
            .json(request)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> Result<VerificationReceipt> {
        let response = self
            .http
            .post(self.url(VERIFY_PATH))
            .json(request)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn payment_status(&self, registration_id: &str) -> Result<PaymentStatus> {
        let response = self
            .http
            .get(self.url(&format!("{STATUS_PATH}/{registration_id}")))
            .send()
            .await?;
        let report: StatusReport = Self::read(response).await?;
        Ok(report.payment_status)
    }
}
