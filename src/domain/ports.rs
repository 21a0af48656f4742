use super::order::{Order, OrderRequest};
use super::payment::{CheckoutOptions, SdkEvent, VerificationReceipt, VerifyRequest};
use super::registration::{NewRegistration, PaymentStatus, Registration};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote registration/payment API.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_registration(&self, registration: &NewRegistration) -> Result<Registration>;
    async fn fetch_registration(&self, registration_id: &str) -> Result<Registration>;
    async fn create_order(&self, request: &OrderRequest) -> Result<Order>;
    async fn verify_payment(&self, request: &VerifyRequest) -> Result<VerificationReceipt>;
    /// Must be side-effect free; it is polled.
    async fn payment_status(&self, registration_id: &str) -> Result<PaymentStatus>;
}

/// A loaded checkout SDK, able to open its hosted modal.
#[async_trait]
pub trait CheckoutSdk: Send + Sync {
    async fn open(&self, options: CheckoutOptions) -> Result<SdkEvent>;
}

/// Makes the checkout SDK available. Called at most once per successful load.
#[async_trait]
pub trait SdkLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn CheckoutSdk>>;
}

/// Small key/value cache for the in-progress registration.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type PaymentBackendRef = Arc<dyn PaymentBackend>;
pub type SdkLoaderRef = Arc<dyn SdkLoader>;
pub type SessionStoreRef = Arc<dyn SessionStore>;
