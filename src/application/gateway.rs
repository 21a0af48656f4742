use crate::domain::order::Order;
use crate::domain::payment::{CheckoutOptions, GatewayOutcome, Prefill, SdkEvent};
use crate::domain::ports::{CheckoutSdk, SdkLoaderRef};
use crate::error::{PaymentError, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub const DEFAULT_THEME_COLOR: &str = "#F37254";
pub const DEFAULT_MERCHANT_NAME: &str = "Charity Run";

/// Wraps the third-party checkout SDK.
///
/// The loaded SDK lives in a shared `OnceCell`: every clone of the adapter sees
/// the same cell, at most one load is in flight at a time, and a successful
/// load is never repeated. A failed load leaves the cell empty so the next
/// attempt can try again.
///
/// Build one adapter per process and clone it; the binary does this, so the
/// loaded SDK is process-wide. A `PaymentFlow` keeps the adapter it was given
/// for every attempt it runs.
#[derive(Clone)]
pub struct GatewayAdapter {
    loader: SdkLoaderRef,
    sdk: Arc<OnceCell<Arc<dyn CheckoutSdk>>>,
    key: Option<String>,
    merchant_name: String,
    theme_color: String,
}

impl GatewayAdapter {
    pub fn new(loader: SdkLoaderRef, key: Option<String>) -> Self {
        Self {
            loader,
            sdk: Arc::new(OnceCell::new()),
            key,
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            theme_color: DEFAULT_THEME_COLOR.to_string(),
        }
    }

    pub fn with_merchant_name(mut self, name: impl Into<String>) -> Self {
        self.merchant_name = name.into();
        self
    }

    pub fn with_theme_color(mut self, color: impl Into<String>) -> Self {
        self.theme_color = color.into();
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.sdk.initialized()
    }

    /// Loads the SDK, or joins the load already in flight.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn CheckoutSdk>> {
        let sdk = self
            .sdk
            .get_or_try_init(|| async {
                info!("loading checkout sdk");
                self.loader.load().await
            })
            .await?;
        Ok(Arc::clone(sdk))
    }

    /// Opens a checkout session for `order` and waits for the participant.
    ///
    /// There is no timeout: the modal stays open for as long as the
    /// participant keeps it open.
    pub async fn open(&self, order: &Order, prefill: Prefill) -> GatewayOutcome {
        let Some(key) = self.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) else {
            return GatewayOutcome::Failed(PaymentError::Config(
                "payment gateway key is not configured".to_string(),
            ));
        };

        let sdk = match self.ensure_loaded().await {
            Ok(sdk) => sdk,
            Err(err) => {
                warn!(error = %err, "checkout sdk unavailable");
                return GatewayOutcome::Failed(err);
            }
        };

        let options = CheckoutOptions {
            key: key.to_string(),
            amount: order.charged_amount,
            currency: order.currency.clone(),
            order_id: order.order_id.clone(),
            name: self.merchant_name.clone(),
            description: format!("Registration {}", order.registration_id),
            prefill,
            theme_color: self.theme_color.clone(),
        };

        info!(order_id = %order.order_id, amount = %order.charged_amount, "opening checkout");
        match sdk.open(options).await {
            Ok(SdkEvent::Handler(payment)) => GatewayOutcome::Completed(payment),
            Ok(SdkEvent::ModalDismissed) => {
                info!(order_id = %order.order_id, "checkout dismissed");
                GatewayOutcome::Dismissed
            }
            Err(err) => GatewayOutcome::Failed(err),
        }
    }
}
