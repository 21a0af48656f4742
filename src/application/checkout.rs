use crate::domain::order::{Order, OrderRequest};
use crate::domain::ports::PaymentBackendRef;
use crate::domain::registration::RaceCategory;
use crate::error::{PaymentError, Result};
use tracing::{debug, info};

/// Asks the backend to create a gateway order for one payment attempt.
///
/// The charged amount is whatever the backend returns. Nothing here touches
/// local state.
#[derive(Clone)]
pub struct CheckoutInitiator {
    backend: PaymentBackendRef,
    categories: Vec<String>,
}

impl CheckoutInitiator {
    /// Creates a new `CheckoutInitiator`.
    ///
    /// # Arguments
    ///
    /// * `backend` - The remote payment API.
    /// * `categories` - Race categories orders may be created for.
    pub fn new(backend: PaymentBackendRef, categories: Vec<String>) -> Self {
        Self {
            backend,
            categories,
        }
    }

    /// Resolves a raw category name against the configured list.
    pub fn category(&self, raw: &str) -> Result<RaceCategory> {
        RaceCategory::parse(raw, &self.categories)
    }

    /// Creates the order. Backend rejections (already paid, coupon problems,
    /// unknown category) come back as `PaymentError::Backend` with the
    /// backend's message intact.
    pub async fn create_order(
        &self,
        race_category: &str,
        registration_id: &str,
        coupon_code: Option<&str>,
    ) -> Result<Order> {
        let race_category = self.category(race_category)?;
        let registration_id = registration_id.trim();
        if registration_id.is_empty() {
            return Err(PaymentError::ValidationError(
                "Registration id is required to create an order".to_string(),
            ));
        }

        let request = OrderRequest {
            race_category,
            registration_id: registration_id.to_string(),
            coupon_code: coupon_code
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
        };
        debug!(
            registration_id,
            category = %request.race_category,
            with_coupon = request.coupon_code.is_some(),
            "creating order"
        );

        let mut order = self.backend.create_order(&request).await?;
        if order.registration_id.is_empty() {
            order.registration_id = request.registration_id;
        }
        info!(
            registration_id = %order.registration_id,
            order_id = %order.order_id,
            charged = %order.charged_amount,
            currency = %order.currency,
            "order created"
        );
        Ok(order)
    }
}
