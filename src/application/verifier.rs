use crate::domain::payment::{SignedPayment, VerificationReceipt, VerifyRequest};
use crate::domain::ports::PaymentBackendRef;
use crate::domain::registration::PaymentStatus;
use crate::error::{PaymentError, Result};
use tracing::{info, warn};

pub const VERIFICATION_FAILED_MESSAGE: &str = "Payment verification failed. Please try again.";

/// Sends the gateway's signed result to the backend for a signature check.
///
/// A passing check only means the callback was not forged. Whether the
/// registration is paid is decided by the webhook, see `ConfirmationPoller`.
#[derive(Clone)]
pub struct PaymentVerifier {
    backend: PaymentBackendRef,
}

impl PaymentVerifier {
    pub fn new(backend: PaymentBackendRef) -> Self {
        Self { backend }
    }

    /// Verifies once. Errors are never retried here.
    pub async fn verify(
        &self,
        payment: SignedPayment,
        registration_id: &str,
    ) -> Result<VerificationReceipt> {
        let order_id = payment.order_id.clone();
        let request = VerifyRequest {
            payment,
            registration_id: registration_id.to_string(),
        };

        let receipt = self.backend.verify_payment(&request).await?;

        if receipt.payment_status == PaymentStatus::Failed {
            warn!(registration_id, %order_id, "backend rejected payment signature");
            return Err(PaymentError::Verification {
                message: VERIFICATION_FAILED_MESSAGE.to_string(),
            });
        }
        if !receipt.registration_id.is_empty() && receipt.registration_id != registration_id {
            warn!(
                registration_id,
                reported = %receipt.registration_id,
                "verification receipt is for another registration"
            );
            return Err(PaymentError::Verification {
                message: VERIFICATION_FAILED_MESSAGE.to_string(),
            });
        }

        info!(registration_id, %order_id, status = %receipt.payment_status, "payment signature verified");
        Ok(receipt)
    }
}
