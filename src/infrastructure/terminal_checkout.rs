use crate::domain::payment::{CheckoutOptions, SdkEvent, SignedPayment};
use crate::domain::ports::{CheckoutSdk, SdkLoader};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_CHECKOUT_SCRIPT_URL: &str = "https://checkout.razorpay.com/v1/checkout.js";

/// Loads the gateway checkout for a terminal session.
///
/// Loading means the gateway's checkout script is reachable; the participant
/// then completes the hosted checkout and pastes its result back.
pub struct ScriptLoader {
    http: Client,
    script_url: String,
}

impl ScriptLoader {
    pub fn new(script_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            script_url: script_url.into(),
        })
    }
}

#[async_trait]
impl SdkLoader for ScriptLoader {
    async fn load(&self) -> Result<Arc<dyn CheckoutSdk>> {
        let response = self
            .http
            .get(&self.script_url)
            .send()
            .await
            .map_err(|e| PaymentError::SdkLoad(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PaymentError::SdkLoad(format!(
                "{} answered {status}",
                self.script_url
            )));
        }
        info!(url = %self.script_url, "checkout script available");
        Ok(Arc::new(TerminalCheckout::new(BufReader::new(tokio::io::stdin()))))
    }
}

/// Checkout "modal" on a terminal: shows the order and reads the hosted
/// checkout's result from `input`. A blank line or end of input dismisses.
pub struct TerminalCheckout<R> {
    input: Mutex<R>,
}

impl<R> TerminalCheckout<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

#[async_trait]
impl<R> CheckoutSdk for TerminalCheckout<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn open(&self, options: CheckoutOptions) -> Result<SdkEvent> {
        eprintln!(
            "{}: pay {} {} for order {} ({})",
            options.name, options.amount, options.currency, options.order_id, options.description
        );
        eprintln!("Paying as {} <{}>", options.prefill.name, options.prefill.email);
        eprintln!(
            "Complete the checkout, then paste the result JSON or '<payment id> <signature>'. Leave blank to cancel."
        );

        let mut input = self.input.lock().await;
        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            debug!(order_id = %options.order_id, "checkout input closed");
            return Ok(SdkEvent::ModalDismissed);
        }
        parse_hosted_result(&line, &options.order_id)
    }
}

#[derive(Deserialize)]
struct HostedResult {
    #[serde(alias = "razorpay_order_id", alias = "orderId")]
    order_id: Option<String>,
    #[serde(alias = "razorpay_payment_id", alias = "paymentId")]
    payment_id: String,
    #[serde(alias = "razorpay_signature")]
    signature: String,
}

/// Reads one line of hosted checkout output.
pub fn parse_hosted_result(line: &str, order_id: &str) -> Result<SdkEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(SdkEvent::ModalDismissed);
    }

    let (order, payment_id, signature) = if line.starts_with('{') {
        let hosted: HostedResult = serde_json::from_str(line)?;
        (hosted.order_id, hosted.payment_id, hosted.signature)
    } else {
        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [payment_id, signature] => (None, payment_id.to_string(), signature.to_string()),
            _ => {
                return Err(PaymentError::ValidationError(
                    "Expected the checkout result JSON or '<payment id> <signature>'".to_string(),
                ));
            }
        }
    };

    Ok(SdkEvent::Handler(SignedPayment {
        order_id: order.unwrap_or_else(|| order_id.to_string()),
        payment_id,
        signature,
    }))
}
