use crate::domain::ports::PaymentBackendRef;
use crate::domain::registration::PaymentStatus;
use crate::error::{PaymentError, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polls the status endpoint until the webhook has settled the registration.
///
/// Polling never times out and never gives up on errors: only a `paid` or
/// `failed` report ends it, or dropping the returned `PollHandle`.
#[derive(Clone)]
pub struct ConfirmationPoller {
    backend: PaymentBackendRef,
    interval: Duration,
}

impl ConfirmationPoller {
    pub fn new(backend: PaymentBackendRef, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(PaymentError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { backend, interval })
    }

    /// Starts polling on a background task. The first check runs immediately.
    pub fn start(&self, registration_id: impl Into<String>) -> PollHandle {
        let (status_tx, status_rx) = watch::channel(PaymentStatus::Pending);
        let task = tokio::spawn(poll_until_settled(
            self.backend.clone(),
            registration_id.into(),
            self.interval,
            status_tx,
        ));
        PollHandle {
            task,
            status: status_rx,
        }
    }
}

async fn poll_until_settled(
    backend: PaymentBackendRef,
    registration_id: String,
    period: Duration,
    status_tx: watch::Sender<PaymentStatus>,
) -> PaymentStatus {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt: u64 = 0;

    loop {
        ticker.tick().await;
        attempt += 1;

        match backend.payment_status(&registration_id).await {
            Ok(PaymentStatus::Pending) => {
                debug!(%registration_id, attempt, "payment still pending");
            }
            Ok(settled) => {
                info!(%registration_id, attempt, status = %settled, "payment settled");
                status_tx.send_replace(settled);
                return settled;
            }
            // Transport trouble says nothing about the payment itself.
            Err(err) => {
                warn!(
                    %registration_id,
                    attempt,
                    transient = err.is_transient(),
                    error = %err,
                    "status check failed, polling continues"
                );
            }
        }
    }
}

/// Owns a running poll. Dropping it stops the poll.
pub struct PollHandle {
    task: JoinHandle<PaymentStatus>,
    status: watch::Receiver<PaymentStatus>,
}

impl PollHandle {
    /// Last status the poll has settled on; `Pending` until it settles.
    pub fn status(&self) -> PaymentStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PaymentStatus> {
        self.status.clone()
    }

    /// Waits for the terminal status.
    pub async fn settled(mut self) -> Result<PaymentStatus> {
        (&mut self.task)
            .await
            .map_err(|err| PaymentError::InternalError(format!("status poll stopped: {err}")))
    }

    /// Stops polling. Equivalent to dropping the handle.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
