use super::checkout::CheckoutInitiator;
use super::gateway::GatewayAdapter;
use super::poller::ConfirmationPoller;
use super::session::SessionContext;
use super::verifier::PaymentVerifier;
use crate::domain::payment::{GatewayOutcome, PaymentPhase, Prefill};
use crate::domain::ports::{PaymentBackendRef, SessionStoreRef};
use crate::domain::registration::{NewRegistration, PaymentStatus, Registration};
use crate::error::{PaymentError, Result};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed. Please try again.";
pub const NO_REGISTRATION_MESSAGE: &str = "No registration in progress. Please register first.";

/// Drives one participant from registration to a settled payment.
///
/// An attempt runs strictly in order: create order, open checkout, verify the
/// signed result, poll until the webhook settles it. Entry points take
/// `&mut self`, so a new attempt cannot start while a checkout is still open.
/// Every entry point returns the phase it ended in; errors end in
/// `PaymentPhase::Failed` with a message fit for the participant.
///
/// Dropping a running entry point future stops its status poll.
pub struct PaymentFlow {
    backend: PaymentBackendRef,
    initiator: CheckoutInitiator,
    gateway: GatewayAdapter,
    verifier: PaymentVerifier,
    poller: ConfirmationPoller,
    store: SessionStoreRef,
    session: Option<SessionContext>,
    settled: Option<String>,
    dismissed: Option<String>,
    phase: watch::Sender<PaymentPhase>,
}

impl PaymentFlow {
    pub fn new(
        backend: PaymentBackendRef,
        gateway: GatewayAdapter,
        session: SessionContext,
        categories: Vec<String>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (phase, _) = watch::channel(PaymentPhase::Ready);
        Ok(Self {
            initiator: CheckoutInitiator::new(backend.clone(), categories),
            verifier: PaymentVerifier::new(backend.clone()),
            poller: ConfirmationPoller::new(backend.clone(), poll_interval)?,
            backend,
            gateway,
            store: session.store(),
            session: Some(session),
            settled: None,
            dismissed: None,
            phase,
        })
    }

    pub fn phase(&self) -> PaymentPhase {
        self.phase.borrow().clone()
    }

    /// Phase changes as they happen, for rendering.
    pub fn phases(&self) -> watch::Receiver<PaymentPhase> {
        self.phase.subscribe()
    }

    /// The cached registration, until the payment is confirmed.
    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    /// Creates the registration, caches it, then runs a payment attempt.
    pub async fn register(&mut self, registration: NewRegistration) -> PaymentPhase {
        self.begin(None);
        let result = async {
            let created = self.create_registration(registration).await?;
            let coupon = created.coupon_code.clone();
            self.run_attempt(&created, coupon.as_deref()).await
        }
        .await;
        self.finish(result)
    }

    /// Runs a new attempt for the cached registration.
    ///
    /// Goes through the same status check as `retry`, reusing the cached
    /// snapshot. Only a checkout this flow saw dismissed is reopened straight
    /// away: nothing was paid for it.
    pub async fn checkout(&mut self, coupon_code: Option<&str>) -> PaymentPhase {
        let cached = self.session.as_ref().and_then(|s| {
            s.snapshot()
                .cloned()
                .map(Ok)
                .or_else(|| s.registration_id().map(|id| Err(id.to_string())))
        });

        match cached {
            Some(Ok(registration))
                if self.dismissed.as_deref() == Some(registration.id.as_str()) =>
            {
                if let Some(phase) = self.begin(Some(&registration.id)) {
                    return phase;
                }
                let result = self.run_attempt(&registration, coupon_code).await;
                self.finish(result)
            }
            Some(Ok(registration)) => {
                let registration_id = registration.id.clone();
                self.resume(&registration_id, Some(registration), coupon_code)
                    .await
            }
            Some(Err(registration_id)) => self.resume(&registration_id, None, coupon_code).await,
            None => {
                self.begin(None);
                self.fail(PaymentError::ValidationError(
                    NO_REGISTRATION_MESSAGE.to_string(),
                ))
            }
        }
    }

    /// Re-enters the flow for a registration left pending or failed.
    ///
    /// The authoritative status is checked first: an already paid registration
    /// goes straight to `Paid` without creating an order.
    pub async fn retry(&mut self, registration_id: &str, coupon_code: Option<&str>) -> PaymentPhase {
        self.resume(registration_id, None, coupon_code).await
    }

    /// Status check, then a new attempt. `cached` saves the registration fetch.
    async fn resume(
        &mut self,
        registration_id: &str,
        cached: Option<Registration>,
        coupon_code: Option<&str>,
    ) -> PaymentPhase {
        if let Some(phase) = self.begin(Some(registration_id)) {
            return phase;
        }
        let result = async {
            self.transition(PaymentPhase::Processing);
            if self.backend.payment_status(registration_id).await? == PaymentStatus::Paid {
                info!(registration_id, "registration already paid, skipping checkout");
                return self.settle(registration_id).await;
            }
            let registration = match cached {
                Some(registration) => registration,
                None => {
                    let registration = self.backend.fetch_registration(registration_id).await?;
                    self.remember(&registration).await?;
                    registration
                }
            };
            self.run_attempt(&registration, coupon_code).await
        }
        .await;
        self.finish(result)
    }

    async fn create_registration(&mut self, mut registration: NewRegistration) -> Result<Registration> {
        registration.participant.validate()?;
        let category = self.initiator.category(&registration.participant.race_category)?;
        registration.participant.race_category = category.as_str().to_string();
        registration.coupon_code = registration
            .coupon_code
            .take()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        self.transition(PaymentPhase::Processing);
        let created = self.backend.create_registration(&registration).await?;
        info!(registration_id = %created.id, category = %category, "registration created");
        self.remember(&created).await?;
        Ok(created)
    }

    async fn run_attempt(
        &mut self,
        registration: &Registration,
        coupon_code: Option<&str>,
    ) -> Result<PaymentPhase> {
        self.dismissed = None;
        self.transition(PaymentPhase::Processing);
        let order = self
            .initiator
            .create_order(
                &registration.participant.race_category,
                &registration.id,
                coupon_code,
            )
            .await?;

        let payment = match self.gateway.open(&order, Prefill::from(registration)).await {
            GatewayOutcome::Completed(payment) => payment,
            GatewayOutcome::Dismissed => {
                self.dismissed = Some(registration.id.clone());
                return Ok(self.transition(PaymentPhase::Ready));
            }
            GatewayOutcome::Failed(err) => return Err(err),
        };

        self.verifier.verify(payment, &registration.id).await?;
        self.transition(PaymentPhase::Verifying);

        let poll = self.poller.start(registration.id.clone());
        match poll.settled().await? {
            PaymentStatus::Paid => self.settle(&registration.id).await,
            status => {
                error!(registration_id = %registration.id, %status, "payment not confirmed");
                Ok(self.transition(PaymentPhase::Failed {
                    message: PAYMENT_FAILED_MESSAGE.to_string(),
                }))
            }
        }
    }

    async fn remember(&mut self, registration: &Registration) -> Result<()> {
        let store = self.store.clone();
        self.session
            .get_or_insert_with(|| SessionContext::new(store))
            .remember(registration)
            .await
    }

    /// Marks the registration paid and drops its cached copy. A session
    /// cached for another registration is left alone.
    async fn settle(&mut self, registration_id: &str) -> Result<PaymentPhase> {
        let phase = self.transition(PaymentPhase::Paid);
        self.settled = Some(registration_id.to_string());
        let owned = self
            .session
            .as_ref()
            .is_some_and(|session| session.registration_id() == Some(registration_id));
        if owned && let Some(session) = self.session.take() {
            session.close().await?;
        }
        Ok(phase)
    }

    /// Starts a journey. Returns `Paid` if `registration_id` was already
    /// confirmed by this flow.
    fn begin(&mut self, registration_id: Option<&str>) -> Option<PaymentPhase> {
        if let (Some(settled), Some(id)) = (self.settled.as_deref(), registration_id)
            && settled == id
        {
            return Some(PaymentPhase::Paid);
        }
        self.settled = None;
        self.phase.send_replace(PaymentPhase::Ready);
        None
    }

    fn finish(&self, result: Result<PaymentPhase>) -> PaymentPhase {
        match result {
            Ok(phase) => phase,
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: PaymentError) -> PaymentPhase {
        error!(error = %err, "payment attempt failed");
        self.transition(PaymentPhase::Failed {
            message: err.user_message(),
        })
    }

    fn transition(&self, next: PaymentPhase) -> PaymentPhase {
        let current = self.phase.borrow().clone();
        if current == PaymentPhase::Paid {
            if next != PaymentPhase::Paid {
                warn!(%next, "ignoring phase change after payment was confirmed");
            }
            return current;
        }
        if current != next {
            info!(from = %current, to = %next, "payment phase changed");
        }
        self.phase.send_replace(next.clone());
        next
    }
}
