#![allow(dead_code)]

use async_trait::async_trait;
use racepay::application::flow::PaymentFlow;
use racepay::application::gateway::GatewayAdapter;
use racepay::application::session::SessionContext;
use racepay::domain::order::{MinorUnits, Order, OrderRequest};
use racepay::domain::payment::{
    CheckoutOptions, PaymentPhase, SdkEvent, SignedPayment, VerificationReceipt, VerifyRequest,
};
use racepay::domain::ports::{CheckoutSdk, PaymentBackend, SdkLoader};
use racepay::domain::registration::{NewRegistration, Participant, PaymentStatus, Registration};
use racepay::error::{PaymentError, Result};
use racepay::infrastructure::in_memory::InMemorySessionStore;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const CHARGED: u64 = 51_178;

pub fn categories() -> Vec<String> {
    vec!["5k".to_string(), "10k".to_string()]
}

pub fn participant() -> Participant {
    Participant {
        name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        race_category: "5k".to_string(),
        shirt_size: "M".to_string(),
    }
}

pub fn registration(id: &str, status: PaymentStatus) -> Registration {
    Registration {
        id: id.to_string(),
        participant: participant(),
        amount: dec!(499),
        payment_status: status,
        coupon_code: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn new_registration(coupon: Option<&str>) -> NewRegistration {
    NewRegistration {
        participant: participant(),
        coupon_code: coupon.map(str::to_string),
    }
}

/// Scripted stand-in for the backend API.
///
/// Status checks pop from `statuses` and keep answering `pending` once it runs
/// dry. Every call is counted.
pub struct ScriptedBackend {
    pub registration: Mutex<Registration>,
    pub order_failure: Mutex<Option<String>>,
    pub verify_status: Mutex<std::result::Result<PaymentStatus, String>>,
    pub statuses: Mutex<VecDeque<std::result::Result<PaymentStatus, String>>>,
    pub order_requests: Mutex<Vec<OrderRequest>>,
    pub registrations_created: AtomicUsize,
    pub fetches: AtomicUsize,
    pub orders: AtomicUsize,
    pub verifies: AtomicUsize,
    pub status_checks: AtomicUsize,
    /// Flow phase seen at each status check, once a probe is attached.
    pub phase_probe: Mutex<Option<watch::Receiver<PaymentPhase>>>,
    pub phases_at_status_check: Mutex<Vec<PaymentPhase>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            registration: Mutex::new(registration("reg-1", PaymentStatus::Pending)),
            order_failure: Mutex::new(None),
            verify_status: Mutex::new(Ok(PaymentStatus::Pending)),
            statuses: Mutex::new(VecDeque::new()),
            order_requests: Mutex::new(Vec::new()),
            registrations_created: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            orders: AtomicUsize::new(0),
            verifies: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            phase_probe: Mutex::new(None),
            phases_at_status_check: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(self, statuses: Vec<std::result::Result<PaymentStatus, String>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_registration(self, registration: Registration) -> Self {
        *self.registration.lock().unwrap() = registration;
        self
    }

    pub fn rejecting_orders(self, message: &str) -> Self {
        *self.order_failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn rejecting_verification(self, message: &str) -> Self {
        *self.verify_status.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn probe(&self, phases: watch::Receiver<PaymentPhase>) {
        *self.phase_probe.lock().unwrap() = Some(phases);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn rejected(message: &str) -> PaymentError {
    PaymentError::Backend {
        status: Some(400),
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl PaymentBackend for ScriptedBackend {
    async fn create_registration(&self, new: &NewRegistration) -> Result<Registration> {
        self.registrations_created.fetch_add(1, Ordering::SeqCst);
        let mut registration = self.registration.lock().unwrap();
        registration.participant = new.participant.clone();
        registration.coupon_code = new.coupon_code.clone();
        Ok(registration.clone())
    }

    async fn fetch_registration(&self, _registration_id: &str) -> Result<Registration> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.registration.lock().unwrap().clone())
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order> {
        let attempt = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
        self.order_requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.order_failure.lock().unwrap().as_deref() {
            return Err(rejected(message));
        }
        Ok(Order {
            order_id: format!("order_{attempt}"),
            currency: "INR".to_string(),
            base_amount: dec!(499),
            gateway_fee: dec!(12.78),
            charged_amount: MinorUnits::new(CHARGED),
            registration_id: String::new(),
        })
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> Result<VerificationReceipt> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        match &*self.verify_status.lock().unwrap() {
            Ok(status) => Ok(VerificationReceipt {
                payment_status: *status,
                registration_id: request.registration_id.clone(),
            }),
            Err(message) => Err(rejected(message)),
        }
    }

    async fn payment_status(&self, _registration_id: &str) -> Result<PaymentStatus> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        if let Some(probe) = self.phase_probe.lock().unwrap().as_ref() {
            let phase = probe.borrow().clone();
            self.phases_at_status_check.lock().unwrap().push(phase);
        }
        match self.statuses.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(PaymentError::Backend {
                status: Some(503),
                message: Some(message),
            }),
            None => Ok(PaymentStatus::Pending),
        }
    }
}

/// Checkout SDK that replays a script of events and records what it was
/// opened with.
pub struct ScriptedSdk {
    pub events: Mutex<VecDeque<SdkEvent>>,
    pub opened_with: Mutex<Vec<CheckoutOptions>>,
}

impl ScriptedSdk {
    pub fn new(events: Vec<SdkEvent>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events.into()),
            opened_with: Mutex::new(Vec::new()),
        })
    }

    pub fn opens(&self) -> usize {
        self.opened_with.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckoutSdk for ScriptedSdk {
    async fn open(&self, options: CheckoutOptions) -> Result<SdkEvent> {
        let order_id = options.order_id.clone();
        self.opened_with.lock().unwrap().push(options);
        let event = self
            .events
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SdkEvent::ModalDismissed);
        Ok(match event {
            SdkEvent::Handler(mut payment) => {
                payment.order_id = order_id;
                SdkEvent::Handler(payment)
            }
            dismissed => dismissed,
        })
    }
}

pub fn completed() -> SdkEvent {
    SdkEvent::Handler(SignedPayment {
        order_id: String::new(),
        payment_id: "pay_1".to_string(),
        signature: "sig_1".to_string(),
    })
}

/// Loader that hands out one SDK, optionally after a delay or failing the
/// first `failures` loads.
pub struct CountingLoader {
    pub sdk: Arc<ScriptedSdk>,
    pub loads: AtomicUsize,
    pub delay: Duration,
    pub failures: AtomicUsize,
}

impl CountingLoader {
    pub fn new(sdk: Arc<ScriptedSdk>) -> Arc<Self> {
        Arc::new(Self {
            sdk,
            loads: AtomicUsize::new(0),
            delay: Duration::ZERO,
            failures: AtomicUsize::new(0),
        })
    }

    pub fn slow(sdk: Arc<ScriptedSdk>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            sdk,
            loads: AtomicUsize::new(0),
            delay,
            failures: AtomicUsize::new(0),
        })
    }

    pub fn failing(sdk: Arc<ScriptedSdk>, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            sdk,
            loads: AtomicUsize::new(0),
            delay: Duration::ZERO,
            failures: AtomicUsize::new(failures),
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SdkLoader for CountingLoader {
    async fn load(&self) -> Result<Arc<dyn CheckoutSdk>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(PaymentError::SdkLoad("script blocked".to_string()));
        }
        Ok(self.sdk.clone())
    }
}

pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub sdk: Arc<ScriptedSdk>,
    pub loader: Arc<CountingLoader>,
    pub store: Arc<InMemorySessionStore>,
    pub flow: PaymentFlow,
}

pub fn harness(backend: ScriptedBackend, events: Vec<SdkEvent>) -> Harness {
    let store = Arc::new(InMemorySessionStore::new());
    let session = SessionContext::new(store.clone());
    build_harness(backend, events, store, session)
}

/// A flow picking up the session a previous run left behind for `cached`.
pub async fn restored_harness(
    backend: ScriptedBackend,
    events: Vec<SdkEvent>,
    cached: &Registration,
) -> Harness {
    let store = Arc::new(InMemorySessionStore::new());
    SessionContext::new(store.clone())
        .remember(cached)
        .await
        .unwrap();
    let session = SessionContext::restore(store.clone()).await.unwrap();
    build_harness(backend, events, store, session)
}

fn build_harness(
    backend: ScriptedBackend,
    events: Vec<SdkEvent>,
    store: Arc<InMemorySessionStore>,
    session: SessionContext,
) -> Harness {
    let backend = Arc::new(backend);
    let sdk = ScriptedSdk::new(events);
    let loader = CountingLoader::new(sdk.clone());
    let gateway = GatewayAdapter::new(loader.clone(), Some("rzp_test_key".to_string()));
    let flow = PaymentFlow::new(
        backend.clone(),
        gateway,
        session,
        categories(),
        POLL_INTERVAL,
    )
    .unwrap();
    backend.probe(flow.phases());
    Harness {
        backend,
        sdk,
        loader,
        store,
        flow,
    }
}
