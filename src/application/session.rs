use crate::domain::ports::SessionStoreRef;
use crate::domain::registration::Registration;
use crate::error::Result;
use tracing::{debug, warn};

pub const REGISTRATION_ID_KEY: &str = "registrationId";
pub const REGISTRATION_DATA_KEY: &str = "registrationData";

/// The in-progress registration, cached for prefill and for picking the flow
/// back up after a restart.
///
/// Owned by one payment flow. Written when a registration is created or
/// fetched, closed once the registration is confirmed paid.
pub struct SessionContext {
    store: SessionStoreRef,
    registration_id: Option<String>,
    snapshot: Option<Registration>,
}

impl SessionContext {
    /// An empty session that writes through to `store`.
    pub fn new(store: SessionStoreRef) -> Self {
        Self {
            store,
            registration_id: None,
            snapshot: None,
        }
    }

    /// Reloads whatever a previous run left in `store`.
    ///
    /// A snapshot that no longer parses is ignored; the id alone is enough to
    /// re-enter the flow.
    pub async fn restore(store: SessionStoreRef) -> Result<Self> {
        let registration_id = store.get(REGISTRATION_ID_KEY).await?;
        let snapshot = match store.get(REGISTRATION_DATA_KEY).await? {
            Some(raw) => match serde_json::from_str::<Registration>(&raw) {
                Ok(registration) => Some(registration),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable registration snapshot");
                    None
                }
            },
            None => None,
        };
        debug!(restored = registration_id.is_some(), "session restored");
        Ok(Self {
            store,
            registration_id,
            snapshot,
        })
    }

    pub fn store(&self) -> SessionStoreRef {
        self.store.clone()
    }

    pub fn registration_id(&self) -> Option<&str> {
        self.registration_id.as_deref()
    }

    pub fn snapshot(&self) -> Option<&Registration> {
        self.snapshot.as_ref()
    }

    pub async fn remember(&mut self, registration: &Registration) -> Result<()> {
        self.store
            .put(REGISTRATION_ID_KEY, registration.id.clone())
            .await?;
        self.store
            .put(REGISTRATION_DATA_KEY, serde_json::to_string(registration)?)
            .await?;
        self.registration_id = Some(registration.id.clone());
        self.snapshot = Some(registration.clone());
        Ok(())
    }

    /// Drops the cached registration from the store and ends the session.
    pub async fn close(self) -> Result<()> {
        self.store.remove(REGISTRATION_DATA_KEY).await?;
        self.store.remove(REGISTRATION_ID_KEY).await?;
        debug!(registration_id = ?self.registration_id, "session closed");
        Ok(())
    }
}
