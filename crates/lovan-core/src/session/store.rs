//! Session store: the current identity and its durable persistence.
//!
//! Restoration never fails loudly. A missing blob, an unreadable store, or a
//! blob that does not parse into an identity all degrade to `Anonymous`; a
//! corrupt blob is additionally deleted so the next start is clean.

use secrecy::SecretString;
use tracing::{debug, info, warn};

use lovan_types::error::{SessionError, ShapeError, StoreError};
use lovan_types::identity::{AuthenticatedIdentity, Identity, StoredCredential};

/// Storage port for the persisted credential blob.
///
/// The blob is opaque here; parsing happens in [`SessionStore::restore`] so
/// that corrupt data can be detected and discarded in one place.
pub trait CredentialStore: Send + Sync {
    /// Read the blob, `None` if nothing is stored.
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Replace the stored blob.
    fn save(
        &self,
        blob: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove the stored blob. Removing a missing blob is not an error.
    fn delete(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Holds the current identity.
///
/// Constructed explicitly and handed to the controller; lifecycle is
/// `restore` on start, `set_authenticated` on login, `clear` on logout.
pub struct SessionStore<S: CredentialStore> {
    store: S,
    identity: Identity,
}

impl<S: CredentialStore> SessionStore<S> {
    /// Create a store that is anonymous until [`restore`](Self::restore) runs.
    pub fn new(store: S) -> Self {
        Self {
            store,
            identity: Identity::Anonymous,
        }
    }

    /// Load the persisted identity, degrading to anonymous on any problem.
    pub async fn restore(&mut self) -> &Identity {
        self.identity = match self.store.load().await {
            Ok(None) => {
                debug!("No stored session, starting anonymous");
                Identity::Anonymous
            }
            Ok(Some(blob)) => match parse_blob(&blob) {
                Ok(identity) => {
                    info!(email = %identity.email, "Restored stored session");
                    Identity::Authenticated(identity)
                }
                Err(err) => {
                    let err = SessionError::CorruptSession(err.to_string());
                    warn!("Discarding stored session: {err}");
                    if let Err(del) = self.store.delete().await {
                        warn!("Failed to delete corrupt session blob: {del}");
                    }
                    Identity::Anonymous
                }
            },
            Err(err) => {
                warn!("Could not read stored session, starting anonymous: {err}");
                Identity::Anonymous
            }
        };
        &self.identity
    }

    /// Replace the current identity and persist it.
    ///
    /// The in-memory identity is updated even if persisting fails.
    pub async fn set_authenticated(
        &mut self,
        identity: AuthenticatedIdentity,
    ) -> Result<(), SessionError> {
        let stored = StoredCredential::from(&identity);
        info!(email = %identity.email, "Session authenticated");
        self.identity = Identity::Authenticated(identity);

        let blob = serde_json::to_string(&stored)
            .map_err(|e| SessionError::Storage(format!("failed to encode session: {e}")))?;
        self.store.save(&blob).await?;
        Ok(())
    }

    /// Reset to anonymous and delete the persisted blob.
    pub async fn clear(&mut self) -> Result<(), SessionError> {
        self.identity = Identity::Anonymous;
        info!("Session cleared");
        self.store.delete().await?;
        Ok(())
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_authenticated()
    }

    pub fn token(&self) -> Option<&SecretString> {
        match &self.identity {
            Identity::Authenticated(auth) => Some(&auth.token),
            Identity::Anonymous => None,
        }
    }

    /// Access the underlying credential store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn parse_blob(blob: &str) -> Result<AuthenticatedIdentity, ShapeError> {
    let stored: StoredCredential =
        serde_json::from_str(blob).map_err(|e| ShapeError::Malformed {
            what: "stored session",
            reason: e.to_string(),
        })?;
    stored.into_identity()
}
