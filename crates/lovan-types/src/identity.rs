//! User identity held by the session store.
//!
//! The bearer token is wrapped in [`SecretString`] and only exposed when
//! building request headers or writing the persisted credential blob.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// Who is using the client right now.
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedIdentity),
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Authenticated(auth) => Some(&auth.email),
            Identity::Anonymous => None,
        }
    }
}

/// A logged-in user and the opaque token issued by the auth service.
#[derive(Debug)]
pub struct AuthenticatedIdentity {
    pub subject_id: Option<String>,
    pub email: String,
    pub token: SecretString,
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthenticatedIdentity {
    pub fn new(subject_id: Option<String>, email: String, token: SecretString) -> Self {
        Self {
            subject_id,
            email,
            token,
            created_at: Some(Utc::now()),
        }
    }
}

impl Clone for AuthenticatedIdentity {
    fn clone(&self) -> Self {
        Self {
            subject_id: self.subject_id.clone(),
            email: self.email.clone(),
            token: SecretString::from(self.token.expose_secret().to_owned()),
            created_at: self.created_at,
        }
    }
}

/// Persisted credential blob.
///
/// Shape: `{subject_id?, email, access_token, created_at?}`. `id` is
/// accepted for `subject_id` because the login response spreads the
/// user object (`{id, email}`) into the stored blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    pub email: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Convert into an identity, rejecting blobs without a usable token.
    pub fn into_identity(self) -> Result<AuthenticatedIdentity, ShapeError> {
        if self.access_token.trim().is_empty() {
            return Err(ShapeError::MissingField("access_token"));
        }
        Ok(AuthenticatedIdentity {
            subject_id: self.subject_id,
            email: self.email,
            token: SecretString::from(self.access_token),
            created_at: self.created_at,
        })
    }
}

impl From<&AuthenticatedIdentity> for StoredCredential {
    fn from(identity: &AuthenticatedIdentity) -> Self {
        Self {
            subject_id: identity.subject_id.clone(),
            email: identity.email.clone(),
            access_token: identity.token.expose_secret().to_owned(),
            created_at: identity.created_at,
        }
    }
}
