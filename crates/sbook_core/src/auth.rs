//! Authentication collaborator contract.
//!
//! # Responsibility
//! - Expose the signed-in principal to the core.
//! - Verify a password against the signed-in principal (reauthentication).
//!
//! # Invariants
//! - Passwords are never logged or retained beyond the verification call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// Authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No principal is signed in.
    NotSignedIn,
    /// Signed-in principal has no email credential to reauthenticate with.
    MissingEmail,
    /// Password did not match.
    InvalidCredential,
    /// Auth backend could not be reached.
    Unavailable(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "no signed-in user"),
            Self::MissingEmail => write!(f, "signed-in user has no email credential"),
            Self::InvalidCredential => {
                write!(f, "authentication failed; please check your password")
            }
            Self::Unavailable(message) => write!(f, "auth service unavailable: {message}"),
        }
    }
}

impl Error for AuthError {}

/// Async auth contract consumed by identity resolution and deletion.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_principal(&self) -> Option<Principal>;

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<(), AuthError>;
}

/// In-process auth provider with a fixed credential table.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    current: Mutex<Option<Principal>>,
    passwords: Mutex<HashMap<String, String>>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a credential and signs the principal in.
    pub fn sign_in(&self, principal: Principal, password: impl Into<String>) {
        if let Some(email) = principal.email.as_ref() {
            self.passwords
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(email.clone(), password.into());
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(principal);
    }

    pub fn sign_out(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn current_principal(&self) -> Option<Principal> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn reauthenticate(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let signed_in_email = self
            .current_principal()
            .await
            .ok_or(AuthError::NotSignedIn)?
            .email
            .ok_or(AuthError::MissingEmail)?;
        if signed_in_email != email {
            return Err(AuthError::InvalidCredential);
        }

        let passwords = self.passwords.lock().unwrap_or_else(PoisonError::into_inner);
        match passwords.get(email) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(AuthError::InvalidCredential),
        }
    }
}
