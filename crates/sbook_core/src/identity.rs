//! Effective-subject resolution and impersonation lifecycle.
//!
//! # Responsibility
//! - Resolve whose roster and logs the current principal operates on.
//! - Own the `simulatedUser` impersonation token in local secure storage.
//! - Clear the token when the host app leaves the foreground.
//!
//! # Invariants
//! - Only a supervisory principal can ever resolve to another subject.
//! - Roster/log operations take an `EffectiveIdentity` parameter, so none can
//!   be issued before resolution completes.
//! - A malformed token is an error; it never silently falls back.

use crate::auth::AuthProvider;
use crate::secure_store::KeyValueStore;
use crate::store::{paths, DocumentStore, StoreError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Secure-storage key holding the impersonation token.
pub const IMPERSONATION_KEY: &str = "simulatedUser";
/// Profile field flagging a supervisory principal.
pub const SUPERVISORY_FIELD: &str = "supervisory";

/// Token written by a supervisory principal to act as another subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationToken {
    #[serde(rename = "subjectId")]
    pub subject_id: String,
    pub supervisory: bool,
}

/// Subject governing every roster/log operation of one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveIdentity {
    principal_id: String,
    subject_id: String,
    supervisory: bool,
}

impl EffectiveIdentity {
    /// Identity of a principal acting on its own data.
    ///
    /// Hosts that resolve identity on their side use this at the FFI boundary.
    pub fn own(principal_id: impl Into<String>) -> Self {
        let principal_id = principal_id.into();
        Self {
            subject_id: principal_id.clone(),
            principal_id,
            supervisory: false,
        }
    }

    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn is_supervisory(&self) -> bool {
        self.supervisory
    }

    pub fn is_impersonating(&self) -> bool {
        self.principal_id != self.subject_id
    }
}

/// Host application lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Inactive,
    Background,
}

impl LifecycleState {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "background" => Some(Self::Background),
            _ => None,
        }
    }

    fn clears_impersonation(self) -> bool {
        matches!(self, Self::Inactive | Self::Background)
    }
}

/// Identity resolution failures.
#[derive(Debug)]
pub enum ResolutionError {
    /// No principal is signed in; nothing may be fetched.
    NoPrincipal,
    /// Principal attempted a supervisory-only action.
    NotSupervisory(String),
    /// Stored impersonation token could not be used.
    InvalidToken(String),
    /// Profile or secure storage failed.
    Store(StoreError),
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPrincipal => write!(f, "no authenticated user"),
            Self::NotSupervisory(uid) => write!(f, "user is not supervisory: {uid}"),
            Self::InvalidToken(message) => write!(f, "invalid impersonation token: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ResolutionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Resolves the effective subject from auth, profile and secure storage.
#[derive(Clone)]
pub struct IdentityResolver {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    secure: Arc<dyn KeyValueStore>,
}

impl IdentityResolver {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        secure: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            auth,
            store,
            secure,
        }
    }

    /// Resolves the identity for one screen activation.
    ///
    /// # Errors
    /// - `NoPrincipal` when nobody is signed in.
    /// - `InvalidToken` when a supervisory principal holds an unusable token.
    /// - `Store` when the profile or secure storage cannot be read.
    pub async fn resolve(&self) -> Result<EffectiveIdentity, ResolutionError> {
        let principal = match self.auth.current_principal().await {
            Some(principal) => principal,
            None => {
                warn!("event=identity_resolve module=identity status=error error_code=no_principal");
                return Err(ResolutionError::NoPrincipal);
            }
        };

        let supervisory = self.is_supervisory(&principal.uid).await?;
        let mut identity = EffectiveIdentity {
            subject_id: principal.uid.clone(),
            principal_id: principal.uid,
            supervisory,
        };

        if supervisory {
            if let Some(token) = self.read_token().await? {
                identity.subject_id = token.subject_id;
            }
        }

        info!(
            "event=identity_resolve module=identity status=ok supervisory={} impersonating={}",
            identity.supervisory,
            identity.is_impersonating()
        );
        Ok(identity)
    }

    /// Reads the supervisory flag from `subjects/{uid}`; absent means `false`.
    pub async fn is_supervisory(&self, uid: &str) -> Result<bool, StoreError> {
        let profile = self
            .store
            .get_document(&paths::subject_profile(uid)?)
            .await?;
        Ok(profile
            .as_ref()
            .and_then(|data| data.get(SUPERVISORY_FIELD))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Writes the impersonation token for `subject_id`.
    ///
    /// # Errors
    /// - `NotSupervisory` when the signed-in principal lacks the flag.
    pub async fn start_impersonation(
        &self,
        subject_id: &str,
    ) -> Result<EffectiveIdentity, ResolutionError> {
        let principal = self
            .auth
            .current_principal()
            .await
            .ok_or(ResolutionError::NoPrincipal)?;
        if !self.is_supervisory(&principal.uid).await? {
            return Err(ResolutionError::NotSupervisory(principal.uid));
        }
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(ResolutionError::InvalidToken(
                "subject id must not be blank".to_string(),
            ));
        }

        let token = ImpersonationToken {
            subject_id: subject_id.to_string(),
            supervisory: true,
        };
        let raw = serde_json::to_string(&token).map_err(StoreError::from)?;
        self.secure.set_item(IMPERSONATION_KEY, raw).await?;
        info!("event=impersonation_start module=identity status=ok");

        Ok(EffectiveIdentity {
            principal_id: principal.uid,
            subject_id: token.subject_id,
            supervisory: true,
        })
    }

    /// Removes the impersonation token.
    pub async fn stop_impersonation(&self) -> Result<(), ResolutionError> {
        self.secure.remove_item(IMPERSONATION_KEY).await?;
        info!("event=impersonation_stop module=identity status=ok");
        Ok(())
    }

    /// Lifecycle hook; clears the token when the app leaves the foreground.
    ///
    /// Returns whether the token was cleared.
    pub async fn on_lifecycle_change(&self, state: LifecycleState) -> Result<bool, ResolutionError> {
        if !state.clears_impersonation() {
            return Ok(false);
        }
        if let Err(err) = self.secure.remove_item(IMPERSONATION_KEY).await {
            error!(
                "event=impersonation_clear module=identity status=error error_code=secure_store_failed error={err}"
            );
            return Err(err.into());
        }
        info!("event=impersonation_clear module=identity status=ok state={state:?}");
        Ok(true)
    }

    async fn read_token(&self) -> Result<Option<ImpersonationToken>, ResolutionError> {
        let Some(raw) = self.secure.get_item(IMPERSONATION_KEY).await? else {
            return Ok(None);
        };
        let token: ImpersonationToken = serde_json::from_str(&raw).map_err(|err| {
            warn!("event=identity_resolve module=identity status=error error_code=token_malformed");
            ResolutionError::InvalidToken(err.to_string())
        })?;
        if !token.supervisory || token.subject_id.trim().is_empty() {
            return Err(ResolutionError::InvalidToken(
                "token must carry a subject id and the supervisory flag".to_string(),
            ));
        }
        Ok(Some(token))
    }
}
