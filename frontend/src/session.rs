//! The process-wide authenticated session.
//!
//! There is exactly one writer per transition: [`SessionStore::sign_in`]
//! (explicit login), [`SessionStore::sign_out`] (explicit sign-out) and
//! [`SessionStore::expire`] (credential-expiry path of a list controller).
//! Everything else reads snapshots.

use std::sync::Arc;

use eduflow_shared::{current_role, EntityId, Role};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Signed-in user and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// User id; `-1` when anonymous.
    pub id: EntityId,
    /// Roles granted to the user.
    pub roles: Vec<Role>,
    /// Whether the credential is considered valid.
    pub is_authenticated: bool,
    /// Bearer credential sent with authenticated requests.
    pub access_token: String,
    /// Credential used to obtain a new access token.
    pub refresh_token: String,
    /// Display name.
    pub name: Option<String>,
    /// Phone number the user signed in with.
    pub phone_number: Option<String>,
}

impl Session {
    /// The signed-out state.
    pub fn anonymous() -> Self {
        Self {
            id: -1,
            roles: Vec::new(),
            is_authenticated: false,
            access_token: String::new(),
            refresh_token: String::new(),
            name: None,
            phone_number: None,
        }
    }

    /// Most privileged role held.
    pub fn current_role(&self) -> Option<Role> {
        current_role(&self.roles)
    }

    /// Access token to send, if signed in.
    pub fn bearer(&self) -> Option<&str> {
        let token = self.access_token.trim();
        (self.is_authenticated && !token.is_empty()).then_some(token)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Why the session was last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user signed out explicitly.
    UserRequested,
    /// An expired credential forced the sign-out.
    CredentialExpired,
}

#[derive(Debug, Default)]
struct SessionSlot {
    session: Session,
    last_sign_out: Option<SignOutReason>,
}

/// Shared handle; clones see the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<SessionSlot>>,
}

impl SessionStore {
    /// Signed-out store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already signed in with `session`.
    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        store.sign_in(session);
        store
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.slot.read().session.clone()
    }

    /// Most privileged role of the current session.
    pub fn current_role(&self) -> Option<Role> {
        self.slot.read().session.current_role()
    }

    /// Roles of the current session.
    pub fn roles(&self) -> Vec<Role> {
        self.slot.read().session.roles.clone()
    }

    /// Bearer token to send, if signed in.
    pub fn access_token(&self) -> Option<String> {
        self.slot.read().session.bearer().map(str::to_string)
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.slot.read().session.is_authenticated
    }

    /// Why the session was last reset, if it was.
    pub fn last_sign_out(&self) -> Option<SignOutReason> {
        self.slot.read().last_sign_out
    }

    /// Explicit login. Replaces the whole session.
    pub fn sign_in(&self, session: Session) {
        info!(user_id = session.id, roles = ?session.roles, "session signed in");
        let mut slot = self.slot.write();
        slot.session = session;
        slot.last_sign_out = None;
    }

    /// Explicit sign-out.
    pub fn sign_out(&self) {
        self.reset(SignOutReason::UserRequested);
    }

    /// Credential-expiry path only. Idempotent: concurrent expiries of several
    /// controllers collapse into one reset.
    pub fn expire(&self) {
        self.reset(SignOutReason::CredentialExpired);
    }

    fn reset(&self, reason: SignOutReason) {
        let mut slot = self.slot.write();
        if !slot.session.is_authenticated && slot.last_sign_out == Some(reason) {
            return;
        }
        info!(?reason, user_id = slot.session.id, "session reset");
        slot.session = Session::anonymous();
        slot.last_sign_out = Some(reason);
    }
}
