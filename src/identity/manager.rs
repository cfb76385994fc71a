//! High-level identity API: signup, login, and session lifecycle.

use std::sync::{Arc, RwLock};

use super::credential::Secret;
use super::error::{IdentityError, Result};
use super::store::IdentityStore;
use super::types::{Session, User, UserId, UserProfile};

/// High-level API over [`IdentityStore`] that owns the active session.
///
/// The session is an explicit value: it is created by [`login`],
/// restored by [`resume`], handed to callers via [`current`], and
/// destroyed by [`logout`]. A successful profile update on the
/// session's own user refreshes the denormalized snapshot.
///
/// [`login`]: Self::login
/// [`resume`]: Self::resume
/// [`current`]: Self::current
/// [`logout`]: Self::logout
pub struct IdentityManager {
    store: Arc<IdentityStore>,
    session: RwLock<Option<Session>>,
}

impl IdentityManager {
    /// Creates a manager over the given store with no active session.
    #[must_use]
    pub fn new(store: Arc<IdentityStore>) -> Self {
        Self {
            store,
            session: RwLock::new(None),
        }
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::HandleTaken`] if the handle is in use.
    pub fn sign_up(&self, profile: UserProfile, secret: &Secret) -> Result<User> {
        self.store.create(profile, secret)
    }

    /// Authenticates and opens a session.
    ///
    /// The session snapshot is persisted so it survives a restart.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] or
    /// [`IdentityError::BadCredential`] when authentication fails.
    pub fn login(&self, handle: &str, secret: &Secret) -> Result<Session> {
        let user = self.store.authenticate(handle, secret)?;
        let session = Session {
            user,
            created_at: chrono::Utc::now().timestamp(),
        };
        self.store.save_session(&session)?;
        self.set_active(Some(session.clone()))?;
        Ok(session)
    }

    /// Closes the active session, if any. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted snapshot cannot be cleared.
    pub fn logout(&self) -> Result<()> {
        self.store.clear_session()?;
        self.set_active(None)
    }

    /// Restores a persisted session from a previous run.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted snapshot cannot be read.
    pub fn resume(&self) -> Result<Option<Session>> {
        let session = self.store.load_session()?;
        self.set_active(session.clone())?;
        Ok(session)
    }

    /// Returns a copy of the active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.session.read().ok()?.clone()
    }

    /// Updates a user's profile.
    ///
    /// When the updated user is the session's user, the session
    /// snapshot (in memory and persisted) is refreshed, since it holds
    /// a denormalized copy of the record.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] or
    /// [`IdentityError::HandleTaken`] from the underlying update.
    pub fn update_profile(&self, user: &User) -> Result<User> {
        self.store.update(user)?;
        let fresh = self.store.get(&user.id)?;

        let active = self.current();
        if let Some(session) = active {
            if session.user.id == fresh.id {
                let refreshed = Session {
                    user: fresh.clone(),
                    created_at: session.created_at,
                };
                self.store.save_session(&refreshed)?;
                self.set_active(Some(refreshed))?;
            }
        }

        Ok(fresh)
    }

    /// Administratively deletes a user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Forbidden`] unless the acting session
    /// belongs to an administrator.
    pub fn delete_user(&self, actor: &Session, id: &UserId) -> Result<()> {
        if !actor.is_admin() {
            return Err(IdentityError::Forbidden(
                "user deletion requires an administrator".to_string(),
            ));
        }
        self.store.delete(id)
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<IdentityStore> {
        &self.store
    }

    fn set_active(&self, session: Option<Session>) -> Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|e| IdentityError::Storage(format!("Failed to acquire session lock: {e}")))?;
        *guard = session;
        Ok(())
    }
}
