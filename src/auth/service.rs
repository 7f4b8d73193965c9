//! Registration and login for depot.

use crate::analytics::{EventRepository, NewEvent, EVENT_USER_LOGIN};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::{DepotError, Result};

use super::password::{hash_password, verify_password};

/// Authentication service: account creation and credential verification.
pub struct AuthService<'a> {
    db: &'a Database,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new account.
    ///
    /// Fails with `DuplicateIdentity` if the username or email is taken.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let hash = hash_password(password)?;

        let repo = UserRepository::new(self.db.pool());
        let user = repo.create(&NewUser::new(username, email, hash)).await?;

        Ok(user)
    }

    /// Verify credentials and log the user in.
    ///
    /// Unknown email and wrong password produce the same
    /// `InvalidCredentials` error so account existence cannot be probed.
    /// On success the user's `last_login` is updated and a `user_login`
    /// event is appended.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let repo = UserRepository::new(self.db.pool());

        let user = repo
            .get_by_email(email)
            .await?
            .ok_or(DepotError::InvalidCredentials)?;

        verify_password(password, &user.password)
            .map_err(|_| DepotError::InvalidCredentials)?;

        repo.touch_last_login(user.id).await?;

        EventRepository::record(
            self.db.pool(),
            &NewEvent::new(EVENT_USER_LOGIN).with_user(user.id),
        )
        .await?;

        repo.get_by_id(user.id)
            .await?
            .ok_or_else(|| DepotError::NotFound("user".to_string()))
    }
}
