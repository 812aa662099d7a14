//! User directory: creation and lookup of user records.

use crate::store::UserStore;
use crate::{CreatedUser, Error, ExerciseEntry, Result, User, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create a user and answer without waiting for the write
    ///
    /// The insert runs as a background task; if it fails the error is only
    /// logged and the caller has already been told the user exists. Must be
    /// called from within a tokio runtime.
    pub fn create_user(&self, username: Option<&str>) -> Result<CreatedUser> {
        let username = username
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::Validation("Please insert a username".into()))?;

        let user = User::new(self.store.next_id(), username);
        let created = CreatedUser {
            username: user.username.clone(),
            id: user.id.clone(),
        };

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.insert(&user).await {
                Ok(()) => tracing::info!("Saved user {} ({})", user.id, user.username),
                Err(e) => tracing::error!("Error saving user {}: {}", user.id, e),
            }
        });

        Ok(created)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.list().await
    }

    /// `None` when no user has this id
    pub async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        self.store.find_by_id(id).await
    }

    /// Append to a user's exercises through the store's atomic update-by-id
    ///
    /// `None` when no user has this id; nothing is written in that case.
    pub async fn record_exercise(&self, id: &UserId, entry: ExerciseEntry) -> Result<Option<User>> {
        self.store.push_exercise(id, entry).await
    }
}
