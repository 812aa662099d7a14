//! Storage collaborator for user documents.
//!
//! The directory and the log service only ever talk to a [`UserStore`].
//! Each user is one document embedding its exercises; there is no separate
//! exercise storage.

use crate::{ExerciseEntry, Result, User, UserId};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Document store holding one collection of users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Allocate the identifier for a user about to be inserted
    fn next_id(&self) -> UserId {
        UserId::generate()
    }

    /// Persist a new user document
    async fn insert(&self, user: &User) -> Result<()>;

    /// All users in storage order
    async fn list(&self) -> Result<Vec<User>>;

    /// Look up a single user
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>>;

    /// Atomically push an exercise onto a user's sequence
    ///
    /// Returns the updated document, or `None` if no user has this id.
    async fn push_exercise(&self, id: &UserId, entry: ExerciseEntry) -> Result<Option<User>>;
}

/// Volatile store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> Result<()> {
        self.users.write().await.push(user.clone());
        tracing::debug!("Inserted user {} in memory", user.id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| &u.id == id).cloned())
    }

    async fn push_exercise(&self, id: &UserId, entry: ExerciseEntry) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| &u.id == id).map(|user| {
            user.exercises.push(entry);
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str) -> ExerciseEntry {
        ExerciseEntry {
            description: Some("swim".into()),
            duration: 30.0,
            date: date.into(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        let user = User::new(store.next_id(), "alice");
        store.insert(&user).await.unwrap();

        let found = store.find_by_id(&user.id).await.unwrap();
        assert_eq!(found, Some(user));
        assert!(store.find_by_id(&UserId::from("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store.insert(&User::new(store.next_id(), name)).await.unwrap();
        }
        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_push_exercise() {
        let store = MemoryStore::new();
        let user = User::new(store.next_id(), "bob");
        store.insert(&user).await.unwrap();

        store.push_exercise(&user.id, entry("2024-01-01")).await.unwrap();
        let updated = store
            .push_exercise(&user.id, entry("2024-01-02"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.exercises.len(), 2);
        assert_eq!(updated.exercises[1].date, "2024-01-02");

        let missing = store
            .push_exercise(&UserId::from("nobody"), entry("2024-01-01"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
