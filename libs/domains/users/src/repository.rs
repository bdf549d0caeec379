use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for User storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user; fails if the email is already taken
    async fn create(&self, user: User) -> UserResult<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// All users in insertion order
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Replace a stored user; fails if missing or if another user owns the email
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete a user by ID, returning whether it existed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// ID of the user currently holding `email`, if any
    async fn email_owner(&self, email: &str) -> UserResult<Option<Uuid>>;
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    /// Insertion order of ids in `users`
    order: Vec<Uuid>,
    /// email -> id, kept in lockstep with `users`
    emails: HashMap<String, Uuid>,
}

/// In-memory implementation of UserRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut state = self.state.write().await;

        if state.emails.contains_key(&user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        state.emails.insert(user.email.clone(), user.id);
        state.order.push(user.id);
        state.users.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, total = state.users.len(), "Stored user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.users.get(id))
            .cloned()
            .collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut state = self.state.write().await;

        let previous_email = match state.users.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(UserError::NotFound(user.id.to_string())),
        };

        if let Some(owner) = state.emails.get(&user.email) {
            if *owner != user.id {
                return Err(UserError::DuplicateEmail(user.email));
            }
        }

        if previous_email != user.email {
            state.emails.remove(&previous_email);
            state.emails.insert(user.email.clone(), user.id);
        }
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut state = self.state.write().await;

        match state.users.remove(&id) {
            Some(user) => {
                state.emails.remove(&user.email);
                state.order.retain(|existing| *existing != id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn email_owner(&self, email: &str) -> UserResult<Option<Uuid>> {
        let state = self.state.read().await;
        Ok(state.emails.get(email).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn user(name: &str, email: &str, age: u8) -> User {
        User::new(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            age,
        })
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo.create(user("Ann", "ann@x.com", 30)).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap();

        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("Ann", "ann@x.com", 30)).await.unwrap();

        let result = repo.create(user("Bob", "ann@x.com", 40)).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_comparison_is_exact() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("Ann", "ann@x.com", 30)).await.unwrap();

        assert!(repo.create(user("Ann", "ANN@x.com", 30)).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = InMemoryUserRepository::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let created = repo
                .create(user("U", &format!("u{i}@x.com"), i))
                .await
                .unwrap();
            ids.push(created.id);
        }

        repo.delete(ids[1]).await.unwrap();
        ids.remove(1);

        let listed: Vec<Uuid> = repo.list().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_update_moves_email_index() {
        let repo = InMemoryUserRepository::new();
        let mut ann = repo.create(user("Ann", "ann@x.com", 30)).await.unwrap();

        ann.email = "ann@y.com".to_string();
        repo.update(ann.clone()).await.unwrap();

        assert_eq!(repo.email_owner("ann@x.com").await.unwrap(), None);
        assert_eq!(repo.email_owner("ann@y.com").await.unwrap(), Some(ann.id));

        // The released address is free again
        assert!(repo.create(user("Other", "ann@x.com", 20)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_rejects_email_of_other_user() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("Ann", "ann@x.com", 30)).await.unwrap();
        let mut bob = repo.create(user("Bob", "bob@x.com", 40)).await.unwrap();

        bob.email = "ann@x.com".to_string();
        let result = repo.update(bob.clone()).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));

        let stored = repo.get_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "bob@x.com");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let ghost = user("Ghost", "ghost@x.com", 1);

        let result = repo.update(ghost.clone()).await;
        assert_eq!(result, Err(UserError::NotFound(ghost.id.to_string())));
    }

    #[tokio::test]
    async fn test_delete_releases_email() {
        let repo = InMemoryUserRepository::new();
        let ann = repo.create(user("Ann", "ann@x.com", 30)).await.unwrap();

        assert!(repo.delete(ann.id).await.unwrap());
        assert!(!repo.delete(ann.id).await.unwrap());
        assert_eq!(repo.get_by_id(ann.id).await.unwrap(), None);
        assert_eq!(repo.email_owner("ann@x.com").await.unwrap(), None);
    }
}
