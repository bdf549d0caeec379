use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{NAME_NON_EMPTY, NAME_REQUIRED, UserError, UserResult};
use crate::models::{NewUser, User, UserChanges, UserPayload};
use crate::repository::UserRepository;
use crate::validation::{validate_age, validate_email, validate_name};

/// Service layer for User business logic
///
/// Mutations are serialised through `write_lock`, so every check-then-write
/// sequence (uniqueness, existence) runs as one step. Reads go straight to the
/// repository.
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    write_lock: Arc<Mutex<()>>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a new user.
    ///
    /// Checks run in order: payload present, name, email, age, email unique.
    pub async fn create_user(&self, payload: Option<UserPayload>) -> UserResult<User> {
        let payload = payload.ok_or(UserError::MissingPayload)?;

        let input = NewUser {
            name: validate_name(payload.field("name"), NAME_REQUIRED)?,
            email: validate_email(payload.field("email"))?,
            age: validate_age(payload.field("age"))?,
        };

        let _guard = self.write_lock.lock().await;

        if self.repository.email_owner(&input.email).await?.is_some() {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let created = self.repository.create(User::new(input)).await?;

        tracing::info!(user_id = %created.id, email = %created.email, "Created user");
        Ok(created)
    }

    /// List all users
    pub async fn list_users(&self) -> UserResult<Vec<User>> {
        self.repository.list().await
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    /// Update the fields present in `payload`.
    ///
    /// Checks run in order: user exists, payload present, then name, email
    /// (format, then uniqueness against other users) and age. Every present
    /// field is validated before the record is touched, so a failure leaves it
    /// unchanged.
    pub async fn update_user(&self, id: Uuid, payload: Option<UserPayload>) -> UserResult<User> {
        let _guard = self.write_lock.lock().await;

        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        let payload = payload.ok_or(UserError::MissingPayload)?;
        let changes = self.validate_changes(id, &payload).await?;

        user.apply(changes);
        let updated = self.repository.update(user).await?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(updated)
    }

    /// Delete a user
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        let _guard = self.write_lock.lock().await;

        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id.to_string()));
        }

        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    async fn validate_changes(&self, id: Uuid, payload: &UserPayload) -> UserResult<UserChanges> {
        let name = payload
            .get("name")
            .map(|value| validate_name(value, NAME_NON_EMPTY))
            .transpose()?;

        let email = match payload.get("email") {
            Some(value) => {
                let email = validate_email(value)?;
                match self.repository.email_owner(&email).await? {
                    Some(owner) if owner != id => return Err(UserError::DuplicateEmail(email)),
                    _ => Some(email),
                }
            }
            None => None,
        };

        let age = payload.get("age").map(validate_age).transpose()?;

        Ok(UserChanges { name, email, age })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;
    use serde_json::{Value, json};
    use std::collections::HashSet;

    fn service() -> UserService<InMemoryUserRepository> {
        UserService::new(InMemoryUserRepository::new())
    }

    fn payload(value: Value) -> Option<UserPayload> {
        UserPayload::from_json(Some(value))
    }

    async fn create(
        service: &UserService<InMemoryUserRepository>,
        name: &str,
        email: &str,
        age: u8,
    ) -> User {
        service
            .create_user(payload(json!({ "name": name, "email": email, "age": age })))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_stored_user() {
        let service = service();

        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        assert_eq!(ann.name, "Ann");
        assert_eq!(ann.email, "ann@x.com");
        assert_eq!(ann.age, 30);
        assert_eq!(service.get_user(ann.id).await.unwrap(), ann);
    }

    #[tokio::test]
    async fn test_create_check_order() {
        let service = service();
        create(&service, "Ann", "ann@x.com", 30).await;

        let cases = [
            (None, UserError::MissingPayload),
            (payload(json!({})), UserError::MissingPayload),
            (
                payload(json!({ "name": "", "email": "bad", "age": 500 })),
                UserError::InvalidName(NAME_REQUIRED),
            ),
            (
                payload(json!({ "email": "c@x.com", "age": 10 })),
                UserError::InvalidName(NAME_REQUIRED),
            ),
            (
                payload(json!({ "name": "Bob", "email": "bad", "age": 500 })),
                UserError::InvalidEmail,
            ),
            (
                payload(json!({ "name": "Bob", "email": "ann@x.com", "age": 500 })),
                UserError::InvalidAge,
            ),
            (
                payload(json!({ "name": "Bob", "email": "ann@x.com", "age": 40 })),
                UserError::DuplicateEmail("ann@x.com".to_string()),
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(service.create_user(input).await, Err(expected));
        }

        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_creates_have_unique_ids() {
        let service = service();
        let mut ids = HashSet::new();

        for i in 0..50 {
            let user = create(&service, "User", &format!("user{i}@x.com"), 20).await;
            assert!(ids.insert(user.id));
        }
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let id = Uuid::new_v4();
        assert_eq!(service().get_user(id).await, Err(UserError::NotFound(id.to_string())));
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        let updated = service
            .update_user(ann.id, payload(json!({ "age": 31 })))
            .await
            .unwrap();

        assert_eq!(updated.id, ann.id);
        assert_eq!(updated.name, "Ann");
        assert_eq!(updated.email, "ann@x.com");
        assert_eq!(updated.age, 31);
        assert_eq!(service.get_user(ann.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_invalid_age_leaves_record_unchanged() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        let result = service
            .update_user(ann.id, payload(json!({ "age": 150 })))
            .await;

        assert_eq!(result, Err(UserError::InvalidAge));
        assert_eq!(service.get_user(ann.id).await.unwrap().age, 30);
    }

    #[tokio::test]
    async fn test_update_is_all_or_nothing() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        let result = service
            .update_user(
                ann.id,
                payload(json!({ "name": "Annie", "email": "annie@x.com", "age": -1 })),
            )
            .await;

        assert_eq!(result, Err(UserError::InvalidAge));
        assert_eq!(service.get_user(ann.id).await.unwrap(), ann);
        // The email that would have been set was never claimed
        create(&service, "Other", "annie@x.com", 5).await;
    }

    #[tokio::test]
    async fn test_update_name_uses_update_wording() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        let result = service
            .update_user(ann.id, payload(json!({ "name": "  " })))
            .await;

        assert_eq!(result, Err(UserError::InvalidName(NAME_NON_EMPTY)));
    }

    #[tokio::test]
    async fn test_update_explicit_null_is_validated() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        let result = service
            .update_user(ann.id, payload(json!({ "email": null })))
            .await;

        assert_eq!(result, Err(UserError::InvalidEmail));
    }

    #[tokio::test]
    async fn test_update_email_uniqueness_excludes_self() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;
        let bob = create(&service, "Bob", "bob@x.com", 40).await;

        let same = service
            .update_user(ann.id, payload(json!({ "email": "ann@x.com" })))
            .await
            .unwrap();
        assert_eq!(same.email, "ann@x.com");

        // Duplicate is reported before the invalid age
        let taken = service
            .update_user(bob.id, payload(json!({ "email": "ann@x.com", "age": 999 })))
            .await;
        assert_eq!(taken, Err(UserError::DuplicateEmail("ann@x.com".to_string())));
    }

    #[tokio::test]
    async fn test_update_not_found_before_payload_checks() {
        let service = service();
        let id = Uuid::new_v4();

        assert_eq!(service.update_user(id, None).await, Err(UserError::NotFound(id.to_string())));
        assert_eq!(
            service
                .update_user(id, payload(json!({ "name": "" })))
                .await,
            Err(UserError::NotFound(id.to_string()))
        );
    }

    #[tokio::test]
    async fn test_update_without_payload() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        assert_eq!(
            service.update_user(ann.id, payload(json!({}))).await,
            Err(UserError::MissingPayload)
        );
    }

    #[tokio::test]
    async fn test_delete_is_final() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;

        service.delete_user(ann.id).await.unwrap();

        assert_eq!(service.get_user(ann.id).await, Err(UserError::NotFound(ann.id.to_string())));
        assert_eq!(
            service
                .update_user(ann.id, payload(json!({ "age": 1 })))
                .await,
            Err(UserError::NotFound(ann.id.to_string()))
        );
        assert_eq!(
            service.delete_user(ann.id).await,
            Err(UserError::NotFound(ann.id.to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_after_create_and_delete() {
        let service = service();
        let ann = create(&service, "Ann", "ann@x.com", 30).await;
        let bob = create(&service, "Bob", "bob@x.com", 40).await;

        service.delete_user(ann.id).await.unwrap();

        assert_eq!(service.list_users().await.unwrap(), vec![bob]);
    }

    #[tokio::test]
    async fn test_concurrent_creates_keep_emails_unique() {
        let service = service();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_user(payload(json!({
                            "name": format!("User {i}"),
                            "email": "shared@x.com",
                            "age": 20,
                        })))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, UserError::DuplicateEmail(_))),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_update_and_create_keep_emails_unique() {
        for _ in 0..20 {
            let service = service();
            let ann = create(&service, "Ann", "ann@x.com", 30).await;

            let updater = {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .update_user(ann.id, payload(json!({ "email": "shared@x.com" })))
                        .await
                })
            };
            let creator = {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_user(payload(json!({
                            "name": "Bob",
                            "email": "shared@x.com",
                            "age": 40,
                        })))
                        .await
                })
            };

            let updated = updater.await.unwrap();
            let created = creator.await.unwrap();

            // Exactly one side claims the address, the other sees it taken
            assert_ne!(updated.is_ok(), created.is_ok());
            let duplicate = UserError::DuplicateEmail("shared@x.com".to_string());
            match (updated, created) {
                (Ok(_), Err(err)) | (Err(err), Ok(_)) => assert_eq!(err, duplicate),
                other => panic!("unexpected outcome: {other:?}"),
            }

            let holders = service
                .list_users()
                .await
                .unwrap()
                .into_iter()
                .filter(|user| user.email == "shared@x.com")
                .count();
            assert_eq!(holders, 1);
        }
    }
}
