use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier, assigned on create and never changed
    pub id: Uuid,
    /// Display name, non-blank
    pub name: String,
    /// Email address (unique across all users)
    pub email: String,
    /// Age in years, 0..=120
    #[schema(minimum = 0, maximum = 120)]
    pub age: u8,
}

/// Validated input for creating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[schema(minimum = 0, maximum = 120)]
    pub age: u8,
}

/// Validated partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(minimum = 0, maximum = 120)]
    pub age: Option<u8>,
}

impl User {
    /// Create a user with a fresh random identifier
    pub fn new(input: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            age: input.age,
        }
    }

    /// Copy every present field of `changes` onto the record
    pub fn apply(&mut self, changes: UserChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(age) = changes.age {
            self.age = age;
        }
    }
}

static NULL: Value = Value::Null;

/// Loosely-typed request body: the JSON object exactly as the client sent it.
///
/// Only non-empty objects count as a payload. Fields are checked one by one
/// by [`crate::validation`] before anything typed is built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPayload(Map<String, Value>);

impl UserPayload {
    /// Returns `None` for a missing body, a non-object document or `{}`.
    pub fn from_json(body: Option<Value>) -> Option<Self> {
        match body {
            Some(Value::Object(map)) if !map.is_empty() => Some(Self(map)),
            _ => None,
        }
    }

    /// Field value if the key was sent at all (even as `null`).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field value, treating an absent key as `null`.
    pub fn field(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}
