//! Shared test utilities for domain testing
//!
//! - `TestDataBuilder`: deterministic, collision-free test data
//! - `http`: request builders and body readers for `tower::ServiceExt::oneshot` tests
//! - `assertions`: custom assertion helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, http};
//!
//! let builder = TestDataBuilder::from_test_name("my_test");
//! let body = serde_json::json!({
//!     "name": builder.name("user", "main"),
//!     "email": builder.email("main"),
//!     "age": 30,
//! });
//! let request = http::json_request("POST", "/", &body);
//! ```

pub mod http;

/// Builder for test data with deterministic randomization
///
/// Two builders created from the same test name produce the same values, and
/// different test names produce different values, so tests sharing a store
/// never collide on unique fields.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_user");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique name for testing
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let name = TestDataBuilder::new(7).name("user", "main");
    /// assert_eq!(name, "test-user-7-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Generate a unique, well-formed email address
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let email = TestDataBuilder::new(7).email("main");
    /// assert_eq!(email, "main.7@example.com");
    /// ```
    pub fn email(&self, local: &str) -> String {
        format!("{}.{}@example.com", local, self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    use serde_json::Value;

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that a JSON body is exactly `{"error": expected}`
    pub fn assert_error_body(body: &Value, expected: &str) {
        let object = body
            .as_object()
            .unwrap_or_else(|| panic!("expected error object, got {}", body));
        assert_eq!(object.len(), 1, "error body has extra fields: {}", body);
        assert_eq!(
            object.get("error").and_then(Value::as_str),
            Some(expected),
            "unexpected error body: {}",
            body
        );
    }
}
