use serde::{Deserialize, Serialize};

use crate::{FeatureRecord, Result};

#[cfg(doc)]
use crate::Error;

/// The remote authority for feature configuration.
///
/// Implementations own the transport and the wire format. They must report failures as
/// [`Error`] values and enforce their own timeouts. [`HttpFeatureSource`](crate::HttpFeatureSource)
/// talks to the FeatureSwitches API; tests usually provide a fake.
pub trait RemoteFeatureSource {
    /// Check that the configured credentials are accepted.
    fn authenticate(&self) -> Result<()>;

    /// Fetch the current record of a single feature.
    ///
    /// Returns [`Error::FeatureNotFound`] if the feature is unknown or its record is malformed.
    fn fetch_feature(&self, feature_key: &str) -> Result<FeatureRecord>;

    /// Ask the remote authority whether the feature is enabled for a single user. This is where
    /// percentage rollouts are bucketed. `None` stands for an anonymous caller.
    fn check_user_enabled(
        &self,
        feature_key: &str,
        user_identifier: Option<&str>,
    ) -> Result<bool>;

    /// Fetch records of all features in the environment.
    fn fetch_all_features(&self) -> Result<Vec<FeatureRecord>>;

    /// Register a user profile.
    fn add_user(&self, user: &User) -> Result<()>;
}

/// A user profile registered with [`Client::add_user`](crate::Client::add_user).
///
/// # Examples
/// ```
/// # use featureswitches::User;
/// let user = User::new("user-42").name("Jane Doe").email("jane@example.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier used in `is_enabled` calls.
    pub user_identifier: String,
    /// Customer (account) the user belongs to.
    pub customer_identifier: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

impl User {
    /// Create a profile with only the user identifier set.
    pub fn new(user_identifier: impl Into<String>) -> Self {
        User {
            user_identifier: user_identifier.into(),
            ..User::default()
        }
    }

    /// Set the customer (account) the user belongs to.
    pub fn customer_identifier(mut self, customer_identifier: impl Into<String>) -> Self {
        self.customer_identifier = customer_identifier.into();
        self
    }

    /// Set display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set contact email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}
