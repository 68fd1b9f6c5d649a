use std::sync::Arc;

use crate::{
    engine::{EvaluationDetails, EvaluationEngine},
    ClientConfig, RemoteFeatureSource, Result, User,
};

/// A client for the FeatureSwitches API.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// Features are fetched lazily on first evaluation and cached for
/// [`ClientConfig::cache_timeout`]. Call [`Client::sync`] to warm the cache with all features
/// at once.
///
/// # Examples
/// ```no_run
/// # use featureswitches::ClientConfig;
/// let client = ClientConfig::from_keys("customer-key", "environment-key")
///     .to_client()
///     .unwrap();
/// let _ = client.sync();
///
/// if client.is_enabled("new-dashboard", Some("user-42"), false) {
///     // show the new dashboard
/// }
/// ```
pub struct Client {
    engine: EvaluationEngine,
    source: Arc<dyn RemoteFeatureSource + Send + Sync>,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    ///
    /// ```
    /// # use featureswitches::{Client, ClientConfig};
    /// let client = Client::new(ClientConfig::from_keys("customer-key", "environment-key"));
    /// ```
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        let cache = config.build_cache();
        let source = config.build_feature_source()?;

        Ok(Client {
            engine: EvaluationEngine::new(cache, source.clone(), config.cache_timeout),
            source,
        })
    }

    /// Check that the customer and environment keys are accepted by the server.
    pub fn authenticate(&self) -> bool {
        self.source
            .authenticate()
            .map_err(|err| {
                log::warn!(target: "featureswitches", "authentication failed: {:?}", err);
            })
            .is_ok()
    }

    /// Fetch all features and store them in the cache.
    ///
    /// Does nothing if caching is disabled.
    ///
    /// # Errors
    ///
    /// Returns the transport error if features could not be fetched. The cache is left as is in
    /// that case, so it is safe to ignore the error.
    pub fn sync(&self) -> Result<()> {
        if !self.engine.is_caching_enabled() {
            return Ok(());
        }

        let features = self.source.fetch_all_features().map_err(|err| {
            log::warn!(target: "featureswitches", "failed to sync features: {:?}", err);
            err
        })?;

        log::debug!(target: "featureswitches", count = features.len(); "synced features");

        for feature in features {
            self.engine.store(feature);
        }

        Ok(())
    }

    /// Returns `true` if the feature is enabled for the user.
    ///
    /// Pass `None` as `user_identifier` for anonymous callers; they only get features without
    /// user targeting. If the feature cannot be looked up (unknown key, server unreachable),
    /// `default` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// # fn test(client: &featureswitches::Client) {
    /// let enabled = client.is_enabled("new-dashboard", Some("user-42"), false);
    /// # }
    /// ```
    pub fn is_enabled(&self, feature_key: &str, user_identifier: Option<&str>, default: bool) -> bool {
        self.engine.is_enabled(feature_key, user_identifier, default)
    }

    /// Same as [`Client::is_enabled`] but also reports how the answer was reached. Useful for
    /// debugging.
    pub fn is_enabled_details(
        &self,
        feature_key: &str,
        user_identifier: Option<&str>,
        default: bool,
    ) -> EvaluationDetails {
        self.engine.evaluate(feature_key, user_identifier, default)
    }

    /// Register a user profile with the server. Returns `true` on success.
    pub fn add_user(&self, user: &User) -> bool {
        self.source
            .add_user(user)
            .map_err(|err| {
                log::warn!(target: "featureswitches", user_identifier = user.user_identifier.as_str(); "failed to add user: {:?}", err);
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use crate::{
        engine::tests::FakeSource, ClientConfig, EvaluationReason, FeatureCache, FeatureRecord,
        InMemoryFeatureCache, RemoteFeatureSource, Result, User,
    };

    fn features() -> Vec<FeatureRecord> {
        vec![
            FeatureRecord::new("a"),
            FeatureRecord {
                include_users: vec!["alice".to_owned()],
                ..FeatureRecord::new("b")
            },
        ]
    }

    // Lets a test keep a handle on the source it hands over to the client.
    struct Shared<T>(Arc<T>);

    impl<T: RemoteFeatureSource> RemoteFeatureSource for Shared<T> {
        fn authenticate(&self) -> Result<()> {
            self.0.authenticate()
        }
        fn fetch_feature(&self, feature_key: &str) -> Result<FeatureRecord> {
            self.0.fetch_feature(feature_key)
        }
        fn check_user_enabled(
            &self,
            feature_key: &str,
            user_identifier: Option<&str>,
        ) -> Result<bool> {
            self.0.check_user_enabled(feature_key, user_identifier)
        }
        fn fetch_all_features(&self) -> Result<Vec<FeatureRecord>> {
            self.0.fetch_all_features()
        }
        fn add_user(&self, user: &User) -> Result<()> {
            self.0.add_user(user)
        }
    }

    impl<T: FeatureCache> FeatureCache for Shared<T> {
        fn get(&self, key: &str) -> Option<Arc<FeatureRecord>> {
            self.0.get(key)
        }
        fn set(&self, key: &str, record: Arc<FeatureRecord>, ttl: Duration) {
            self.0.set(key, record, ttl)
        }
    }

    #[test]
    fn sync_populates_cache() {
        let source = Arc::new(FakeSource::with_features(features()));
        let cache = Arc::new(InMemoryFeatureCache::new());
        let client = ClientConfig::from_keys("customer", "environment")
            .feature_source(Shared(source.clone()))
            .cache(Shared(cache.clone()))
            .to_client()
            .unwrap();

        client.sync().unwrap();

        assert_eq!(cache.len(), 2);
        assert!(client.is_enabled("a", None, false));
        assert!(client.is_enabled("b", Some("alice"), false));
        assert!(!client.is_enabled("b", Some("bob"), true));
        assert_eq!(source.fetch_calls(), 0);
    }

    #[test]
    fn sync_is_skipped_when_caching_disabled() {
        let source = Arc::new(FakeSource {
            unreachable: true,
            ..FakeSource::with_features(features())
        });
        let cache = Arc::new(InMemoryFeatureCache::new());
        let client = ClientConfig::from_keys("customer", "environment")
            .cache_timeout(Duration::ZERO)
            .feature_source(Shared(source.clone()))
            .cache(Shared(cache.clone()))
            .to_client()
            .unwrap();

        // An unreachable source would fail the sync if it was attempted.
        assert!(client.sync().is_ok());
        assert!(cache.is_empty());
    }

    #[test]
    fn sync_reports_transport_errors() {
        let client = ClientConfig::from_keys("customer", "environment")
            .feature_source(FakeSource {
                unreachable: true,
                ..FakeSource::default()
            })
            .to_client()
            .unwrap();

        assert!(client.sync().is_err());
    }

    #[test]
    fn add_user_and_authenticate_pass_through() {
        let source = Arc::new(FakeSource::default());
        let client = ClientConfig::from_keys("customer", "environment")
            .feature_source(Shared(source.clone()))
            .to_client()
            .unwrap();

        assert!(client.authenticate());
        assert!(client.add_user(&User::new("user-42").customer_identifier("acme")));
        assert_eq!(
            *source.users.lock().unwrap(),
            vec![User::new("user-42").customer_identifier("acme")]
        );
    }

    #[test]
    fn failures_become_false() {
        let client = ClientConfig::from_keys("customer", "environment")
            .feature_source(FakeSource {
                unreachable: true,
                ..FakeSource::default()
            })
            .to_client()
            .unwrap();

        assert!(!client.authenticate());
        assert!(!client.add_user(&User::new("user-42")));
    }

    #[test]
    fn details_report_default() {
        let client = ClientConfig::from_keys("customer", "environment")
            .feature_source(FakeSource::default())
            .to_client()
            .unwrap();

        let details = client.is_enabled_details("missing", None, true);

        assert!(details.enabled);
        assert_eq!(details.reason, EvaluationReason::Default);
    }
}
