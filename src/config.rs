use std::{sync::Arc, time::Duration};

use crate::{
    http_source::{HttpFeatureSource, HttpFeatureSourceConfig},
    Client, FeatureCache, InMemoryFeatureCache, RemoteFeatureSource, Result,
};

/// Configuration for [`Client`].
///
/// # Examples
/// ```
/// # use std::time::Duration;
/// # use featureswitches::ClientConfig;
/// let client = ClientConfig::from_keys("customer-key", "environment-key")
///     .cache_timeout(Duration::from_secs(60))
///     .to_client()
///     .unwrap();
/// ```
pub struct ClientConfig {
    pub(crate) customer_key: String,
    pub(crate) environment_key: String,
    pub(crate) api: String,
    pub(crate) cache_timeout: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) cache: Option<Arc<dyn FeatureCache + Send + Sync>>,
    pub(crate) feature_source: Option<Arc<dyn RemoteFeatureSource + Send + Sync>>,
}

impl ClientConfig {
    /// Default base URL for API calls.
    pub const DEFAULT_API: &'static str = "https://api.featureswitches.com/v1/";

    /// Default lifetime of cached features.
    pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(300);

    /// Default timeout of a single API request.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a default configuration using the specified customer and environment keys.
    ///
    /// ```
    /// # use featureswitches::ClientConfig;
    /// ClientConfig::from_keys("customer-key", "environment-key");
    /// ```
    pub fn from_keys(customer_key: impl Into<String>, environment_key: impl Into<String>) -> Self {
        ClientConfig {
            customer_key: customer_key.into(),
            environment_key: environment_key.into(),
            api: ClientConfig::DEFAULT_API.to_owned(),
            cache_timeout: ClientConfig::DEFAULT_CACHE_TIMEOUT,
            request_timeout: ClientConfig::DEFAULT_REQUEST_TIMEOUT,
            cache: None,
            feature_source: None,
        }
    }

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    /// Set how long fetched features are reused before asking the server again.
    ///
    /// `Duration::ZERO` disables caching: every evaluation hits the server and
    /// [`Client::sync`] does nothing.
    pub fn cache_timeout(mut self, cache_timeout: Duration) -> Self {
        self.cache_timeout = cache_timeout;
        self
    }

    /// Set the timeout of a single API request.
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Use a custom feature cache instead of the in-process one, e.g., to share features between
    /// clients.
    pub fn cache(mut self, cache: impl FeatureCache + Send + Sync + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Use a custom remote source instead of the FeatureSwitches HTTP API. Keys, `api` and
    /// `request_timeout` are ignored in this case.
    pub fn feature_source(
        mut self,
        feature_source: impl RemoteFeatureSource + Send + Sync + 'static,
    ) -> Self {
        self.feature_source = Some(Arc::new(feature_source));
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// # Errors
    ///
    /// Fails if `api` is not a valid URL or the HTTP client cannot be initialized.
    pub fn to_client(self) -> Result<Client> {
        Client::new(self)
    }

    pub(crate) fn build_cache(&mut self) -> Arc<dyn FeatureCache + Send + Sync> {
        self.cache
            .take()
            .unwrap_or_else(|| Arc::new(InMemoryFeatureCache::new()))
    }

    pub(crate) fn build_feature_source(
        &mut self,
    ) -> Result<Arc<dyn RemoteFeatureSource + Send + Sync>> {
        if let Some(feature_source) = self.feature_source.take() {
            return Ok(feature_source);
        }

        Ok(Arc::new(HttpFeatureSource::new(HttpFeatureSourceConfig {
            base_url: self.api.clone(),
            customer_key: self.customer_key.clone(),
            environment_key: self.environment_key.clone(),
            request_timeout: self.request_timeout,
        })?))
    }
}
