//! [`RemoteFeatureSource`] backed by the FeatureSwitches HTTP API.
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use reqwest::{header::AUTHORIZATION, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    feature::TryParse,
    feature_source::{RemoteFeatureSource, User},
    Error, FeatureRecord, Result,
};

const AUTHENTICATE_ENDPOINT: &str = "authenticate";
const FEATURES_ENDPOINT: &str = "features";
const FEATURE_ENDPOINT: &str = "feature";
const FEATURE_ENABLED_ENDPOINT: &str = "feature/enabled";
const ADD_USER_ENDPOINT: &str = "user/add";

const USER_AGENT: &str = concat!("FeatureSwitches-Rust/", env!("CARGO_PKG_VERSION"));

pub(crate) struct HttpFeatureSourceConfig {
    pub base_url: String,
    pub customer_key: String,
    pub environment_key: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct FeatureResponse {
    #[serde(default)]
    feature: Option<TryParse<FeatureRecord>>,
}

#[derive(Debug, Deserialize)]
struct FeaturesResponse {
    #[serde(default)]
    features: Vec<TryParse<FeatureRecord>>,
}

#[derive(Debug, Deserialize)]
struct FeatureEnabledResponse {
    enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

/// A client for the FeatureSwitches API.
pub struct HttpFeatureSource {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    base_url: Url,
    authorization: String,
    /// If we receive a 401 Unauthorized error during a request, it means the keys are not valid.
    /// We remember this so we don't issue additional requests to the server.
    unauthorized: AtomicBool,
}

impl HttpFeatureSource {
    pub(crate) fn new(config: HttpFeatureSourceConfig) -> Result<HttpFeatureSource> {
        let mut base_url = config.base_url;
        // Endpoints are joined relative to the base url, which only keeps the last path segment
        // when it ends with a slash.
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url).map_err(Error::InvalidBaseUrl)?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(HttpFeatureSource {
            client,
            base_url,
            authorization: format!("{}:{}", config.customer_key, config.environment_key),
            unauthorized: AtomicBool::new(false),
        })
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(endpoint).map_err(Error::InvalidBaseUrl)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = self.url(endpoint, params)?;
        self.send(self.client.get(url))
    }

    fn send<T: DeserializeOwned>(&self, request: reqwest::blocking::RequestBuilder) -> Result<T> {
        if self.unauthorized.load(Ordering::Relaxed) {
            return Err(Error::Unauthorized);
        }

        let response = request.header(AUTHORIZATION, self.authorization.as_str()).send()?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text()?;
                Ok(serde_json::from_str(&body)?)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                log::warn!(target: "featureswitches", "client is not authorized. Check your customer and environment keys");
                self.unauthorized.store(true, Ordering::Relaxed);
                Err(Error::Unauthorized)
            }
            status => {
                let ErrorResponse { message } = response.json::<ErrorResponse>().unwrap_or_default();
                log::debug!(target: "featureswitches", "received non-200 response: {:?} {}", status, message);
                Err(Error::UnexpectedStatus {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl RemoteFeatureSource for HttpFeatureSource {
    fn authenticate(&self) -> Result<()> {
        self.get::<serde_json::Value>(AUTHENTICATE_ENDPOINT, &[])?;
        Ok(())
    }

    fn fetch_feature(&self, feature_key: &str) -> Result<FeatureRecord> {
        log::debug!(target: "featureswitches", feature_key; "fetching feature");

        let response: FeatureResponse =
            match self.get(FEATURE_ENDPOINT, &[("feature_key", feature_key)]) {
                Ok(response) => response,
                Err(Error::UnexpectedStatus { status: 404, .. }) => {
                    return Err(Error::FeatureNotFound)
                }
                Err(Error::MalformedResponse(err)) => {
                    log::warn!(target: "featureswitches", feature_key; "failed to parse feature response body: {:?}", err);
                    return Err(Error::FeatureNotFound);
                }
                Err(err) => return Err(err),
            };

        match response.feature {
            Some(TryParse::Parsed(feature)) => Ok(feature),
            Some(TryParse::ParseFailed(value)) => {
                log::warn!(target: "featureswitches", feature_key; "received malformed feature record: {}", value);
                Err(Error::FeatureNotFound)
            }
            None => Err(Error::FeatureNotFound),
        }
    }

    fn check_user_enabled(
        &self,
        feature_key: &str,
        user_identifier: Option<&str>,
    ) -> Result<bool> {
        let mut params = vec![("feature_key", feature_key)];
        // Anonymous checks leave the identifier out rather than sending an empty one.
        if let Some(user_identifier) = user_identifier {
            params.push(("user_identifier", user_identifier));
        }

        let response: FeatureEnabledResponse = self.get(FEATURE_ENABLED_ENDPOINT, &params)?;
        Ok(response.enabled)
    }

    fn fetch_all_features(&self) -> Result<Vec<FeatureRecord>> {
        log::debug!(target: "featureswitches", "fetching all features");

        let response: FeaturesResponse = self.get(FEATURES_ENDPOINT, &[])?;
        Ok(parse_features(response))
    }

    fn add_user(&self, user: &User) -> Result<()> {
        let url = self.url(ADD_USER_ENDPOINT, &[])?;
        self.send::<serde_json::Value>(self.client.post(url).form(user))?;
        Ok(())
    }
}

fn parse_features(response: FeaturesResponse) -> Vec<FeatureRecord> {
    response
        .features
        .into_iter()
        .filter_map(|feature| match feature {
            TryParse::Parsed(feature) => Some(feature),
            TryParse::ParseFailed(value) => {
                log::warn!(target: "featureswitches", "skipping malformed feature record: {}", value);
                None
            }
        })
        .collect()
}
