use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{FeatureCache, FeatureRecord, RemoteFeatureSource};

/// How [`EvaluationEngine::evaluate`] reached its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationReason {
    /// The feature could not be looked up; the caller-provided default was returned.
    Default,
    /// Local targeting rules decided.
    Targeting,
    /// The remote authority confirmed the user is part of an ongoing rollout.
    Reconciled,
}

/// Result of a feature evaluation along with the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDetails {
    /// Whether the feature is enabled.
    pub enabled: bool,
    /// How the answer was reached.
    pub reason: EvaluationReason,
}

/// Decides whether a feature is enabled, consulting the cache before the remote source.
///
/// A `cache_timeout` of zero disables caching: the cache is neither read nor written and every
/// evaluation fetches the feature from the remote source.
pub struct EvaluationEngine {
    cache: Arc<dyn FeatureCache + Send + Sync>,
    source: Arc<dyn RemoteFeatureSource + Send + Sync>,
    cache_timeout: Duration,
}

impl EvaluationEngine {
    /// Create an engine over the given cache and remote source.
    pub fn new(
        cache: Arc<dyn FeatureCache + Send + Sync>,
        source: Arc<dyn RemoteFeatureSource + Send + Sync>,
        cache_timeout: Duration,
    ) -> EvaluationEngine {
        EvaluationEngine {
            cache,
            source,
            cache_timeout,
        }
    }

    /// Returns `true` unless caching has been disabled with a zero timeout.
    pub fn is_caching_enabled(&self) -> bool {
        !self.cache_timeout.is_zero()
    }

    /// Returns `true` if the feature is enabled for the user. If the feature cannot be looked up,
    /// `default` is returned.
    pub fn is_enabled(&self, feature_key: &str, user_identifier: Option<&str>, default: bool) -> bool {
        self.evaluate(feature_key, user_identifier, default).enabled
    }

    /// Same as [`EvaluationEngine::is_enabled`] but also reports how the answer was reached.
    pub fn evaluate(
        &self,
        feature_key: &str,
        user_identifier: Option<&str>,
        default: bool,
    ) -> EvaluationDetails {
        let Some(feature) = self.lookup(feature_key) else {
            return EvaluationDetails {
                enabled: default,
                reason: EvaluationReason::Default,
            };
        };

        let enabled = feature.enabled_for_user(user_identifier);

        log::trace!(target: "featureswitches",
                    feature_key,
                    user_identifier:serde = user_identifier,
                    enabled;
                    "evaluated targeting rules");

        if !enabled && feature.is_rolling_out() && self.reconcile(feature_key, &feature, user_identifier) {
            return EvaluationDetails {
                enabled: true,
                reason: EvaluationReason::Reconciled,
            };
        }

        EvaluationDetails {
            enabled,
            reason: EvaluationReason::Targeting,
        }
    }

    /// Store a record received outside of evaluation (e.g., bulk sync). No-op when caching is
    /// disabled.
    pub(crate) fn store(&self, feature: FeatureRecord) {
        if self.is_caching_enabled() {
            let key = feature.key.clone();
            self.cache.set(&key, Arc::new(feature), self.cache_timeout);
        }
    }

    fn lookup(&self, feature_key: &str) -> Option<Arc<FeatureRecord>> {
        if self.is_caching_enabled() {
            if let Some(feature) = self.cache.get(feature_key) {
                return Some(feature);
            }
        }

        match self.source.fetch_feature(feature_key) {
            Ok(feature) => {
                let feature = Arc::new(feature);
                if self.is_caching_enabled() {
                    self.cache
                        .set(feature_key, feature.clone(), self.cache_timeout);
                }
                Some(feature)
            }
            Err(err) => {
                log::warn!(target: "featureswitches",
                           feature_key;
                           "failed to fetch feature, returning default: {:?}", err);
                None
            }
        }
    }

    /// Ask the remote source whether the user is part of an ongoing rollout. On success the user
    /// is remembered in the cached allow-list so the next evaluation resolves locally.
    ///
    /// The updated record is stored with a fresh TTL, so a feature that keeps including new users
    /// stays cached for as long as inclusions keep coming.
    fn reconcile(
        &self,
        feature_key: &str,
        feature: &FeatureRecord,
        user_identifier: Option<&str>,
    ) -> bool {
        match self.source.check_user_enabled(feature_key, user_identifier) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                log::debug!(target: "featureswitches",
                            feature_key,
                            user_identifier:serde = user_identifier;
                            "remote rollout check failed: {:?}", err);
                return false;
            }
        }

        log::debug!(target: "featureswitches",
                    feature_key,
                    user_identifier:serde = user_identifier;
                    "user is included in rollout");

        if let (true, Some(user_identifier)) = (self.is_caching_enabled(), user_identifier) {
            // Whole-record replace. A concurrent inclusion for another user may be lost, which
            // only costs another remote check later.
            self.cache.set(
                feature_key,
                Arc::new(feature.with_included_user(user_identifier)),
                self.cache_timeout,
            );
        }

        true
    }
}
