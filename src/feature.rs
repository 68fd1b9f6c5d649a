use serde::{Deserialize, Serialize};

/// Targeting configuration of a single feature at a point in time.
///
/// Records are immutable once received from the server. The only sanctioned change is adding a
/// user to the allow-list after a successful remote check, which produces a new record (see
/// [`FeatureRecord::with_included_user`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Unique feature key.
    #[serde(rename = "feature_key")]
    pub key: String,
    /// Master switch. When `false`, the feature is off for everyone.
    pub enabled: bool,
    /// Percentage of users the feature should eventually be enabled for. `0` means no
    /// percentage-based rollout.
    #[serde(default)]
    pub rollout_target: u32,
    /// Percentage of users the feature is currently enabled for server-side.
    #[serde(default)]
    pub rollout_progress: u32,
    /// Users that always get the feature. When non-empty, nobody else does.
    #[serde(default)]
    pub include_users: Vec<String>,
    /// Users that never get the feature.
    #[serde(default)]
    pub exclude_users: Vec<String>,
}

impl FeatureRecord {
    /// Create an enabled record with no targeting.
    pub fn new(key: impl Into<String>) -> FeatureRecord {
        FeatureRecord {
            key: key.into(),
            enabled: true,
            rollout_target: 0,
            rollout_progress: 0,
            include_users: Vec::new(),
            exclude_users: Vec::new(),
        }
    }

    /// Returns `true` if the record restricts the feature to a subset of users.
    pub fn has_targeting(&self) -> bool {
        self.rollout_target > 0 || !self.include_users.is_empty() || !self.exclude_users.is_empty()
    }

    /// Returns `true` if the feature is switched on but the server has not finished rolling it
    /// out yet. Only in this state does a remote per-user check make sense.
    pub fn is_rolling_out(&self) -> bool {
        self.enabled && self.rollout_progress < self.rollout_target
    }

    /// Apply targeting rules locally.
    ///
    /// The allow-list takes precedence over the deny-list, which takes precedence over the
    /// rollout percentage. Percentage bucketing itself is never done locally: a pending rollout
    /// evaluates to `false` here.
    pub fn enabled_for_user(&self, user_identifier: Option<&str>) -> bool {
        if !self.enabled {
            return false;
        }

        let Some(user_identifier) = user_identifier else {
            // Anonymous callers cannot match per-user rules.
            return !self.has_targeting();
        };

        if !self.include_users.is_empty() {
            self.include_users.iter().any(|u| u == user_identifier)
        } else if !self.exclude_users.is_empty() {
            !self.exclude_users.iter().any(|u| u == user_identifier)
        } else {
            self.rollout_target == 0
        }
    }

    /// Return a copy of the record with `user_identifier` appended to the allow-list.
    pub fn with_included_user(&self, user_identifier: &str) -> FeatureRecord {
        let mut record = self.clone();
        if !record.include_users.iter().any(|u| u == user_identifier) {
            record.include_users.push(user_identifier.to_owned());
        }
        record
    }
}

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum TryParse<T> {
    Parsed(T),
    ParseFailed(serde_json::Value),
}
