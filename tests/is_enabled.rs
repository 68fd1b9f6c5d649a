use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use featureswitches::{
    Client, ClientConfig, Error, FeatureCache, FeatureRecord, InMemoryFeatureCache,
    RemoteFeatureSource, Result, User,
};

#[derive(Default)]
struct Calls {
    fetch_feature: AtomicUsize,
    check_user_enabled: AtomicUsize,
}

struct FakeSource {
    features: HashMap<String, FeatureRecord>,
    enabled_users: HashSet<String>,
    calls: Arc<Calls>,
}

impl RemoteFeatureSource for FakeSource {
    fn authenticate(&self) -> Result<()> {
        Ok(())
    }

    fn fetch_feature(&self, feature_key: &str) -> Result<FeatureRecord> {
        self.calls.fetch_feature.fetch_add(1, Ordering::SeqCst);
        self.features
            .get(feature_key)
            .cloned()
            .ok_or(Error::FeatureNotFound)
    }

    fn check_user_enabled(
        &self,
        _feature_key: &str,
        user_identifier: Option<&str>,
    ) -> Result<bool> {
        self.calls.check_user_enabled.fetch_add(1, Ordering::SeqCst);
        Ok(user_identifier.is_some_and(|u| self.enabled_users.contains(u)))
    }

    fn fetch_all_features(&self) -> Result<Vec<FeatureRecord>> {
        Ok(self.features.values().cloned().collect())
    }

    fn add_user(&self, _user: &User) -> Result<()> {
        Ok(())
    }
}

struct SharedCache(Arc<InMemoryFeatureCache>);

impl FeatureCache for SharedCache {
    fn get(&self, key: &str) -> Option<Arc<FeatureRecord>> {
        self.0.get(key)
    }

    fn set(&self, key: &str, record: Arc<FeatureRecord>, ttl: Duration) {
        self.0.set(key, record, ttl)
    }
}

struct Setup {
    client: Client,
    calls: Arc<Calls>,
    cache: Arc<InMemoryFeatureCache>,
}

fn setup(feature: FeatureRecord, enabled_users: &[&str], cache_timeout: Duration) -> Setup {
    let _ = env_logger::builder().is_test(true).try_init();

    let calls = Arc::new(Calls::default());
    let cache = Arc::new(InMemoryFeatureCache::new());
    let source = FakeSource {
        features: [(feature.key.clone(), feature)].into_iter().collect(),
        enabled_users: enabled_users.iter().map(|u| u.to_string()).collect(),
        calls: calls.clone(),
    };

    let client = ClientConfig::from_keys("customer", "environment")
        .cache_timeout(cache_timeout)
        .feature_source(source)
        .cache(SharedCache(cache.clone()))
        .to_client()
        .unwrap();

    Setup {
        client,
        calls,
        cache,
    }
}

fn rollout() -> FeatureRecord {
    FeatureRecord {
        rollout_target: 50,
        rollout_progress: 20,
        ..FeatureRecord::new("f")
    }
}

#[test]
fn partial_rollout_rejected_user() {
    let Setup {
        client,
        calls,
        cache,
    } = setup(rollout(), &[], Duration::from_secs(300));

    assert!(!client.is_enabled("f", Some("alice"), false));

    assert_eq!(calls.check_user_enabled.load(Ordering::SeqCst), 1);
    assert!(cache.get("f").unwrap().include_users.is_empty());
}

#[test]
fn partial_rollout_accepted_user_is_sticky() {
    let Setup {
        client,
        calls,
        cache,
    } = setup(rollout(), &["bob"], Duration::from_secs(300));

    assert!(client.is_enabled("f", Some("bob"), false));
    assert_eq!(cache.get("f").unwrap().include_users, vec!["bob".to_owned()]);

    assert!(client.is_enabled("f", Some("bob"), false));
    assert_eq!(calls.check_user_enabled.load(Ordering::SeqCst), 1);
    assert_eq!(calls.fetch_feature.load(Ordering::SeqCst), 1);
}

#[test]
fn cache_disabled_refetches_on_every_call() {
    let Setup {
        client,
        calls,
        cache,
    } = setup(FeatureRecord::new("f"), &[], Duration::ZERO);

    for _ in 0..3 {
        assert!(client.is_enabled("f", Some("alice"), false));
    }

    assert_eq!(calls.fetch_feature.load(Ordering::SeqCst), 3);
    assert!(cache.is_empty());
}

#[test]
fn unknown_feature_returns_default() {
    let Setup { client, .. } = setup(FeatureRecord::new("f"), &[], Duration::from_secs(300));

    assert!(client.is_enabled("unknown", Some("alice"), true));
    assert!(!client.is_enabled("unknown", None, false));
}

#[test]
fn disabled_feature_ignores_targeting() {
    let feature = FeatureRecord {
        enabled: false,
        include_users: vec!["alice".to_owned()],
        ..rollout()
    };
    let Setup { client, calls, .. } = setup(feature, &["alice"], Duration::from_secs(300));

    assert!(!client.is_enabled("f", Some("alice"), true));
    assert!(!client.is_enabled("f", None, true));
    assert_eq!(calls.check_user_enabled.load(Ordering::SeqCst), 0);
}
