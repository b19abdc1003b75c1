//! Cached approved-user and moderator lookups.
//!
//! Lookups fail open. If the provider errors, the caller gets an empty set and
//! proceeds as though the user has no special standing. Provider errors are
//! logged here and never returned.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use super::provider::{PermissionError, PermissionProvider};
use super::types::{normalize_community, PermissionKind, PermissionSet};
use crate::cache::{CacheStats, TtlCache, DEFAULT_TTL};
use crate::clock::{Clock, SystemClock};

/// Tuning for a [`PermissionResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long a fetched roster is served before refetching
    pub ttl: Duration,
    /// After a failed fetch, skip the provider for this long for that
    /// roster. Zero retries on every call.
    pub failure_backoff: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            failure_backoff: Duration::ZERO,
        }
    }
}

/// Occupancy of both roster caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResolverStats {
    pub approved_users: CacheStats,
    pub moderators: CacheStats,
}

pub struct PermissionResolver {
    provider: Arc<dyn PermissionProvider>,
    approved_users: TtlCache<String, PermissionSet>,
    moderators: TtlCache<String, PermissionSet>,
    /// Last failure time per (kind, community), only tracked with a backoff.
    /// Markers older than the backoff are pruned on every backoff check.
    failures: Mutex<HashMap<(PermissionKind, String), i64>>,
    failure_backoff_millis: i64,
    clock: Arc<dyn Clock>,
}

impl PermissionResolver {
    pub fn new(provider: Arc<dyn PermissionProvider>, config: ResolverConfig) -> Self {
        Self::with_clock(provider, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn PermissionProvider>,
        config: ResolverConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let failure_backoff_millis =
            i64::try_from(config.failure_backoff.as_millis()).unwrap_or(i64::MAX);

        Self {
            provider,
            approved_users: TtlCache::with_clock(config.ttl, Arc::clone(&clock)),
            moderators: TtlCache::with_clock(config.ttl, Arc::clone(&clock)),
            failures: Mutex::new(HashMap::new()),
            failure_backoff_millis,
            clock,
        }
    }

    /// Approved contributors of `community`. Empty if the provider failed.
    pub async fn get_approved_users(&self, community: &str) -> Arc<PermissionSet> {
        self.resolve(PermissionKind::ApprovedUser, community).await
    }

    /// Moderators of `community`. Empty if the provider failed.
    pub async fn get_moderators(&self, community: &str) -> Arc<PermissionSet> {
        self.resolve(PermissionKind::Moderator, community).await
    }

    pub async fn is_approved_user(&self, community: &str, username: &str) -> bool {
        self.get_approved_users(community).await.contains(username)
    }

    pub async fn is_moderator(&self, community: &str, username: &str) -> bool {
        self.get_moderators(community).await.contains(username)
    }

    /// Forget every cached roster and failure marker.
    pub async fn reset(&self) {
        self.approved_users.reset().await;
        self.moderators.reset().await;
        self.failures.lock().await.clear();
        log::info!("PermissionResolver: reset");
    }

    pub async fn stats(&self) -> ResolverStats {
        ResolverStats {
            approved_users: self.approved_users.stats().await,
            moderators: self.moderators.stats().await,
        }
    }

    fn cache_for(&self, kind: PermissionKind) -> &TtlCache<String, PermissionSet> {
        match kind {
            PermissionKind::ApprovedUser => &self.approved_users,
            PermissionKind::Moderator => &self.moderators,
        }
    }

    async fn resolve(&self, kind: PermissionKind, community: &str) -> Arc<PermissionSet> {
        let key = normalize_community(community);

        if self.in_backoff(kind, &key).await {
            log::debug!(
                "PermissionResolver: {} for {} in failure backoff, skipping provider",
                kind.label(),
                key
            );
            return Arc::new(PermissionSet::default());
        }

        let provider = Arc::clone(&self.provider);
        let result = self
            .cache_for(kind)
            .get(&key, move |community| {
                fetch_permission_set(provider, kind, community.clone())
            })
            .await;

        match result {
            Ok(set) => {
                if self.failure_backoff_millis > 0 {
                    self.failures.lock().await.remove(&(kind, key));
                }
                set
            }
            Err(e) => {
                log::warn!(
                    "PermissionResolver: failed to fetch {} for {}, treating as empty: {}",
                    kind.label(),
                    key,
                    e
                );
                if self.failure_backoff_millis > 0 {
                    let now = self.clock.now_millis();
                    self.failures.lock().await.insert((kind, key), now);
                }
                Arc::new(PermissionSet::default())
            }
        }
    }

    async fn in_backoff(&self, kind: PermissionKind, key: &str) -> bool {
        if self.failure_backoff_millis == 0 {
            return false;
        }

        let now = self.clock.now_millis();
        let backoff = self.failure_backoff_millis;
        let mut failures = self.failures.lock().await;
        let before = failures.len();
        failures.retain(|_, failed_at| now - *failed_at < backoff);
        if failures.len() < before {
            log::debug!(
                "PermissionResolver: pruned {} expired failure markers",
                before - failures.len()
            );
        }
        failures.contains_key(&(kind, key.to_string()))
    }
}

async fn fetch_permission_set(
    provider: Arc<dyn PermissionProvider>,
    kind: PermissionKind,
    community: String,
) -> Result<PermissionSet, PermissionError> {
    let usernames = match kind {
        PermissionKind::ApprovedUser => provider.approved_users(&community).await?,
        PermissionKind::Moderator => provider.moderators(&community).await?,
    };

    let set = PermissionSet::from_usernames(&usernames);
    log::debug!(
        "PermissionResolver: fetched {} {} for {}",
        set.len(),
        kind.label(),
        community
    );
    Ok(set)
}
