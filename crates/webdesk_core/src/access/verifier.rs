//! Pluggable permission verification with a bounded decision cache.
//!
//! # Responsibility
//! - Define the verifier seam an authorization backend implements.
//! - Cache recent decisions with a TTL and a fixed capacity, evicting in
//!   insertion order.
//!
//! # Invariants
//! - The cache never holds more than [`CACHE_CAPACITY`] entries.
//! - A failing verifier degrades, never errors out: a cached decision is
//!   reused past its TTL, and absent that the local profile answers.

use crate::access::profile::AccessProfile;
use log::{debug, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Decision cache capacity.
pub const CACHE_CAPACITY: usize = 100;

/// Verifier backend errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    Unavailable(String),
    InvalidSubject(String),
}

impl Display for VerifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(detail) => write!(f, "verifier unavailable: {detail}"),
            Self::InvalidSubject(subject) => write!(f, "verifier rejected subject: {subject}"),
        }
    }
}

impl Error for VerifierError {}

/// Authorization backend seam.
pub trait AccessVerifier {
    /// Answers whether the subject holds the permission.
    fn verify(&self, subject: &str, permission: &str) -> Result<bool, VerifierError>;
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Cache,
    Verifier,
    ProfileFallback,
}

/// One authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub granted: bool,
    pub source: DecisionSource,
}

#[derive(Debug)]
struct CacheEntry {
    subject: String,
    permission: String,
    granted: bool,
    inserted_at: Instant,
}

/// Caching wrapper over an [`AccessVerifier`].
pub struct CachedVerifier<V> {
    inner: V,
    ttl: Duration,
    entries: VecDeque<CacheEntry>,
}

impl<V: AccessVerifier> CachedVerifier<V> {
    pub fn new(inner: V, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: VecDeque::new(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    /// Checks one permission for one subject.
    ///
    /// Order of authority: fresh cache entry, then the verifier, then any
    /// stale cache entry, then the local profile.
    pub fn check(
        &mut self,
        profile: &AccessProfile,
        permission: &str,
    ) -> AccessDecision {
        let subject = profile.subject();

        if let Some(granted) = self.lookup(subject, permission, true) {
            return AccessDecision {
                granted,
                source: DecisionSource::Cache,
            };
        }

        match self.inner.verify(subject, permission) {
            Ok(granted) => {
                self.insert(subject, permission, granted);
                debug!(
                    "event=access_check module=access subject={subject} permission={permission} granted={granted} source=verifier"
                );
                AccessDecision {
                    granted,
                    source: DecisionSource::Verifier,
                }
            }
            Err(err) => {
                warn!(
                    "event=access_check module=access status=verifier_failed subject={subject} permission={permission} error={err}"
                );
                if let Some(granted) = self.lookup(subject, permission, false) {
                    return AccessDecision {
                        granted,
                        source: DecisionSource::Cache,
                    };
                }
                AccessDecision {
                    granted: profile.has_permission(permission),
                    source: DecisionSource::ProfileFallback,
                }
            }
        }
    }

    fn lookup(&self, subject: &str, permission: &str, enforce_ttl: bool) -> Option<bool> {
        self.entries
            .iter()
            .find(|entry| {
                entry.subject == subject
                    && entry.permission == permission
                    && (!enforce_ttl || entry.inserted_at.elapsed() < self.ttl)
            })
            .map(|entry| entry.granted)
    }

    fn insert(&mut self, subject: &str, permission: &str, granted: bool) {
        self.entries
            .retain(|entry| !(entry.subject == subject && entry.permission == permission));
        if self.entries.len() >= CACHE_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(CacheEntry {
            subject: subject.to_string(),
            permission: permission.to_string(),
            granted,
            inserted_at: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AccessDecision, AccessVerifier, CachedVerifier, DecisionSource, VerifierError,
        CACHE_CAPACITY,
    };
    use crate::access::profile::AccessProfile;
    use std::cell::Cell;
    use std::time::Duration;

    struct ScriptedVerifier {
        grants: bool,
        fail: Cell<bool>,
        calls: Cell<u32>,
    }

    impl ScriptedVerifier {
        fn granting() -> Self {
            Self {
                grants: true,
                fail: Cell::new(false),
                calls: Cell::new(0),
            }
        }
    }

    impl AccessVerifier for ScriptedVerifier {
        fn verify(&self, _subject: &str, _permission: &str) -> Result<bool, VerifierError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(VerifierError::Unavailable("scripted outage".to_string()));
            }
            Ok(self.grants)
        }
    }

    fn profile() -> AccessProfile {
        AccessProfile::new("user-1").expect("profile")
    }

    #[test]
    fn second_check_is_served_from_cache() {
        let mut cached = CachedVerifier::new(ScriptedVerifier::granting(), Duration::from_secs(60));
        let profile = profile();

        let first = cached.check(&profile, "files.read");
        assert_eq!(
            first,
            AccessDecision {
                granted: true,
                source: DecisionSource::Verifier
            }
        );

        let second = cached.check(&profile, "files.read");
        assert_eq!(second.source, DecisionSource::Cache);
        assert_eq!(cached.inner.calls.get(), 1);
    }

    #[test]
    fn expired_entries_are_reverified() {
        let mut cached = CachedVerifier::new(ScriptedVerifier::granting(), Duration::ZERO);
        let profile = profile();

        cached.check(&profile, "files.read");
        let again = cached.check(&profile, "files.read");
        assert_eq!(again.source, DecisionSource::Verifier);
        assert_eq!(cached.inner.calls.get(), 2);
    }

    #[test]
    fn verifier_outage_falls_back_to_stale_cache() {
        let mut cached = CachedVerifier::new(ScriptedVerifier::granting(), Duration::ZERO);
        let profile = profile();

        cached.check(&profile, "files.read");
        cached.inner.fail.set(true);

        let decision = cached.check(&profile, "files.read");
        assert_eq!(
            decision,
            AccessDecision {
                granted: true,
                source: DecisionSource::Cache
            }
        );
    }

    #[test]
    fn verifier_outage_without_cache_uses_profile() {
        let verifier = ScriptedVerifier::granting();
        verifier.fail.set(true);
        let mut cached = CachedVerifier::new(verifier, Duration::from_secs(60));

        let mut profile = profile();
        profile.grant_permission("files.read").expect("grant");

        let granted = cached.check(&profile, "files.read");
        assert_eq!(
            granted,
            AccessDecision {
                granted: true,
                source: DecisionSource::ProfileFallback
            }
        );

        let denied = cached.check(&profile, "files.write");
        assert_eq!(
            denied,
            AccessDecision {
                granted: false,
                source: DecisionSource::ProfileFallback
            }
        );
    }

    #[test]
    fn cache_evicts_oldest_entry_at_capacity() {
        let mut cached = CachedVerifier::new(ScriptedVerifier::granting(), Duration::from_secs(60));
        let profile = profile();

        for index in 0..CACHE_CAPACITY + 1 {
            cached.check(&profile, &format!("perm.{index}"));
        }
        assert_eq!(cached.cached_len(), CACHE_CAPACITY);

        // perm.0 was evicted, so checking it calls the verifier again.
        let calls_before = cached.inner.calls.get();
        let decision = cached.check(&profile, "perm.0");
        assert_eq!(decision.source, DecisionSource::Verifier);
        assert_eq!(cached.inner.calls.get(), calls_before + 1);

        // perm.1 is still cached.
        let cached_hit = cached.check(&profile, "perm.1");
        assert_eq!(cached_hit.source, DecisionSource::Cache);
    }

    #[test]
    fn refreshing_an_entry_does_not_grow_the_cache() {
        let mut cached = CachedVerifier::new(ScriptedVerifier::granting(), Duration::ZERO);
        let profile = profile();

        cached.check(&profile, "files.read");
        cached.check(&profile, "files.read");
        assert_eq!(cached.cached_len(), 1);
    }
}
