//! TTL eviction policy

use std::time::{Duration, Instant};

/// Eviction policy for pooled resources
///
/// # Examples
///
/// ```
/// use genpool::EvictionPolicy;
/// use std::time::{Duration, Instant};
///
/// let policy = EvictionPolicy::from_ttl(Some(Duration::from_secs(3600)));
/// assert!(!policy.is_expired(Instant::now()));
///
/// assert_eq!(EvictionPolicy::from_ttl(Some(Duration::ZERO)), EvictionPolicy::None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// No eviction
    #[default]
    None,

    /// Time-to-live: resources expire a fixed duration after creation
    TimeToLive(Duration),
}

impl EvictionPolicy {
    /// Build a policy from an optional TTL. Zero means no eviction.
    pub fn from_ttl(ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) if !ttl.is_zero() => EvictionPolicy::TimeToLive(ttl),
            _ => EvictionPolicy::None,
        }
    }

    /// The TTL, if any.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            EvictionPolicy::None => None,
            EvictionPolicy::TimeToLive(ttl) => Some(*ttl),
        }
    }

    /// A resource created at `created_at` is expired once its age reaches the TTL.
    pub fn is_expired(&self, created_at: Instant) -> bool {
        self.is_expired_at(created_at, Instant::now())
    }

    pub(crate) fn is_expired_at(&self, created_at: Instant, now: Instant) -> bool {
        match self {
            EvictionPolicy::None => false,
            EvictionPolicy::TimeToLive(ttl) => now.saturating_duration_since(created_at) >= *ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_expires() {
        let created = Instant::now();
        let later = created + Duration::from_secs(86_400);
        assert!(!EvictionPolicy::None.is_expired_at(created, later));
    }

    #[test]
    fn test_ttl_boundary_is_expired() {
        let policy = EvictionPolicy::TimeToLive(Duration::from_secs(5));
        let created = Instant::now();

        assert!(!policy.is_expired_at(created, created + Duration::from_secs(1)));
        assert!(!policy.is_expired_at(created, created + Duration::from_millis(4_999)));
        assert!(policy.is_expired_at(created, created + Duration::from_secs(5)));
        assert!(policy.is_expired_at(created, created + Duration::from_secs(10)));
    }

    #[test]
    fn test_clock_before_creation_not_expired() {
        let policy = EvictionPolicy::TimeToLive(Duration::from_secs(5));
        let now = Instant::now();
        let created = now + Duration::from_secs(1);
        assert!(!policy.is_expired_at(created, now));
    }
}
