use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::geometry::GeoPoint;

/// Converts free-text addresses into WGS84 points.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError>;
}

#[async_trait]
impl<G> Geocoder for Arc<G>
where
    G: Geocoder + ?Sized,
{
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        (**self).geocode(address).await
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    #[error("address is empty")]
    EmptyAddress,
    #[error("no location matched the address")]
    NoCandidates,
    #[error("geocoder did not answer within {0:?}")]
    Timeout(Duration),
    #[error("geocoder request failed: {0}")]
    Provider(String),
    #[error("geocoder returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl GeocodeError {
    /// Short label used for the failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyAddress => "empty_address",
            Self::NoCandidates => "no_candidates",
            Self::Timeout(_) => "timeout",
            Self::Provider(_) => "provider",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Fixed address table for offline use.
///
/// Keys are matched case-insensitively with surrounding and repeated whitespace ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, GeoPoint>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, address: &str, point: GeoPoint) -> Self {
        self.insert(address, point);
        self
    }

    pub fn insert(&mut self, address: &str, point: GeoPoint) {
        self.entries.insert(normalize(address), point);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        let key = normalize(address);
        if key.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        self.entries
            .get(&key)
            .copied()
            .ok_or(GeocodeError::NoCandidates)
    }
}

fn normalize(address: &str) -> String {
    address
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper bound on remembered addresses unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Remembers successful answers of an inner geocoder for `ttl`.
///
/// Keyed on the raw address string. Failures are never cached. Expired entries are swept
/// on every insert and the map never holds more than `capacity` addresses.
pub struct CachingGeocoder<G> {
    inner: G,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, (GeoPoint, Instant)>>,
}

impl<G> CachingGeocoder<G> {
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: G, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, address: &str) -> Option<GeoPoint> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get(address)
            .map(|(point, stored_at)| (*point, stored_at.elapsed() < self.ttl));
        match entry {
            Some((point, true)) => Some(point),
            Some((_, false)) => {
                entries.remove(address);
                None
            }
            None => None,
        }
    }

    fn remember(&self, address: &str, point: GeoPoint) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);

        if entries.len() >= self.capacity && !entries.contains_key(address) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, (_, stored_at))| *stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(address.to_string(), (point, Instant::now()));
    }
}

#[async_trait]
impl<G> Geocoder for CachingGeocoder<G>
where
    G: Geocoder,
{
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        if let Some(point) = self.cached(address) {
            debug!("geocode cache hit");
            return Ok(point);
        }

        let point = self.inner.geocode(address).await?;
        self.remember(address, point);
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).expect("valid point")
    }

    struct Counting {
        calls: AtomicUsize,
        answer: Result<GeoPoint, GeocodeError>,
    }

    #[async_trait]
    impl Geocoder for Counting {
        async fn geocode(&self, _address: &str) -> Result<GeoPoint, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn static_lookup_ignores_case_and_spacing() {
        let geocoder = StaticGeocoder::new().with_entry("123 Main St, Chicago", point(41.8, -87.6));

        let found = geocoder
            .geocode("  123   MAIN st,  chicago ")
            .await
            .expect("address known");
        assert_eq!(found, point(41.8, -87.6));
        assert_eq!(
            geocoder.geocode("999 Elsewhere").await,
            Err(GeocodeError::NoCandidates)
        );
        assert_eq!(geocoder.geocode("   ").await, Err(GeocodeError::EmptyAddress));
    }

    #[tokio::test]
    async fn cache_serves_repeat_addresses_without_calling_inner() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: Ok(point(41.9, -87.7)),
        });
        let cache = CachingGeocoder::new(inner.clone(), Duration::from_secs(60));

        for _ in 0..3 {
            assert_eq!(cache.geocode("1 Loop").await, Ok(point(41.9, -87.7)));
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_does_not_store_failures_or_expired_entries() {
        let failing = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: Err(GeocodeError::Provider("503".to_string())),
        });
        let cache = CachingGeocoder::new(failing.clone(), Duration::from_secs(60));
        assert!(cache.geocode("1 Loop").await.is_err());
        assert!(cache.geocode("1 Loop").await.is_err());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);

        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: Ok(point(41.9, -87.7)),
        });
        let expired = CachingGeocoder::new(inner.clone(), Duration::ZERO);
        expired.geocode("1 Loop").await.expect("geocodes");
        expired.geocode("1 Loop").await.expect("geocodes");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_for_other_addresses_are_swept() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: Ok(point(41.9, -87.7)),
        });
        let cache = CachingGeocoder::new(inner, Duration::ZERO);

        for address in ["1 Loop", "2 Loop", "3 Loop", "4 Loop"] {
            cache.geocode(address).await.expect("geocodes");
            assert_eq!(cache.len(), 1);
        }
        let entries = cache.entries.lock().expect("cache lock");
        assert!(entries.contains_key("4 Loop"));
        assert!(!entries.contains_key("1 Loop"));
    }

    #[tokio::test]
    async fn capacity_evicts_the_oldest_address() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: Ok(point(41.9, -87.7)),
        });
        let cache = CachingGeocoder::with_capacity(inner.clone(), Duration::from_secs(60), 2);

        for address in ["1 Loop", "2 Loop", "3 Loop"] {
            cache.geocode(address).await.expect("geocodes");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.entries.lock().expect("cache lock").contains_key("1 Loop"));

        cache.geocode("3 Loop").await.expect("geocodes");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn reasons_are_stable_labels() {
        assert_eq!(GeocodeError::Timeout(Duration::from_secs(1)).reason(), "timeout");
        assert_eq!(GeocodeError::NoCandidates.reason(), "no_candidates");
    }
}
