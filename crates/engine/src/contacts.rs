//! Time-bounded cache for the device contact list.
//!
//! Reading the contact book is expensive, so the last result is kept with
//! the instant it was fetched. The clock is injected, and the cache is only
//! ever emptied by an explicit [`ContactsCache::invalidate`] or replaced by a
//! [`ContactsCache::refresh`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct ContactsCache<T> {
    entry: Option<(T, DateTime<Utc>)>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> ContactsCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: None,
            ttl,
            clock,
        }
    }

    /// `true` while the cached value is younger than the TTL.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match &self.entry {
            Some((_, fetched_at)) => self.clock.now() - *fetched_at < self.ttl,
            None => false,
        }
    }

    /// The cached value, if still valid.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        if !self.is_valid() {
            return None;
        }
        self.entry.as_ref().map(|(value, _)| value)
    }

    /// Stores a freshly fetched value.
    pub fn store(&mut self, value: T) {
        self.entry = Some((value, self.clock.now()));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Drops the cached value and stores the result of `fetch`.
    ///
    /// On error the cache stays empty.
    pub fn refresh<E>(&mut self, fetch: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        self.invalidate();
        let value = fetch()?;
        let (value, _) = self.entry.insert((value, self.clock.now()));
        Ok(value)
    }

    /// Cached value when valid, otherwise fetched and stored.
    pub fn get_or_fetch<E>(&mut self, fetch: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        let entry = match self.entry.take() {
            Some((value, fetched_at)) if self.clock.now() - fetched_at < self.ttl => {
                (value, fetched_at)
            }
            _ => (fetch()?, self.clock.now()),
        };
        let (value, _) = self.entry.insert(entry);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn cache() -> (ContactsCache<Vec<&'static str>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
        (ContactsCache::new(Duration::minutes(5), clock.clone()), clock)
    }

    #[test]
    fn value_expires_after_ttl() {
        let (mut cache, clock) = cache();
        cache.store(vec!["Bob"]);
        assert_eq!(cache.get(), Some(&vec!["Bob"]));

        clock.advance(Duration::minutes(4));
        assert!(cache.is_valid());

        clock.advance(Duration::minutes(1));
        assert!(!cache.is_valid());
        assert!(cache.get().is_none());
    }

    #[test]
    fn get_or_fetch_only_fetches_when_stale() {
        let (mut cache, clock) = cache();
        let mut calls = 0;
        let mut fetch = || -> Result<Vec<&'static str>, ()> {
            calls += 1;
            Ok(vec!["Carol"])
        };

        cache.get_or_fetch(&mut fetch).unwrap();
        cache.get_or_fetch(&mut fetch).unwrap();
        clock.advance(Duration::minutes(10));
        cache.get_or_fetch(&mut fetch).unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn invalidate_is_explicit() {
        let (mut cache, _clock) = cache();
        cache.store(vec!["Dave"]);
        cache.invalidate();
        assert!(cache.get().is_none());

        let failed: Result<&Vec<&str>, &str> = cache.refresh(|| Err("denied"));
        assert!(failed.is_err());
        assert!(!cache.is_valid());
    }
}
