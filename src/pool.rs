//! Core pool engine

use crate::config::PoolConfiguration;
use crate::errors::{InitError, PoolError, PoolResult};
use crate::eviction::EvictionPolicy;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::resource::{Pooled, PooledResource};

use crossbeam::queue::ArrayQueue;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

type BoxError = Box<dyn StdError + Send + Sync>;
type Factory<T> = Box<dyn Fn() -> Result<T, BoxError> + Send + Sync>;
type Destructor<T> = Box<dyn Fn(T) -> Result<(), BoxError> + Send + Sync>;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

struct State {
    /// Idle + checked out + reserved for an in-flight factory call
    live: usize,
    closed: bool,
}

/// Bounded, thread-safe pool of resources built by a caller-supplied factory
///
/// Resources are created lazily up to `max_capacity`, recycled through
/// [`release`](Pool::release), and expire after the configured TTL. Every
/// state change that must be ordered against [`shutdown`](Pool::shutdown)
/// happens under a single lock; the lock is never held while parked.
///
/// # Examples
///
/// ```
/// use genpool::{Pool, PoolConfiguration};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let next = AtomicU32::new(0);
/// let config = PoolConfiguration::new().with_min_capacity(3).with_max_capacity(5);
/// let pool = Pool::new(
///     config,
///     move || Ok::<_, std::io::Error>(next.fetch_add(1, Ordering::Relaxed)),
///     |_| Ok::<_, std::io::Error>(()),
/// )
/// .unwrap();
/// assert_eq!(pool.idle_count(), 3);
///
/// let res = pool.acquire().unwrap();
/// assert!(*res < 3);
/// pool.release(res).unwrap();
///
/// pool.shutdown().unwrap();
/// assert!(pool.is_closed());
/// ```
pub struct Pool<T> {
    idle: ArrayQueue<PooledResource<T>>,
    state: Mutex<State>,
    available: Condvar,
    config: PoolConfiguration,
    eviction: EvictionPolicy,
    factory: Factory<T>,
    destructor: Destructor<T>,
    metrics: MetricsTracker,
    next_id: AtomicU64,
    pool_id: u64,
}

impl<T: Send + 'static> Pool<T> {
    /// Create a pool and warm it up with `min_capacity` resources.
    ///
    /// Individual warm-up failures are skipped. If all of them fail the pool
    /// is still returned inside [`InitError::FactoryInitializationFailed`].
    pub fn new<F, D, FE, DE>(
        config: PoolConfiguration,
        factory: F,
        destructor: D,
    ) -> Result<Self, InitError<T>>
    where
        F: Fn() -> Result<T, FE> + Send + Sync + 'static,
        D: Fn(T) -> Result<(), DE> + Send + Sync + 'static,
        FE: Into<BoxError>,
        DE: Into<BoxError>,
    {
        config.validate().map_err(InitError::InvalidConfiguration)?;

        let mut pool = Self {
            idle: ArrayQueue::new(config.max_capacity),
            state: Mutex::new(State {
                live: 0,
                closed: false,
            }),
            available: Condvar::new(),
            eviction: EvictionPolicy::from_ttl(config.ttl()),
            factory: Box::new(move || factory().map_err(Into::<BoxError>::into)),
            destructor: Box::new(move |value| destructor(value).map_err(Into::<BoxError>::into)),
            metrics: MetricsTracker::new(),
            next_id: AtomicU64::new(0),
            pool_id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            config,
        };

        match pool.warm_up() {
            Some(error) => Err(InitError::FactoryInitializationFailed { pool, error }),
            None => Ok(pool),
        }
    }

    fn warm_up(&mut self) -> Option<PoolError> {
        let attempts = self.config.min_capacity;
        let mut last_error = None;

        for _ in 0..attempts {
            match (self.factory)() {
                Ok(value) => {
                    let resource = self.wrap(value);
                    if self.idle.push(resource).is_err() {
                        break;
                    }
                    self.state.get_mut().live += 1;
                    MetricsTracker::incr(&self.metrics.created);
                }
                Err(err) => {
                    MetricsTracker::incr(&self.metrics.factory_failures);
                    tracing::warn!(pool = self.pool_id, error = %err, "warm-up factory call failed");
                    last_error = Some(err);
                }
            }
        }

        let live = self.state.get_mut().live;
        tracing::debug!(pool = self.pool_id, live, attempts, "pool warmed up");

        match last_error {
            Some(err) if live == 0 => Some(PoolError::FactoryInitializationFailed {
                attempts,
                source: Arc::from(err),
            }),
            _ => None,
        }
    }

    /// Take a resource, creating one if below capacity, waiting otherwise.
    ///
    /// Blocks without bound while the pool is at capacity. Expired idle
    /// resources are destroyed and skipped.
    pub fn acquire(&self) -> PoolResult<PooledResource<T>> {
        self.acquire_inner(None)
    }

    /// Like [`acquire`](Pool::acquire) but gives up after `timeout` at capacity.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<PooledResource<T>> {
        self.acquire_inner(Some(timeout))
    }

    /// Acquire on the blocking thread pool, bounded by the configured
    /// `acquire_timeout`.
    ///
    /// If the returned future is dropped before completion, a resource the
    /// blocking task obtains afterwards is released back to the pool.
    pub async fn acquire_async(self: &Arc<Self>) -> PoolResult<PooledResource<T>> {
        let pool = Arc::clone(self);
        let timeout = self.config.acquire_timeout;
        let (tx, rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let result = pool.acquire_inner(timeout);
            if let Err(Ok(resource)) = tx.send(result) {
                let id = resource.id();
                tracing::debug!(pool = pool.pool_id, resource_id = id, "async acquire abandoned, releasing");
                if let Err(err) = pool.release(resource) {
                    tracing::warn!(pool = pool.pool_id, resource_id = id, error = %err, "release after abandoned acquire failed");
                }
            }
        });

        rx.await.map_err(|_| PoolError::Cancelled)?
    }

    /// Acquire a resource wrapped in a guard that releases it on drop.
    pub fn get(&self) -> PoolResult<Pooled<'_, T>> {
        self.acquire().map(|resource| Pooled::new(resource, self))
    }

    fn acquire_inner(&self, timeout: Option<Duration>) -> PoolResult<PooledResource<T>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut waited = false;
        let mut timed_out = false;
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(PoolError::PoolClosed);
            }

            if let Some(resource) = self.idle.pop() {
                if self.eviction.is_expired(resource.created_at()) {
                    MutexGuard::unlocked(&mut state, || self.discard_expired(resource))?;
                    continue;
                }
                drop(state);
                MetricsTracker::incr(&self.metrics.acquired);
                return Ok(resource);
            }

            if state.live < self.config.max_capacity {
                state.live += 1;
                drop(state);
                return self.create_reserved();
            }

            if timed_out {
                return Err(PoolError::Timeout(timeout.unwrap_or_default()));
            }
            if !waited {
                waited = true;
                MetricsTracker::incr(&self.metrics.waits);
                tracing::trace!(pool = self.pool_id, "pool at capacity, waiting");
            }
            match deadline {
                Some(deadline) => {
                    timed_out = self.available.wait_until(&mut state, deadline).timed_out();
                }
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Run the factory for a slot already counted in `live`.
    fn create_reserved(&self) -> PoolResult<PooledResource<T>> {
        let value = match (self.factory)() {
            Ok(value) => value,
            Err(err) => {
                self.state.lock().live -= 1;
                self.available.notify_one();
                MetricsTracker::incr(&self.metrics.factory_failures);
                tracing::debug!(pool = self.pool_id, error = %err, "factory call failed");
                return Err(PoolError::factory(err));
            }
        };

        let resource = self.wrap(value);
        MetricsTracker::incr(&self.metrics.created);
        tracing::debug!(pool = self.pool_id, resource_id = resource.id(), "resource created");

        if self.state.lock().closed {
            // shutdown completed while the factory ran
            self.destroy(resource)?;
            return Err(PoolError::PoolClosed);
        }

        MetricsTracker::incr(&self.metrics.acquired);
        Ok(resource)
    }

    /// Return a resource to the idle area.
    ///
    /// Expired resources are destroyed instead. After shutdown the resource
    /// is destroyed and `PoolClosed` is returned, even if the destructor fails.
    pub fn release(&self, resource: PooledResource<T>) -> PoolResult<()> {
        if resource.pool_id() != self.pool_id {
            return Err(PoolError::ForeignResource);
        }

        let state = self.state.lock();
        if state.closed {
            drop(state);
            let id = resource.id();
            if let Err(err) = self.destroy(resource) {
                tracing::warn!(pool = self.pool_id, resource_id = id, error = %err, "destructor failed on release after shutdown");
            }
            return Err(PoolError::PoolClosed);
        }

        if self.eviction.is_expired(resource.created_at()) {
            drop(state);
            return self.discard_expired(resource);
        }

        let result = self.idle.push(resource);
        drop(state);

        match result {
            Ok(()) => {
                self.available.notify_one();
                MetricsTracker::incr(&self.metrics.released);
                Ok(())
            }
            Err(resource) => {
                // live <= max_capacity bounds the idle area
                tracing::warn!(
                    pool = self.pool_id,
                    resource_id = resource.id(),
                    "idle area full on release, destroying resource"
                );
                self.destroy(resource)
            }
        }
    }

    /// Permanently remove a resource through the destructor.
    ///
    /// On failure `live_count` is left unchanged.
    pub fn destroy(&self, resource: PooledResource<T>) -> PoolResult<()> {
        if resource.pool_id() != self.pool_id {
            return Err(PoolError::ForeignResource);
        }

        let id = resource.id();
        match (self.destructor)(resource.into_inner()) {
            Ok(()) => {
                {
                    let mut state = self.state.lock();
                    state.live = state.live.saturating_sub(1);
                }
                self.available.notify_one();
                MetricsTracker::incr(&self.metrics.destroyed);
                tracing::debug!(pool = self.pool_id, resource_id = id, "resource destroyed");
                Ok(())
            }
            Err(err) => {
                MetricsTracker::incr(&self.metrics.destructor_failures);
                tracing::debug!(pool = self.pool_id, resource_id = id, error = %err, "destructor failed");
                Err(PoolError::destructor(err))
            }
        }
    }

    fn discard_expired(&self, resource: PooledResource<T>) -> PoolResult<()> {
        MetricsTracker::incr(&self.metrics.expired);
        tracing::debug!(
            pool = self.pool_id,
            resource_id = resource.id(),
            age = ?resource.age(),
            "resource expired"
        );
        self.destroy(resource)
    }

    /// Close the pool and destroy every idle resource.
    ///
    /// The first destructor failure stops the drain and leaves the pool open.
    /// Checked-out resources are not reachable here; their holders must
    /// destroy them.
    pub fn shutdown(&self) -> PoolResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PoolError::PoolClosed);
        }

        let mut drained = 0usize;
        while let Some(resource) = self.idle.pop() {
            let id = resource.id();
            if let Err(err) = (self.destructor)(resource.into_inner()) {
                drop(state);
                if drained > 0 {
                    self.available.notify_all();
                }
                MetricsTracker::incr(&self.metrics.destructor_failures);
                tracing::warn!(
                    pool = self.pool_id,
                    resource_id = id,
                    drained,
                    error = %err,
                    "shutdown drain aborted"
                );
                return Err(PoolError::destructor(err));
            }
            state.live -= 1;
            drained += 1;
            MetricsTracker::incr(&self.metrics.destroyed);
        }

        state.closed = true;
        let outstanding = state.live;
        drop(state);
        self.available.notify_all();

        tracing::info!(pool = self.pool_id, drained, outstanding, "pool shut down");
        Ok(())
    }

    /// Resources currently waiting in the idle area
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Resources that exist right now, idle or checked out
    pub fn live_count(&self) -> usize {
        self.state.lock().live
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn min_capacity(&self) -> usize {
        self.config.min_capacity
    }

    pub fn max_capacity(&self) -> usize {
        self.config.max_capacity
    }

    /// Effective TTL; `None` means resources never expire
    pub fn ttl(&self) -> Option<Duration> {
        self.eviction.ttl()
    }

    /// Snapshot of pool counters
    pub fn metrics(&self) -> PoolMetrics {
        self.metrics
            .get_metrics(self.live_count(), self.idle.len(), self.config.max_capacity)
    }

    fn wrap(&self, value: T) -> PooledResource<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        PooledResource::new(value, id, self.pool_id)
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        while let Some(resource) = self.idle.pop() {
            let id = resource.id();
            if let Err(err) = (self.destructor)(resource.into_inner()) {
                tracing::warn!(pool = self.pool_id, resource_id = id, error = %err, "destructor failed on drop");
            }
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Pool")
            .field("pool_id", &self.pool_id)
            .field("live", &state.live)
            .field("idle", &self.idle.len())
            .field("closed", &state.closed)
            .field("config", &self.config)
            .finish()
    }
}
