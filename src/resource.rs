//! Pooled resource wrapper and RAII guard

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use crate::errors::PoolResult;
use crate::pool::Pool;

/// A resource owned by a pool, stamped with its creation time.
///
/// Obtained from [`Pool::acquire`] and handed back with [`Pool::release`] or
/// [`Pool::destroy`]. Dropping it without doing either drops the inner value
/// while the pool still counts it as live.
pub struct PooledResource<T> {
    value: T,
    created_at: Instant,
    id: u64,
    pool_id: u64,
}

impl<T> PooledResource<T> {
    pub(crate) fn new(value: T, id: u64, pool_id: u64) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            id,
            pool_id,
        }
    }

    /// When the factory produced this resource
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time elapsed since creation
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Sequence number assigned by the owning pool
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Take the inner value out. The pool keeps counting it as live
    /// until it is passed to the destructor some other way.
    pub fn into_inner(self) -> T {
        self.value
    }

    pub(crate) fn pool_id(&self) -> u64 {
        self.pool_id
    }
}

impl<T> Deref for PooledResource<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for PooledResource<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("value", &self.value)
            .field("id", &self.id)
            .field("age", &self.age())
            .finish()
    }
}

/// A checked-out resource that returns itself to the pool when dropped
///
/// # Examples
///
/// ```
/// use genpool::{Pool, PoolConfiguration};
///
/// let config = PoolConfiguration::new().with_min_capacity(1).with_max_capacity(2);
/// let pool = Pool::new(config, || Ok::<_, std::io::Error>(vec![0u8; 16]), |_| Ok::<_, std::io::Error>(())).unwrap();
///
/// {
///     let mut buf = pool.get().unwrap();
///     buf[0] = 1;
///     assert_eq!(pool.idle_count(), 0);
/// }
///
/// assert_eq!(pool.idle_count(), 1);
/// ```
pub struct Pooled<'a, T: Send + 'static> {
    resource: Option<PooledResource<T>>,
    pool: &'a Pool<T>,
}

impl<'a, T: Send + 'static> Pooled<'a, T> {
    pub(crate) fn new(resource: PooledResource<T>, pool: &'a Pool<T>) -> Self {
        Self {
            resource: Some(resource),
            pool,
        }
    }

    /// Destroy the resource instead of returning it to the pool
    pub fn destroy(self) -> PoolResult<()> {
        let (resource, pool) = self.into_parts();
        pool.destroy(resource)
    }

    /// Release the resource now and report the outcome
    pub fn release(self) -> PoolResult<()> {
        let (resource, pool) = self.into_parts();
        pool.release(resource)
    }

    /// Stop tracking the resource; the caller must release or destroy it
    pub fn detach(self) -> PooledResource<T> {
        self.into_parts().0
    }

    fn into_parts(mut self) -> (PooledResource<T>, &'a Pool<T>) {
        let resource = self.resource.take().expect("Resource already taken");
        (resource, self.pool)
    }
}

impl<T: Send + 'static> Deref for Pooled<'_, T> {
    type Target = PooledResource<T>;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().expect("Resource already taken")
    }
}

impl<T: Send + 'static> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource.as_mut().expect("Resource already taken")
    }
}

impl<T: Send + 'static> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            let id = resource.id();
            if let Err(err) = self.pool.release(resource) {
                tracing::warn!(resource_id = id, error = %err, "release on drop failed");
            }
        }
    }
}
