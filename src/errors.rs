//! Error types for the resource pool

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::pool::Pool;

/// Error reported by a factory or destructor, kept verbatim.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Every warm-up factory call failed ({attempts} attempts)")]
    FactoryInitializationFailed {
        attempts: usize,
        #[source]
        source: SharedError,
    },

    #[error("Pool is closed")]
    PoolClosed,

    #[error("Factory failed: {0}")]
    FactoryError(#[source] SharedError),

    #[error("Destructor failed: {0}")]
    DestructorError(#[source] SharedError),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Resource belongs to a different pool")]
    ForeignResource,
}

impl PoolError {
    pub(crate) fn factory<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        PoolError::FactoryError(Arc::from(err.into()))
    }

    pub(crate) fn destructor<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        PoolError::DestructorError(Arc::from(err.into()))
    }

    /// Whether this error means the pool must no longer be used.
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::PoolClosed)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Error returned by [`Pool::new`].
///
/// A failed warm-up is a soft failure: the pool is still handed back and can
/// grow on demand through `acquire`.
///
/// # Examples
///
/// ```
/// use genpool::{InitError, Pool, PoolConfiguration};
/// use std::io;
///
/// let config = PoolConfiguration::new().with_min_capacity(2).with_max_capacity(4);
/// let result = Pool::new(
///     config,
///     || Err::<u32, _>(io::Error::other("backend down")),
///     |_| Ok::<(), io::Error>(()),
/// );
///
/// let err = result.unwrap_err();
/// assert!(matches!(err, InitError::FactoryInitializationFailed { .. }));
/// let pool = err.into_pool().unwrap();
/// assert_eq!(pool.idle_count(), 0);
/// ```
#[derive(Error)]
pub enum InitError<T> {
    #[error("{0}")]
    InvalidConfiguration(#[source] PoolError),

    #[error("{error}")]
    FactoryInitializationFailed {
        pool: Pool<T>,
        #[source]
        error: PoolError,
    },
}

impl<T> InitError<T> {
    /// The underlying pool error.
    pub fn error(&self) -> &PoolError {
        match self {
            InitError::InvalidConfiguration(error) => error,
            InitError::FactoryInitializationFailed { error, .. } => error,
        }
    }

    /// Recover the empty pool after a failed warm-up.
    pub fn into_pool(self) -> Option<Pool<T>> {
        match self {
            InitError::InvalidConfiguration(_) => None,
            InitError::FactoryInitializationFailed { pool, .. } => Some(pool),
        }
    }
}

impl<T> fmt::Debug for InitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::InvalidConfiguration(error) => f
                .debug_tuple("InvalidConfiguration")
                .field(error)
                .finish(),
            InitError::FactoryInitializationFailed { error, .. } => f
                .debug_struct("FactoryInitializationFailed")
                .field("error", error)
                .finish_non_exhaustive(),
        }
    }
}

impl<T> From<InitError<T>> for PoolError {
    fn from(err: InitError<T>) -> Self {
        match err {
            InitError::InvalidConfiguration(error) => error,
            InitError::FactoryInitializationFailed { error, .. } => error,
        }
    }
}
