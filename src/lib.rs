//! # genpool
//!
//! Bounded, thread-safe generic resource pool for Rust.
//!
//! ## Features
//!
//! - Capacity-bounded pooling of any `Send` resource
//! - Warm-up of `min_capacity` resources at construction
//! - Lazy creation on demand up to `max_capacity`
//! - Blocking acquire at capacity, with optional timeout and async variant
//! - Time-to-live eviction; expired resources go through the destructor
//! - One-shot shutdown that drains and destroys idle resources
//! - RAII guard that releases on drop
//! - Metrics with Prometheus text export
//!
//! ## Quick Start
//!
//! ```rust
//! use genpool::{Pool, PoolConfiguration};
//!
//! let config = PoolConfiguration::new().with_min_capacity(2).with_max_capacity(8);
//! let pool = Pool::new(
//!     config,
//!     || Ok::<_, std::io::Error>(String::from("connection")),
//!     |_conn| Ok::<_, std::io::Error>(()),
//! )
//! .unwrap();
//!
//! let conn = pool.acquire().unwrap();
//! println!("Got: {}", *conn);
//! pool.release(conn).unwrap();
//!
//! pool.shutdown().unwrap();
//! ```

mod config;
mod errors;
mod eviction;
mod metrics;
mod pool;
mod resource;

pub use config::PoolConfiguration;
pub use errors::{InitError, PoolError, PoolResult, SharedError};
pub use eviction::EvictionPolicy;
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::Pool;
pub use resource::{Pooled, PooledResource};
