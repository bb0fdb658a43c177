//! Basic usage examples for Pool

use genpool::{InitError, MetricsExporter, Pool, PoolConfiguration};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Stand-in for an expensive client handle.
#[derive(Debug)]
struct Connection {
    id: u32,
}

fn connection_pool(config: PoolConfiguration) -> Pool<Connection> {
    let next = AtomicU32::new(0);
    let result = Pool::new(
        config,
        move || {
            let id = next.fetch_add(1, Ordering::Relaxed);
            println!("   opening connection {id}");
            Ok::<_, io::Error>(Connection { id })
        },
        |conn: Connection| {
            println!("   closing connection {}", conn.id);
            Ok::<_, io::Error>(())
        },
    );

    match result {
        Ok(pool) => pool,
        Err(InitError::FactoryInitializationFailed { pool, error }) => {
            println!("   warm-up failed ({error}), continuing with an empty pool");
            pool
        }
        Err(err) => panic!("invalid configuration: {err}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== genpool - Basic Examples ===\n");

    // Example 1: Acquire and release
    acquire_release();

    // Example 2: Growth on demand
    growth_on_demand();

    // Example 3: RAII guard
    guard_usage();

    // Example 4: TTL eviction
    ttl_eviction();

    // Example 5: Metrics and shutdown
    metrics_and_shutdown();
}

fn acquire_release() {
    println!("1. Acquire and Release:");
    let pool = connection_pool(PoolConfiguration::new().with_min_capacity(2).with_max_capacity(4));

    let conn = pool.acquire().unwrap();
    println!("   Got connection {}", conn.id);
    println!("   Idle while checked out: {}", pool.idle_count());

    pool.release(conn).unwrap();
    println!("   Idle after release: {}\n", pool.idle_count());
}

fn growth_on_demand() {
    println!("2. Growth on Demand:");
    let pool = connection_pool(PoolConfiguration::new().with_min_capacity(3).with_max_capacity(5));

    let held: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
    println!("   Holding {} connections, live: {}", held.len(), pool.live_count());

    match pool.acquire_timeout(Duration::from_millis(10)) {
        Ok(conn) => println!("   Fifth connection: {}", conn.id),
        Err(err) => println!("   Error: {err}"),
    }
    println!();
}

fn guard_usage() {
    println!("3. RAII Guard:");
    let pool = connection_pool(PoolConfiguration::new().with_min_capacity(1).with_max_capacity(1));

    {
        let conn = pool.get().unwrap();
        println!("   Using connection {} through a guard", conn.id);
    }

    println!("   Idle after guard dropped: {}\n", pool.idle_count());
}

fn ttl_eviction() {
    println!("4. TTL Eviction:");
    let config = PoolConfiguration::new()
        .with_min_capacity(1)
        .with_max_capacity(2)
        .with_ttl(Duration::from_millis(50));
    let pool = connection_pool(config);

    std::thread::sleep(Duration::from_millis(80));
    let conn = pool.acquire().unwrap();
    println!("   Got connection {} (warm one expired)", conn.id);
    pool.release(conn).unwrap();
    println!();
}

fn metrics_and_shutdown() {
    println!("5. Metrics and Shutdown:");
    let pool = connection_pool(PoolConfiguration::new().with_min_capacity(3).with_max_capacity(5));

    let conn = pool.acquire().unwrap();
    pool.release(conn).unwrap();

    for (key, value) in pool.metrics().export() {
        println!("     {}: {}", key, value);
    }
    println!("{}", MetricsExporter::export_prometheus(&pool.metrics(), "demo", None));

    pool.shutdown().unwrap();
    println!("   Closed: {}", pool.is_closed());
    if let Err(err) = pool.acquire() {
        println!("   Acquire after shutdown: {err}");
    }
}
