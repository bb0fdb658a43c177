//! Async usage examples

use genpool::{Pool, PoolConfiguration};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    println!("=== genpool - Async Examples ===\n");

    // Example 1: Async acquire
    async_acquire().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

fn buffer_pool(config: PoolConfiguration) -> Arc<Pool<Vec<u8>>> {
    let pool = Pool::new(
        config,
        || Ok::<_, io::Error>(Vec::with_capacity(4096)),
        |_| Ok::<_, io::Error>(()),
    )
    .unwrap();
    Arc::new(pool)
}

async fn async_acquire() {
    println!("1. Async Acquire:");
    let pool = buffer_pool(PoolConfiguration::new().with_min_capacity(1).with_max_capacity(2));

    let buf = pool.acquire_async().await.unwrap();
    println!("   Got buffer with capacity {}", buf.capacity());
    pool.release(buf).unwrap();

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");
    let config = PoolConfiguration::new()
        .with_max_capacity(1)
        .with_acquire_timeout(Duration::from_millis(100));
    let pool = buffer_pool(config);

    let _held = pool.acquire_async().await.unwrap();

    match pool.acquire_async().await {
        Ok(_) => println!("   Got buffer"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");
    let pool = buffer_pool(PoolConfiguration::new().with_min_capacity(2).with_max_capacity(3));

    let mut handles = vec![];
    for i in 0..6 {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            let mut buf = pool.acquire_async().await.unwrap();
            buf.clear();
            buf.extend_from_slice(format!("task {i}").as_bytes());
            sleep(Duration::from_millis(20)).await;
            pool.release(buf).unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Live after all tasks: {}", pool.live_count());
    pool.shutdown().unwrap();
    println!("   Shut down, closed: {}", pool.is_closed());
}
