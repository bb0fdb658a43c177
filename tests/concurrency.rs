//! Multi-threaded behaviour of the pool

use genpool::{Pool, PoolConfiguration, PoolError};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::{Duration, Instant};

/// Tracks how many resources exist at once, as seen by the collaborators.
#[derive(Default)]
struct Census {
    next: AtomicUsize,
    alive: AtomicUsize,
    peak: AtomicUsize,
    destroyed: AtomicUsize,
}

fn census_pool(config: PoolConfiguration) -> (Arc<Pool<usize>>, Arc<Census>) {
    let census = Arc::new(Census::default());
    let on_create = Arc::clone(&census);
    let on_destroy = Arc::clone(&census);

    let pool = Pool::new(
        config,
        move || {
            let alive = on_create.alive.fetch_add(1, Ordering::SeqCst) + 1;
            on_create.peak.fetch_max(alive, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            Ok::<_, io::Error>(on_create.next.fetch_add(1, Ordering::SeqCst))
        },
        move |_| {
            on_destroy.alive.fetch_sub(1, Ordering::SeqCst);
            on_destroy.destroyed.fetch_add(1, Ordering::SeqCst);
            Ok::<_, io::Error>(())
        },
    )
    .unwrap();

    (Arc::new(pool), census)
}

fn sized(min: usize, max: usize) -> PoolConfiguration {
    PoolConfiguration::new().with_min_capacity(min).with_max_capacity(max)
}

#[test]
fn live_resources_never_exceed_max_capacity() {
    let (pool, census) = census_pool(sized(0, 4));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    let res = pool.acquire().unwrap();
                    assert!(pool.live_count() <= 4);
                    pool.release(res).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(census.peak.load(Ordering::SeqCst) <= 4);
    assert!(pool.live_count() <= 4);
    assert_eq!(pool.idle_count(), pool.live_count());
}

#[test]
fn blocked_acquire_receives_released_resource() {
    let (pool, _) = census_pool(sized(0, 2));
    let first = pool.acquire().unwrap();
    let _second = pool.acquire().unwrap();
    let released_id = first.id();

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let res = pool.acquire().unwrap();
            tx.send(res.id()).unwrap();
            res
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    pool.release(first).unwrap();
    let got = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(got, released_id);
    assert_eq!(pool.live_count(), 2);

    let third = waiter.join().unwrap();
    assert_eq!(third.id(), released_id);
}

#[test]
fn destroy_unblocks_waiter_with_fresh_resource() {
    let (pool, census) = census_pool(sized(1, 1));
    let held = pool.acquire().unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.acquire().map(|res| *res))
    };

    thread::sleep(Duration::from_millis(30));
    pool.destroy(held).unwrap();

    assert_eq!(waiter.join().unwrap().unwrap(), 1);
    assert_eq!(census.destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.live_count(), 1);
}

#[test]
fn shutdown_wakes_blocked_acquirers() {
    let (pool, _) = census_pool(sized(1, 1));
    let held = pool.acquire().unwrap();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.acquire().map(|res| *res))
        })
        .collect();

    thread::sleep(Duration::from_millis(30));
    pool.shutdown().unwrap();

    for waiter in waiters {
        assert!(matches!(waiter.join().unwrap(), Err(PoolError::PoolClosed)));
    }

    pool.destroy(held).unwrap();
    assert_eq!(pool.live_count(), 0);
}

#[test]
fn expired_resource_is_never_handed_back() {
    let config = sized(0, 3).with_ttl(Duration::from_millis(40));
    let (pool, census) = census_pool(config);

    let res = pool.acquire().unwrap();
    let original = res.id();
    thread::sleep(Duration::from_millis(5));
    pool.release(res).unwrap();
    assert_eq!(pool.idle_count(), 1);

    thread::sleep(Duration::from_millis(60));
    let res = pool.acquire().unwrap();

    assert_ne!(res.id(), original);
    assert!(res.age() < Duration::from_millis(40));
    assert_eq!(census.destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.live_count(), 1);
}

#[test]
fn acquire_respects_ttl_under_load() {
    let ttl = Duration::from_millis(20);
    let (pool, _) = census_pool(sized(2, 3).with_ttl(ttl));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..20 {
                    let before = Instant::now();
                    let res = pool.acquire().unwrap();
                    assert!(before.saturating_duration_since(res.created_at()) < ttl);
                    thread::sleep(Duration::from_millis(2));
                    pool.release(res).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(pool.live_count() <= 3);
}

#[test]
fn shutdown_destroys_each_idle_resource_once() {
    let (pool, census) = census_pool(sized(3, 5));
    assert_eq!(pool.idle_count(), 3);

    pool.shutdown().unwrap();
    assert!(pool.is_closed());
    assert_eq!(census.destroyed.load(Ordering::SeqCst), 3);

    assert!(matches!(pool.shutdown(), Err(PoolError::PoolClosed)));
    assert!(matches!(pool.acquire(), Err(PoolError::PoolClosed)));
    assert_eq!(census.destroyed.load(Ordering::SeqCst), 3);
}

#[test]
fn concurrent_shutdown_leaves_no_idle_resources() {
    let (pool, census) = census_pool(sized(2, 4));
    let barrier = Arc::new(Barrier::new(5));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loop {
                    match pool.acquire() {
                        Ok(res) => match pool.release(res) {
                            Ok(()) => {}
                            Err(PoolError::PoolClosed) => return,
                            Err(err) => panic!("unexpected release error: {err}"),
                        },
                        Err(PoolError::PoolClosed) => return,
                        Err(err) => panic!("unexpected acquire error: {err}"),
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(Duration::from_millis(10));
    pool.shutdown().unwrap();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.live_count(), 0);
    assert_eq!(census.alive.load(Ordering::SeqCst), 0);
}

#[test]
fn shutdown_during_factory_call_destroys_fresh_resource() {
    let entered = Arc::new(Barrier::new(2));
    let resume = Arc::new(Barrier::new(2));
    let destroyed = Arc::new(AtomicUsize::new(0));

    let pool = {
        let entered = Arc::clone(&entered);
        let resume = Arc::clone(&resume);
        let destroyed = Arc::clone(&destroyed);
        Arc::new(
            Pool::new(
                sized(0, 1),
                move || {
                    entered.wait();
                    resume.wait();
                    Ok::<_, io::Error>(7usize)
                },
                move |_| {
                    destroyed.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, io::Error>(())
                },
            )
            .unwrap(),
        )
    };

    let acquirer = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.acquire().map(|res| *res))
    };

    entered.wait();
    pool.shutdown().unwrap();
    assert!(pool.is_closed());
    assert_eq!(pool.live_count(), 1);
    resume.wait();

    assert!(matches!(acquirer.join().unwrap(), Err(PoolError::PoolClosed)));
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.live_count(), 0);
    assert_eq!(pool.idle_count(), 0);
}
