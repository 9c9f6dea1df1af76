use named_di::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn counting(counter: &Arc<AtomicUsize>) -> impl Fn() -> anyhow::Result<usize> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
}

#[test]
fn concurrent_gets_construct_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let container = Container::new();
    container
        .register(
            Definition::new("counter")
                .constructor(move || -> anyhow::Result<usize> {
                    thread::sleep(Duration::from_millis(20));
                    Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .singleton(),
        )
        .unwrap();

    let barrier = Barrier::new(100);
    let results: Vec<Ref<usize>> = thread::scope(|s| {
        let handles: Vec<_> = (0..100)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    container.get::<usize>("counter").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| **r == 1));
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[test]
fn transient_constructs_every_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container
        .register(Definition::new("tick").constructor(counting(&calls)))
        .unwrap();

    let first = container.get::<usize>("tick").unwrap();
    let second = container.get::<usize>("tick").unwrap();
    assert_eq!((*first, *second), (1, 2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn singleton_error_is_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let container = Container::new();
    container
        .register(
            Definition::new("flaky")
                .constructor(move || -> anyhow::Result<&'static str> {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("first attempt fails");
                    }
                    Ok("recovered")
                })
                .singleton(),
        )
        .unwrap();

    let first = container.get_any("flaky").unwrap_err();
    let second = container.get_any("flaky").unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    match (first, second) {
        (Error::Service(a), Error::Service(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("unexpected errors: {:?}", other),
    }
}

#[test]
fn nested_singleton_is_shared_between_dependents() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container
        .register_all([
            Definition::new("pool").constructor(counting(&calls)).singleton(),
            Definition::new("users")
                .constructor(|pool: Arc<usize>| -> anyhow::Result<Arc<usize>> { Ok(pool) })
                .refs(["pool"]),
            Definition::new("orders")
                .constructor(|pool: Arc<usize>| -> anyhow::Result<Arc<usize>> { Ok(pool) })
                .refs(["pool"]),
        ])
        .unwrap();

    let users = container.get::<Arc<usize>>("users").unwrap();
    let orders = container.get::<Arc<usize>>("orders").unwrap();
    assert!(Arc::ptr_eq(&users, &orders));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn reregistration_replaces_the_service() {
    let container = Container::new();
    container
        .register(Definition::new("greeting").value("hello".to_string()))
        .unwrap();
    container
        .register(
            Definition::new("greeting")
                .constructor(|| -> anyhow::Result<String> { Ok("bonjour".to_string()) }),
        )
        .unwrap();

    assert_eq!(container.get::<String>("greeting").unwrap().as_str(), "bonjour");
}

#[test]
fn reregistered_singleton_keeps_cached_value_until_cleared() {
    let container = Container::new();
    container
        .register(
            Definition::new("mode")
                .constructor(|| -> anyhow::Result<&'static str> { Ok("old") })
                .singleton(),
        )
        .unwrap();
    assert_eq!(*container.get::<&'static str>("mode").unwrap(), "old");

    container
        .register(
            Definition::new("mode")
                .constructor(|| -> anyhow::Result<&'static str> { Ok("new") })
                .singleton(),
        )
        .unwrap();
    assert_eq!(*container.get::<&'static str>("mode").unwrap(), "old");

    container.clear_cache();
    assert_eq!(*container.get::<&'static str>("mode").unwrap(), "new");
}

#[test]
fn clearing_the_cache_retries_a_failed_singleton() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let container = Container::new();
    container
        .register(
            Definition::new("flaky")
                .constructor(move || -> anyhow::Result<usize> {
                    match counter.fetch_add(1, Ordering::SeqCst) {
                        0 => anyhow::bail!("cold start"),
                        n => Ok(n),
                    }
                })
                .singleton(),
        )
        .unwrap();

    assert!(container.get_any("flaky").is_err());
    container.clear_cache();
    assert_eq!(*container.get::<usize>("flaky").unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_dependency_does_not_poison_singleton() {
    let container = Container::new();
    container
        .register(
            Definition::new("app")
                .constructor(|db: Arc<i32>| -> anyhow::Result<i32> { Ok(*db + 1) })
                .refs(["db"])
                .singleton(),
        )
        .unwrap();

    assert!(matches!(container.get_any("app"), Err(Error::NotFound(name)) if name == "db"));

    container.register(Definition::new("db").value(41_i32)).unwrap();
    assert_eq!(*container.get::<i32>("app").unwrap(), 42);
}

#[test]
fn failed_dependency_singleton_stays_cached_on_its_own_name() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let container = Container::new();
    container
        .register_all([
            Definition::new("db")
                .constructor(move || -> anyhow::Result<i32> {
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("connection refused")
                })
                .singleton(),
            Definition::new("app")
                .constructor(|db: Arc<i32>| -> anyhow::Result<i32> { Ok(*db) })
                .refs(["db"])
                .singleton(),
        ])
        .unwrap();

    let first = container.get_any("app").unwrap_err();
    let second = container.get_any("app").unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    match (first, second) {
        (Error::Service(a), Error::Service(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("unexpected errors: {:?}", other),
    }
}

#[test]
fn concurrent_gets_share_one_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let container = Container::new();
    container
        .register(
            Definition::new("broken")
                .constructor(move || -> anyhow::Result<usize> {
                    thread::sleep(Duration::from_millis(20));
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("cannot start")
                })
                .singleton(),
        )
        .unwrap();

    let barrier = Barrier::new(50);
    let errors: Vec<Error> = thread::scope(|s| {
        let handles: Vec<_> = (0..50)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    container.get_any("broken").unwrap_err()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let first = match &errors[0] {
        Error::Service(err) => Arc::clone(err),
        other => panic!("unexpected error: {:?}", other),
    };
    for err in &errors {
        match err {
            Error::Service(err) => assert!(Arc::ptr_eq(err, &first)),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
