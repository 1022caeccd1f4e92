use taskbridge::task::TaskCompletionSource;
use taskbridge::task::get_result;
use taskbridge::{Error, EventLoop, EventLoopBuilder, LoopHandle, spawn_local, yield_now};

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_block_on_returns_output() {
    let event_loop = EventLoop::new();

    assert_eq!(event_loop.block_on(async { 40 + 2 }).unwrap(), 42);
}

#[test]
fn test_nested_block_on_is_rejected() {
    let event_loop = EventLoop::new();
    let other = EventLoop::new();

    let (same, different) = event_loop
        .block_on(async { (event_loop.block_on(async {}), other.block_on(async {})) })
        .unwrap();

    assert!(matches!(same, Err(Error::NestedLoop)));
    assert!(matches!(different, Err(Error::NestedLoop)));
}

#[test]
fn test_builder_configures_loop() {
    let event_loop = EventLoopBuilder::new()
        .name("configured")
        .park_timeout(Duration::from_millis(1))
        .build();

    assert_eq!(event_loop.name(), "configured");
    assert_eq!(event_loop.handle().name(), "configured");
}

#[test]
#[should_panic(expected = "park_timeout must be > 0")]
fn test_builder_rejects_zero_park_timeout() {
    let _ = EventLoopBuilder::new().park_timeout(Duration::ZERO);
}

#[test]
fn test_spawn_local_outside_loop_fails() {
    assert!(matches!(spawn_local(async {}), Err(Error::NoActiveLoop)));
    assert!(matches!(LoopHandle::current(), Err(Error::NoActiveLoop)));
}

#[taskbridge::test]
async fn test_spawn_local_join_handle() {
    let handle = spawn_local(async { "joined" }).unwrap();

    assert_eq!(handle.await.unwrap(), "joined");
}

#[taskbridge::test]
async fn test_join_handle_reports_panic() {
    let handle = spawn_local(async {
        if true {
            panic!("task exploded");
        }
    })
    .unwrap();

    let err = handle.await.unwrap_err();
    assert!(matches!(&err, Error::Panicked(msg) if msg == "task exploded"));
}

#[taskbridge::test]
async fn test_yield_now_interleaves_tasks() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let spawn_logger = |name: &'static str| {
        let log = log.clone();
        spawn_local(async move {
            log.borrow_mut().push(format!("{name}1"));
            yield_now().await;
            log.borrow_mut().push(format!("{name}2"));
        })
        .unwrap()
    };

    let a = spawn_logger("a");
    let b = spawn_logger("b");

    a.await.unwrap();
    b.await.unwrap();

    assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
}

#[taskbridge::test]
async fn test_current_handle_matches_running_loop() {
    let current = LoopHandle::current().unwrap();

    assert_eq!(current.name(), "test");
    assert!(!current.is_closed());
    assert!(current.same_loop(&LoopHandle::current().unwrap()));
}

#[test]
fn test_callbacks_run_in_submission_order() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let source = event_loop
        .block_on(async { TaskCompletionSource::<()>::new() })
        .unwrap()
        .unwrap();
    let done = source.get_task();

    let sink = seen.clone();
    thread::spawn(move || {
        for i in 0..100 {
            let sink = sink.clone();
            handle
                .call_soon_threadsafe(move || sink.lock().unwrap().push(i))
                .unwrap();
        }
        source.set_result(()).unwrap();
    })
    .join()
    .unwrap();

    event_loop.block_on(done).unwrap().unwrap();

    assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
}

#[test]
fn test_callback_panic_is_reported() {
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = failures.clone();

    let event_loop = EventLoopBuilder::new()
        .on_unhandled(move |err| sink.lock().unwrap().push(err.to_string()))
        .build();

    event_loop
        .handle()
        .call_soon_threadsafe(|| panic!("callback failed"))
        .unwrap();

    event_loop.block_on(yield_now()).unwrap();

    assert_eq!(
        *failures.lock().unwrap(),
        vec!["the task panicked: callback failed".to_owned()]
    );
}

#[test]
fn test_pending_tasks_survive_between_block_on_calls() {
    let event_loop = EventLoop::new();

    let (source, handle) = event_loop
        .block_on(async {
            let source = TaskCompletionSource::<u8>::new().unwrap();
            let task = source.get_task();
            let handle = spawn_local(async move { task.await.map(|v| v * 2) }).unwrap();
            (source, handle)
        })
        .unwrap();

    assert_eq!(event_loop.pending_tasks(), 1);

    source.set_result(21).unwrap();
    let doubled = event_loop.block_on(handle).unwrap();

    assert_eq!(doubled.unwrap().unwrap(), 42);
    assert_eq!(event_loop.pending_tasks(), 0);
}

#[test]
fn test_dropping_loop_cancels_pending_tasks() {
    let event_loop = EventLoop::new();

    let (source, handle) = event_loop
        .block_on(async {
            let source = TaskCompletionSource::<u8>::new().unwrap();
            let task = source.get_task();
            (source, spawn_local(task).unwrap())
        })
        .unwrap();

    let loop_handle = event_loop.handle();
    drop(event_loop);

    assert!(loop_handle.is_closed());
    assert!(handle.is_finished());
    assert!(matches!(get_result(handle), Err(Error::Cancelled)));
    assert!(matches!(source.set_result(1), Err(Error::LoopClosed)));
}
