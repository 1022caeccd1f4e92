use taskbridge::task::{
    TaskCompletionSource, from_result, get_awaiter, get_result, run_synchronously, start, start_on,
    zero,
};
use taskbridge::{Error, EventLoop, EventLoopBuilder, spawn_local, yield_now};

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Builds a loop whose unhandled failures are collected as strings.
fn collecting_loop() -> (EventLoop, Arc<Mutex<Vec<String>>>) {
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = failures.clone();

    let event_loop = EventLoopBuilder::new()
        .name("collecting")
        .on_unhandled(move |err| sink.lock().unwrap().push(err.to_string()))
        .build();

    (event_loop, failures)
}

#[test]
fn test_from_result_round_trip() {
    assert_eq!(get_result(from_result(42)).unwrap(), 42);
    assert_eq!(get_result(from_result("text")).unwrap(), "text");
    assert_eq!(get_result(from_result(None::<u8>)).unwrap(), None);
    assert!(get_result(from_result(())).is_ok());
}

#[test]
fn test_zero_completes_immediately() {
    assert!(get_result(zero()).is_ok());
    assert!(run_synchronously(zero()).is_ok());
}

#[test]
fn test_get_result_waits_for_completion_source() {
    let value = get_result(async {
        let source = TaskCompletionSource::new()?;
        let task = source.get_task();

        thread::spawn(move || source.set_result(vec!["a", "b"]));

        task.await
    })
    .unwrap();

    assert_eq!(value, vec!["a", "b"]);
}

#[test]
fn test_get_result_propagates_fault() {
    let err = get_result(async {
        let source = TaskCompletionSource::<u8>::new()?;
        source.set_exception(io::Error::other("disk full"))?;
        source.get_task().await
    })
    .unwrap_err();

    assert!(err.is_faulted());
    let fault = err.as_fault().unwrap();
    assert_eq!(
        fault.downcast_ref::<io::Error>().unwrap().to_string(),
        "disk full"
    );
}

#[test]
fn test_get_result_propagates_cancellation() {
    let err = get_result(async {
        let source = TaskCompletionSource::<u8>::new()?;
        source.set_cancelled()?;
        source.get_task().await
    })
    .unwrap_err();

    assert!(err.is_cancelled());
}

#[test]
fn test_get_result_inside_loop_is_rejected() {
    let event_loop = EventLoop::new();

    let (nested_result, nested_run) = event_loop
        .block_on(async { (get_result(from_result(1)), run_synchronously(zero())) })
        .unwrap();

    assert!(matches!(nested_result, Err(Error::NestedLoop)));
    assert!(matches!(nested_run, Err(Error::NestedLoop)));
}

#[test]
fn test_get_result_inside_spawned_task_is_rejected() {
    let event_loop = EventLoop::new();

    let nested = event_loop
        .block_on(async {
            spawn_local(async { get_result(from_result(1)) })
                .unwrap()
                .await
        })
        .unwrap();

    assert!(matches!(nested, Ok(Err(Error::NestedLoop))));
}

#[test]
fn test_run_synchronously_discards_value() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();

    let outcome = run_synchronously(async move {
        counter.set(counter.get() + 1);
        Ok::<_, Error>("ignored")
    });

    assert!(outcome.is_ok());
    assert_eq!(runs.get(), 1);
}

#[test]
fn test_run_synchronously_reports_failure() {
    let outcome = run_synchronously(async { Err::<(), _>(Error::faulted("broken pipe")) });

    assert_eq!(
        outcome.unwrap_err().to_string(),
        "the task faulted: broken pipe"
    );
}

#[test]
fn test_get_awaiter_forwards_value() {
    assert_eq!(get_result(get_awaiter(from_result(3))).unwrap(), 3);
}

#[test]
fn test_get_awaiter_forwards_fault() {
    let err = get_result(get_awaiter(async {
        Err::<u8, _>(Error::faulted("upstream failed"))
    }))
    .unwrap_err();

    assert!(err.is_faulted());
}

#[test]
fn test_get_awaiter_reports_panic() {
    let err = get_result(get_awaiter(async {
        if true {
            panic!("awaiter blew up");
        }
        Ok::<u8, Error>(0)
    }))
    .unwrap_err();

    assert!(matches!(&err, Error::Panicked(msg) if msg == "awaiter blew up"));
}

#[taskbridge::test]
async fn test_get_awaiter_runs_as_separate_task() {
    let source = TaskCompletionSource::new().unwrap();
    let awaiter = get_awaiter(source.get_task());

    source.set_result(8u16).unwrap();
    assert_eq!(awaiter.await.unwrap(), 8);
}

#[test]
fn test_start_outside_loop_fails() {
    assert!(matches!(start(zero()), Err(Error::NoActiveLoop)));
}

#[test]
fn test_start_failure_is_isolated() {
    let (event_loop, failures) = collecting_loop();
    let ran = Rc::new(Cell::new(false));

    let outcome = event_loop
        .block_on(async {
            start(async { Err::<(), _>(Error::faulted("background boom")) })?;

            let flag = ran.clone();
            start(async move {
                flag.set(true);
                Ok::<_, Error>(())
            })?;

            yield_now().await;
            Ok::<_, Error>("caller finished")
        })
        .unwrap();

    assert_eq!(outcome.unwrap(), "caller finished");
    assert!(ran.get());
    assert_eq!(
        *failures.lock().unwrap(),
        vec!["the task faulted: background boom".to_owned()]
    );

    // The loop keeps working after the failure.
    assert_eq!(event_loop.block_on(async { 5 }).unwrap(), 5);
}

#[test]
fn test_start_panic_is_isolated() {
    let (event_loop, failures) = collecting_loop();

    event_loop
        .block_on(async {
            start(async {
                if true {
                    panic!("fire and forget");
                }
                Ok::<(), Error>(())
            })
            .unwrap();

            yield_now().await;
        })
        .unwrap();

    assert_eq!(
        *failures.lock().unwrap(),
        vec!["the task panicked: fire and forget".to_owned()]
    );
}

#[test]
fn test_start_on_from_foreign_thread() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();

    let source = event_loop
        .block_on(async { TaskCompletionSource::<u32>::new() })
        .unwrap()
        .unwrap();
    let task = source.get_task();

    thread::spawn(move || start_on(&handle, async move { source.set_result(11) }))
        .join()
        .unwrap()
        .unwrap();

    assert_eq!(event_loop.block_on(task).unwrap().unwrap(), 11);
}

#[test]
fn test_start_on_closed_loop_fails() {
    let handle = EventLoop::new().handle();

    assert!(matches!(start_on(&handle, zero()), Err(Error::LoopClosed)));
}

#[test]
fn test_start_on_failure_is_isolated() {
    let (event_loop, failures) = collecting_loop();
    let handle = event_loop.handle();

    thread::spawn(move || {
        start_on(&handle, async {
            Err::<(), _>(Error::faulted("remote failure"))
        })
    })
    .join()
    .unwrap()
    .unwrap();

    let outcome = event_loop
        .block_on(async {
            yield_now().await;
            yield_now().await;
            "caller finished"
        })
        .unwrap();

    assert_eq!(outcome, "caller finished");
    assert_eq!(
        *failures.lock().unwrap(),
        vec!["the task faulted: remote failure".to_owned()]
    );
}

#[test]
fn test_panicking_unhandled_handler_is_contained() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let event_loop = EventLoopBuilder::new()
        .on_unhandled(move |err| {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("handler failed on {err}");
        })
        .build();

    event_loop
        .handle()
        .call_soon_threadsafe(|| panic!("callback failed"))
        .unwrap();

    let outcome = event_loop.block_on(async {
        start(async { Err::<(), _>(Error::faulted("first")) }).unwrap();
        yield_now().await;

        start(async { Err::<(), _>(Error::faulted("second")) }).unwrap();
        yield_now().await;

        "still running"
    });

    assert_eq!(outcome.unwrap(), "still running");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // The loop stays usable afterwards.
    assert_eq!(event_loop.block_on(async { 9 }).unwrap(), 9);
}
