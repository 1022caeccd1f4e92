use taskbridge::task::{TaskCompletionSource, from_result, get_result};
use taskbridge::{Error, LoopHandle, spawn_local};

#[taskbridge::main]
async fn default_entry() -> u32 {
    let source = TaskCompletionSource::new().unwrap();
    let task = source.get_task();

    std::thread::spawn(move || source.set_result(20)).join().unwrap().unwrap();

    task.await.unwrap() + 1
}

#[taskbridge::main(name = "entry, \"quoted\"")]
async fn named_entry() -> String {
    LoopHandle::current().unwrap().name().to_owned()
}

#[taskbridge::main(name = "nested")]
async fn nested_entry() -> taskbridge::Result<u8> {
    let inner = spawn_local(async { get_result(from_result(1u8)) }).unwrap();
    inner.await.unwrap()
}

#[test]
fn test_main_runs_async_body() {
    assert_eq!(default_entry(), 21);
}

#[test]
fn test_main_names_loop_verbatim() {
    assert_eq!(named_entry(), "entry, \"quoted\"");
}

#[test]
fn test_main_body_is_inside_loop() {
    assert!(matches!(nested_entry(), Err(Error::NestedLoop)));
}

#[test]
fn test_main_outside_loop_has_no_current() {
    default_entry();

    assert!(matches!(LoopHandle::current(), Err(Error::NoActiveLoop)));
}

#[taskbridge::test]
async fn test_test_macro_runs_on_named_loop() {
    assert_eq!(LoopHandle::current().unwrap().name(), "test");
    assert_eq!(from_result(4).await.unwrap(), 4);
}
