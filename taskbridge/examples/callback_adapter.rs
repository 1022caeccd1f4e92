//! Example: Turning a callback-based API into an awaitable

use taskbridge::task::TaskCompletionSource;

use std::thread;
use std::time::Duration;

/// A legacy API that reports its result through a callback, from a thread
/// of its own.
fn fetch_with_callback<F>(key: &'static str, on_done: F)
where
    F: FnOnce(Result<String, String>) + Send + 'static,
{
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));

        if key.is_empty() {
            on_done(Err("empty key".to_owned()));
        } else {
            on_done(Ok(format!("value of {key}")));
        }
    });
}

async fn fetch(key: &'static str) -> taskbridge::Result<String> {
    let source = TaskCompletionSource::new()?;
    let task = source.get_task();

    fetch_with_callback(key, move |outcome| {
        let settled = match outcome {
            Ok(value) => source.set_result(value),
            Err(reason) => source.set_exception(reason),
        };

        if let Err(err) = settled {
            eprintln!("could not deliver the fetch result: {err}");
        }
    });

    task.await
}

#[taskbridge::main(name = "callback-adapter")]
async fn main() {
    match fetch("config").await {
        Ok(value) => println!("fetched: {value}"),
        Err(err) => println!("fetch failed: {err}"),
    }

    match fetch("").await {
        Ok(value) => println!("fetched: {value}"),
        Err(err) => println!("fetch failed: {err}"),
    }
}
