//! Example: Fire-and-forget tasks and blocking bridges

use taskbridge::task::{TaskCompletionSource, get_result, start, start_on};
use taskbridge::{Error, EventLoopBuilder, yield_now};

use std::thread;

fn main() -> taskbridge::Result<()> {
    // Blocking bridge from plain synchronous code
    let answer = get_result(async { Ok::<_, Error>(6 * 7) })?;
    println!("answer: {answer}");

    // A loop that prints failures nobody awaited
    let event_loop = EventLoopBuilder::new()
        .name("background")
        .on_unhandled(|err| eprintln!("background task failed: {err}"))
        .build();

    let source = event_loop.block_on(async {
        start(async { Err::<(), _>(Error::faulted("lost connection")) })?;
        yield_now().await;

        TaskCompletionSource::<u64>::new()
    })??;

    // Schedule work on the loop from another thread
    let handle = event_loop.handle();
    let task = source.get_task();

    thread::spawn(move || {
        start_on(&handle, async move {
            let sum = (1..=10).sum();
            source.set_result(sum)
        })
    })
    .join()
    .map_err(|_| Error::faulted("producer thread panicked"))??;

    let sum = event_loop.block_on(task)??;
    println!("sum computed on the loop: {sum}");

    Ok(())
}
