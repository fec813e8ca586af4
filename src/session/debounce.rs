//! Trailing-edge debounce over a watch channel.
//!
//! Settings edits arrive on every keystroke or slider tick. The debouncer
//! publishes a value only after no newer value arrived for the whole delay.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::SETTINGS_DEBOUNCE;

pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Debouncer with the settings panel delay.
    pub fn new(initial: T) -> Self {
        Self::with_delay(initial, SETTINGS_DEBOUNCE)
    }

    /// Must be called inside a tokio runtime.
    pub fn with_delay(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);
        let task = tokio::spawn(run(input_rx, output_tx, delay));
        Self {
            input,
            output,
            task,
        }
    }

    pub fn update(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Latest settled value
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T: Clone>(mut input: watch::Receiver<T>, output: watch::Sender<T>, delay: Duration) {
    loop {
        if input.changed().await.is_err() {
            return;
        }
        // Restart the quiet period on every newer value
        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => break,
                changed = input.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        let value = input.borrow_and_update().clone();
        output.send_replace(value);
    }
}
