//! Inter-fetch delay
//!
//! Keeps sequential fetches a fixed interval apart so upstream servers and the
//! search endpoint are not hammered. Injected so tests never sleep.

use std::cell::RefCell;
use std::time::Duration;

pub trait Pacer {
    fn pause(&self, delay: Duration);
}

impl<P: Pacer + ?Sized> Pacer for &P {
    fn pause(&self, delay: Duration) {
        (**self).pause(delay)
    }
}

/// Sleeps the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacer;

impl Pacer for NoPacer {
    fn pause(&self, _delay: Duration) {}
}

/// Records requested pauses instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: RefCell<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.pauses.borrow().iter().sum()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, delay: Duration) {
        self.pauses.borrow_mut().push(delay);
    }
}
