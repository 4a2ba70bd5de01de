// src/miner/cancel.rs
use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Non-blocking stop signal polled once per hash attempt
pub trait CancelSignal {
    /// True once the search should stop
    fn is_cancelled(&self) -> bool;
}

/// A message or a closed channel both count as cancel, so dropping every
/// sender stops the search and `crossbeam_channel::after` works as a deadline.
impl<T> CancelSignal for Receiver<T> {
    fn is_cancelled(&self) -> bool {
        !matches!(self.try_recv(), Err(TryRecvError::Empty))
    }
}

impl CancelSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl<S: CancelSignal + ?Sized> CancelSignal for Arc<S> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<S: CancelSignal + ?Sized> CancelSignal for &S {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Signal that never fires
#[derive(Debug, Default, Clone, Copy)]
pub struct Never;

impl CancelSignal for Never {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_channel_message_cancels() {
        let (tx, rx) = bounded::<()>(1);
        assert!(!rx.is_cancelled());
        tx.send(()).unwrap();
        assert!(rx.is_cancelled());
    }

    #[test]
    fn test_dropped_sender_cancels() {
        let (tx, rx) = bounded::<()>(1);
        drop(tx);
        assert!(rx.is_cancelled());
    }

    #[test]
    fn test_flag_cancels() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!flag.is_cancelled());
        flag.store(true, Ordering::SeqCst);
        assert!(flag.is_cancelled());
        assert!(!Never.is_cancelled());
    }
}
