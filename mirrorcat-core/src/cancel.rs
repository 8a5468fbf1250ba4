use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run-level cancellation flag shared between the driver, its workers and
/// whoever requested the stop. Checked between archives and between members.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
