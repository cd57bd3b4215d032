use crate::upload::orchestrator::DEFAULT_CONCURRENCY;
use std::time::Duration;

// Define the global arguments
#[derive(Debug, Clone, Copy)]
pub struct GlobalArgs {
    pub retries: u32,
    pub retry_delay: Duration,
    pub workers: usize,
    pub quiet: bool,
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalArgs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_secs(1),
            workers: DEFAULT_CONCURRENCY,
            quiet: false,
        }
    }

    pub const fn set_retries(&mut self, retries: u32) {
        self.retries = retries;
    }

    pub fn set_workers(&mut self, workers: usize) {
        self.workers = workers.max(1);
    }
}
