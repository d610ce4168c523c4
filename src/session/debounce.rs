use tokio::time::{sleep_until, Duration, Instant};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Single quiet-period timer owned by its session (no shared module
/// state). Every keystroke restarts the period; the pending apply fires
/// at most once per period and never cancels an in-flight fetch.
#[derive(Debug)]
pub struct Debounce {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn restart(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Sleeps out the quiet period, consuming the pending timer. Returns
    /// false when nothing was armed.
    pub async fn settle(&mut self) -> bool {
        match self.deadline.take() {
            Some(deadline) => {
                sleep_until(deadline).await;
                true
            }
            None => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
