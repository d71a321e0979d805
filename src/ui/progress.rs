//! Progress indicators for matrix runs
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.
//! Jobs finish on rayon worker threads, so the bar is shared behind a mutex.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Thread-safe progress bar counting finished jobs
#[derive(Clone)]
pub struct JobProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Arc<Bar>,
}

impl JobProgress {
  /// Create a new progress bar for `total` jobs
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Arc::new(Mutex::new(progress)),
      bar: Arc::new(bar),
    }
  }

  /// Mark one job finished (thread-safe)
  pub fn inc(&self) {
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
