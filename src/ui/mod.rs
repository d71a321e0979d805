pub mod progress;

pub use progress::JobProgress;
