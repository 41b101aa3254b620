//! Throttled progress reporting for one download
//!
//! Reports follow the pipeline state machine:
//! `Start → TokenBuilt → EndpointSelected → Fetching → {Streaming |
//! Decrypting} → Validating → {Complete | Failed}`. Phase transitions are
//! always reported; byte-count updates are throttled so a fast stream does
//! not flood the callback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Pipeline phase for one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Start,
    TokenBuilt,
    EndpointSelected,
    Fetching,
    /// Plaintext body streaming to the sink.
    Streaming,
    /// Encrypted body streaming through the frame decryptor.
    Decrypting,
    Validating,
    Complete,
    Failed,
}

/// Progress snapshot passed to callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub track_id: String,
    pub title: String,
    pub phase: PipelinePhase,
    /// Index into the candidate list currently being tried.
    pub candidate: usize,
    pub bytes_written: u64,
}

/// Callback invoked with progress snapshots.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Tracks and emits progress for one download.
pub struct ProgressTracker {
    report: DownloadProgress,
    callback: Option<ProgressCallback>,
    last_emit: Instant,
    min_interval: Duration,
}

impl ProgressTracker {
    pub fn new(track_id: String, title: String, callback: Option<ProgressCallback>) -> Self {
        Self {
            report: DownloadProgress {
                track_id,
                title,
                phase: PipelinePhase::Start,
                candidate: 0,
                bytes_written: 0,
            },
            callback,
            last_emit: Instant::now(),
            min_interval: Duration::from_millis(200),
        }
    }

    /// Record a phase transition; always emitted.
    pub fn phase(&mut self, phase: PipelinePhase) {
        self.report.phase = phase;
        self.emit(true);
    }

    pub fn candidate(&mut self, index: usize) {
        self.report.candidate = index;
    }

    /// Record new byte counts; emitted at most every 200 ms.
    pub fn bytes(&mut self, bytes_written: u64) {
        self.report.bytes_written = bytes_written;
        self.emit(false);
    }

    fn emit(&mut self, force: bool) {
        let Some(callback) = &self.callback else {
            return;
        };
        if force || self.last_emit.elapsed() >= self.min_interval {
            callback(self.report.clone());
            self.last_emit = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting_tracker() -> (ProgressTracker, Arc<Mutex<Vec<DownloadProgress>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback =
            Arc::new(move |p| sink.lock().unwrap().push(p));
        let tracker =
            ProgressTracker::new("3135556".to_string(), "Test".to_string(), Some(callback));
        (tracker, seen)
    }

    #[test]
    fn phase_transitions_always_emit() {
        let (mut tracker, seen) = collecting_tracker();
        tracker.phase(PipelinePhase::TokenBuilt);
        tracker.phase(PipelinePhase::Fetching);
        tracker.phase(PipelinePhase::Complete);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].phase, PipelinePhase::TokenBuilt);
        assert_eq!(seen[2].phase, PipelinePhase::Complete);
    }

    #[test]
    fn byte_updates_are_throttled() {
        let (mut tracker, seen) = collecting_tracker();
        for i in 0..100 {
            tracker.bytes(i * 1024);
        }
        // Far fewer callbacks than updates within one throttle window.
        assert!(seen.lock().unwrap().len() <= 1);
    }

    #[test]
    fn no_callback_is_a_no_op() {
        let mut tracker = ProgressTracker::new(String::new(), String::new(), None);
        tracker.phase(PipelinePhase::Failed);
        tracker.bytes(4096);
    }
}
