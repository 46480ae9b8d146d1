//! Upload progress tracking
//!
//! A single visible [`UploadProgress`] is tracked per controller. Multi-file
//! uploads do not report byte progress; they are tracked by an
//! [`UploadCounter`] that fires once every file has settled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Byte-level progress callback: `(loaded, total)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Visible progress of the current single-file upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Whether an upload is in flight
    pub active: bool,
    /// Bytes sent so far
    pub loaded: u64,
    /// Bytes to send
    pub total: u64,
    /// `round(loaded / total * 100)`, 0 when total is unknown
    pub percent: u8,
}

impl UploadProgress {
    /// Progress record for an upload that has just started.
    pub fn started(total: u64) -> Self {
        Self::at(0, total)
    }

    /// Active progress at `loaded` of `total` bytes.
    pub fn at(loaded: u64, total: u64) -> Self {
        Self {
            active: true,
            loaded,
            total,
            percent: percent_of(loaded, total),
        }
    }

    /// Inactive, zeroed record.
    pub fn idle() -> Self {
        Self::default()
    }
}

fn percent_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (loaded as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Completion counter for uploads issued together.
#[derive(Debug)]
pub struct UploadCounter {
    total: usize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl UploadCounter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Record one settled upload. Returns `true` for the call that settles the
    /// last outstanding file.
    pub fn record(&self, ok: bool) -> bool {
        if !ok {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst) + 1 == self.total
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn all_succeeded(&self) -> bool {
        self.completed() == self.total && self.failed() == 0
    }
}

/// Human-readable byte count in binary units, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exp < UNITS.len() - 1 {
        scaled /= 1024;
        exp += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp])
}
