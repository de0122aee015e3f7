//! Progress bar utilities for displaying search status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " queries"
    )))
}

/// Grow the bar's total to `total` and advance it by `n`.
/// Uses try_lock so a worker never waits on the display. When the lock is busy the update is
/// dropped; dispatch callbacks are already serialized, so only a concurrent redraw can collide.
pub fn advance_bar(pb: &ProgressBar, total: usize, n: usize) {
    if let Ok(mut bar) = pb.try_lock() {
        if total > bar.total {
            bar.total = total;
        }
        let _ = bar.update(n);
    }
}

/// Build the bar for a search when `verbose`. The total grows as queries are submitted.
pub fn setup_progress(verbose: bool, desc: &'static str) -> Option<ProgressBar> {
    verbose.then(|| create_progress_bar(ProgressBarConfig::new(0, desc, Animation::Classic)))
}

/// Progress callback for the dispatcher: one completed query, `total` submitted so far.
pub fn search_progress_callback<Q>(bar: &ProgressBar) -> impl Fn(&Q, u64) + Sync + use<Q> {
    let bar = Arc::clone(bar);
    move |_query: &Q, total: u64| advance_bar(&bar, total as usize, 1)
}

/// Print a final newline under the bar so following output starts on a fresh line.
pub fn finish_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.refresh();
        eprintln!();
    }
}
