use char_duper_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Terminal progress for duplicate scans: a percentage bar while scanning,
/// a one-line summary when done.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, total_characters: usize) {
        let pb = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Comparing [{bar:30.cyan/dim}] {pos}% {msg}",
        ) {
            pb.set_style(
                style
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
        }
        pb.set_message(format!("{} characters", total_characters));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_scan_progress(&self, percent: u8) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(percent as u64);
            }
        }
    }

    fn on_scan_complete(&self, groups: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} duplicate groups in {:.2}s",
            groups, duration_secs
        );
    }

    fn on_cache_hit(&self, groups: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Using cached result: {} duplicate groups",
            groups
        );
    }
}
