use log::info;
use std::path::Path;
use std::time::Instant;

/// Log-based progress for one dump file
///
/// Emits an `info!` line each time another tenth of the file is done.
#[derive(Debug)]
pub struct Progress {
    label: String,
    total: u64,
    done: u64,
    next_decile: u64,
    started: Instant,
}

impl Progress {
    pub fn new(path: &Path, total: u64) -> Self {
        Self {
            label: path.display().to_string(),
            total,
            done: 0,
            next_decile: 1,
            started: Instant::now(),
        }
    }

    /// Record `lines` more lines as processed
    pub fn advance(&mut self, lines: u64) {
        self.done += lines;
        let percent = self.percent();
        if self.total > 0 && percent >= self.next_decile * 10 {
            info!(
                "{}: {}% ({}/{} lines, {:.1}s)",
                self.label,
                percent,
                self.done,
                self.total,
                self.started.elapsed().as_secs_f64()
            );
            self.next_decile = percent / 10 + 1;
        }
    }

    /// Lines processed so far
    pub fn done(&self) -> u64 {
        self.done
    }

    /// Whole percent complete, capped at 100
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        (self.done.saturating_mul(100) / self.total).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let mut progress = Progress::new(Path::new("m0trace_1.txt"), 200);
        assert_eq!(progress.percent(), 0);
        progress.advance(50);
        assert_eq!(progress.percent(), 25);
        progress.advance(150);
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.done(), 200);
    }

    #[test]
    fn test_empty_file_is_complete() {
        let progress = Progress::new(Path::new("empty.txt"), 0);
        assert_eq!(progress.percent(), 100);
    }
}
