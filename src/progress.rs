//! Scan progress and the final tally.

/// Progress is reported each time another this-many percent of files is done.
pub const REPORT_STEP: u64 = 5;

#[derive(Debug, Default)]
pub struct Progress {
    total: u64,
    done: u64,
    reported: u64,
}

impl Progress {
    pub fn new(total: u64) -> Self {
        Self { total, done: 0, reported: 0 }
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Count one more file, returning the percentage when it crosses the next
    /// [`REPORT_STEP`]. The last file always reports 100.
    pub fn advance(&mut self) -> Option<u64> {
        if self.total == 0 {
            return None;
        }
        self.done = (self.done + 1).min(self.total);
        let percent = self.done * 100 / self.total;
        let bucket = percent - percent % REPORT_STEP;
        if bucket > self.reported {
            self.reported = bucket;
            Some(percent)
        } else {
            None
        }
    }
}

/// What happened to the files of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub matched: u64,
    pub unmatched: u64,
    /// Files that could not be read.
    pub skipped: u64,
    /// Directories that could not be listed.
    pub unreadable_directories: u64,
}
