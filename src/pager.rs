//! Page cursor for the admin purchase log.

/// Entries fetched per page.
pub const PAGE_SIZE: u32 = 10;

/// 1-indexed page cursor with the total cached from the last response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPager {
    page: u32,
    total: u64,
}

impl Default for LogPager {
    fn default() -> Self {
        Self::new()
    }
}

impl LogPager {
    pub fn new() -> Self {
        Self { page: 1, total: 0 }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn record_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        u64::from(self.page) * u64::from(PAGE_SIZE) < self.total
    }

    /// Move back one page. Returns false at the first page.
    pub fn prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Move forward one page. Returns false when the current page already
    /// reaches the cached total.
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
