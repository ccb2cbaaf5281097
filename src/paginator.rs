/// Page window over an ordered result set. Pages start at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    page: u32,
    page_size: u32,
}

impl Paginator {
    /// Page numbers below 1 are read as page 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Paginator {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    pub fn page_count(&self, total: u64) -> u32 {
        if total == 0 {
            return 0;
        }
        let upper_bound = total - 1;
        ((upper_bound / self.page_size as u64) + 1) as u32
    }
}
