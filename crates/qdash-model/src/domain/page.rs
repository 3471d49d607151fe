const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 1000;

/// One-based pagination for listing tasks in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page: usize,
    pub size: usize,
}

impl PageOptions {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page: page.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let page = PageOptions::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 20);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn zero_page_is_first_page() {
        let page = PageOptions::new(0, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn offset_follows_page_number() {
        let page = PageOptions::new(3, 100);
        assert_eq!(page.offset(), 200);
        assert_eq!(page.next().offset(), 300);
    }

    #[test]
    fn size_is_clamped() {
        assert_eq!(PageOptions::new(1, 0).size, 1);
        assert_eq!(PageOptions::new(1, 50_000).size, MAX_PAGE_SIZE);
    }
}
