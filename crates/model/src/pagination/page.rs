use serde::{Deserialize, Serialize};

/// The slice of rows a data query asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageWindow {
    pub index: usize,
    pub size: usize,
}

impl PageWindow {
    pub fn new(index: usize, size: usize) -> Self {
        PageWindow { index, size }
    }

    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PagerResult<T> {
    pub total: u64,
    pub data: Vec<T>,
    pub page_index: usize,
    pub page_size: usize,
}

impl<T> PagerResult<T> {
    pub fn new(total: u64, data: Vec<T>, window: PageWindow) -> Self {
        PagerResult {
            total,
            data,
            page_index: window.index,
            page_size: window.size,
        }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page_index, self.page_size)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagerResult<U> {
        PagerResult {
            total: self.total,
            data: self.data.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_offset() {
        assert_eq!(PageWindow::new(0, 25).offset(), 0);
        assert_eq!(PageWindow::new(3, 10).offset(), 30);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = PagerResult::new(7, vec![1, 2], PageWindow::new(1, 2)).map(|v| v * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.window(), PageWindow::new(1, 2));
        assert_eq!(page.total, 7);
    }
}
