//! Range extraction

use super::assemble;
use crate::document::DocumentHandle;
use crate::error::{Error, Result};

/// Closed inclusive interval of 0-indexed pages used by [`split`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeSpec {
    start: usize,
    end: usize,
}

impl RangeSpec {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange {
                range: format!("[{start}, {end}]"),
                reason: "start exceeds end".into(),
            });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    fn check_bounds(&self, page_count: usize) -> Result<()> {
        if self.end >= page_count {
            return Err(Error::InvalidRange {
                range: format!("[{}, {}]", self.start, self.end),
                reason: format!("end beyond last page (document has {page_count} pages)"),
            });
        }
        Ok(())
    }
}

/// Produce one output document per range, each containing exactly the pages
/// in that inclusive interval, in original order. Every range is validated
/// before any output is built, so a bad range never yields partial results.
pub fn split(handle: &DocumentHandle, ranges: &[RangeSpec]) -> Result<Vec<Vec<u8>>> {
    if ranges.is_empty() {
        return Err(Error::InvalidRange {
            range: "(none)".into(),
            reason: "at least one range is required".into(),
        });
    }
    let page_count = handle.page_count();
    for range in ranges {
        range.check_bounds(page_count)?;
    }

    ranges
        .iter()
        .map(|range| {
            let selection: Vec<usize> = (range.start..=range.end).collect();
            assemble(handle, &selection)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(matches!(
            RangeSpec::new(3, 1),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn range_accepts_single_page() {
        let range = RangeSpec::new(2, 2).unwrap();
        assert_eq!(range.start(), 2);
        assert_eq!(range.end(), 2);
    }
}
