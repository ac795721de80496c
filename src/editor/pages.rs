//! Page deletion and reordering

use std::collections::BTreeSet;

use super::assemble;
use crate::document::DocumentHandle;
use crate::error::{Error, Result};

/// Remove `indices` (0-indexed) from the document, keeping every other page
/// in original order.
pub fn delete_pages(handle: &DocumentHandle, indices: &BTreeSet<usize>) -> Result<Vec<u8>> {
    let page_count = handle.page_count();
    for &index in indices {
        if index >= page_count {
            return Err(Error::PageIndex { index, page_count });
        }
    }

    let keep: Vec<usize> = (0..page_count).filter(|i| !indices.contains(i)).collect();
    if keep.is_empty() {
        return Err(Error::AllPagesDeleted { page_count });
    }
    assemble(handle, &keep)
}

/// Rebuild the document so output page `k` is original page `new_order[k]`.
///
/// `new_order` must have one entry per document page and every index must be
/// in range, but the sequence is NOT required to be a permutation: a
/// duplicated index duplicates that page in the output and an omitted index
/// drops it.
pub fn reorder_pages(handle: &DocumentHandle, new_order: &[usize]) -> Result<Vec<u8>> {
    let page_count = handle.page_count();
    if new_order.len() != page_count {
        return Err(Error::OrderLength {
            given: new_order.len(),
            page_count,
        });
    }
    for &index in new_order {
        if index >= page_count {
            return Err(Error::PageIndex { index, page_count });
        }
    }
    assemble(handle, new_order)
}
