//! Identity-keyed cache for parsed render views

use std::sync::{Arc, Weak};

/// Memoizes values by the identity of their owning byte buffer.
///
/// The same `Arc<[u8]>` always maps to the same entry; content-identical but
/// distinct buffers get independent entries. Each entry holds only a `Weak`
/// to its key, so the cache never extends a buffer's lifetime — entries
/// whose buffer has been dropped are purged on every access, giving the
/// lifetime coupling of a weak-keyed map.
pub struct IdentityCache<V> {
    entries: Vec<Entry<V>>,
}

struct Entry<V> {
    key: Weak<[u8]>,
    addr: usize,
    value: V,
}

impl<V> IdentityCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Entry for `bytes`, creating it with `init` on first sight of this
    /// buffer object. `init` failures leave the cache unchanged.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        bytes: &Arc<[u8]>,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<&mut V, E> {
        self.purge();
        let addr = Arc::as_ptr(bytes).cast::<u8>() as usize;
        // after the purge every remaining key is alive, so two entries can
        // never share an address
        let index = match self.entries.iter().position(|entry| entry.addr == addr) {
            Some(index) => index,
            None => {
                let value = init()?;
                self.entries.push(Entry {
                    key: Arc::downgrade(bytes),
                    addr,
                    value,
                });
                self.entries.len() - 1
            }
        };
        Ok(&mut self.entries[index].value)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&mut self) -> usize {
        self.purge();
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    fn purge(&mut self) {
        self.entries.retain(|entry| entry.key.strong_count() > 0);
    }
}

impl<V> Default for IdentityCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
