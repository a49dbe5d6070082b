//! Scratch buffers for sort invocations.
//!
//! Key arrays are rented per invocation and released by drop, which also
//! clears any owned references they hold. Index maps are a single concrete
//! type, so they get real recycling: a small bounded per-thread cache lets
//! repeated sorts on one thread reuse their index storage.

use std::cell::RefCell;

/// Most cached index maps kept per thread.
const MAX_CACHED_MAPS: usize = 4;
/// Maps larger than this are dropped instead of cached.
const MAX_CACHED_CAPACITY: usize = 1 << 16;

thread_local! {
    static INDEX_MAPS: RefCell<Vec<Vec<usize>>> = RefCell::new(Vec::new());
}

/// Rent a key array with capacity for at least `len` keys.
///
/// Released by dropping (directly or via its comparison step), which clears
/// any references the keys own.
pub(crate) fn rent_keys<K>(len: usize) -> Vec<K> {
    Vec::with_capacity(len)
}

/// Rent an index map filled with `0..len`.
pub(crate) fn rent_index_map(len: usize) -> Vec<usize> {
    let mut map = INDEX_MAPS
        .with(|cache| cache.borrow_mut().pop())
        .unwrap_or_default();
    map.clear();
    map.extend(0..len);
    map
}

/// Return an index map to the per-thread cache.
pub(crate) fn recycle_index_map(map: Vec<usize>) {
    if map.capacity() == 0 || map.capacity() > MAX_CACHED_CAPACITY {
        return;
    }
    INDEX_MAPS.with(|cache| {
        let mut maps = cache.borrow_mut();
        if maps.len() < MAX_CACHED_MAPS {
            maps.push(map);
        }
    });
}
