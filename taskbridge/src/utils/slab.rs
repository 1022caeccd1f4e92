use std::mem::MaybeUninit;

/// A simple slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and returns
/// small indices that are reused after removal. The event loop uses it to
/// give every spawned task a compact id that wakers can carry across
/// threads.
///
/// Indices are recycled, so an id may refer to a newer value after the
/// original one was removed. Callers must tolerate that (for the loop, a
/// stale wake-up results in a spurious poll, which futures must accept).
pub(crate) struct Slab<T> {
    /// Storage for items (may contain uninitialized slots).
    items: Vec<MaybeUninit<T>>,
    /// Stack of free indices that can be reused.
    free: Vec<usize>,
    /// Marks whether a slot is currently initialized.
    used: Vec<bool>,
    /// Number of initialized slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with `size` free slots.
    pub(crate) fn new(size: usize) -> Self {
        let items = (0..size).map(|_| MaybeUninit::<T>::uninit()).collect();
        // Reversed so that `pop` hands out the lowest index first.
        let free = (0..size).rev().collect();
        let used = vec![false; size];

        Self {
            items,
            free,
            used,
            len: 0,
        }
    }

    /// Inserts a value and returns its index.
    ///
    /// A free slot is reused when available, otherwise the slab doubles.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                let len = self.items.len();
                let new_len = if len == 0 { 1 } else { 2 * len };

                self.items
                    .extend((len..new_len).map(|_| MaybeUninit::<T>::uninit()));
                self.free.extend(((len + 1)..new_len).rev());
                self.used.resize(new_len, false);

                len
            }
        };

        self.items[index] = MaybeUninit::new(item);
        self.used[index] = true;
        self.len += 1;

        index
    }

    /// Returns the index the next [`insert`](Self::insert) will use.
    pub(crate) fn vacant_index(&self) -> usize {
        self.free.last().copied().unwrap_or(self.items.len())
    }

    /// Removes and returns the value stored at `index`.
    ///
    /// Returns `None` if the slot is out of range or empty.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        if !self.contains(index) {
            return None;
        }

        self.free.push(index);
        self.used[index] = false;
        self.len -= 1;

        // Safety: `used[index]` was true, so the slot is initialized, and it
        // is marked free before anyone can observe it again.
        let item = unsafe { self.items[index].assume_init_read() };
        self.items[index] = MaybeUninit::uninit();

        Some(item)
    }

    /// Returns a mutable reference to the value at `index`, if present.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if !self.contains(index) {
            return None;
        }

        // Safety: checked above that the slot is initialized.
        Some(unsafe { self.items[index].assume_init_mut() })
    }

    /// Returns `true` if `index` currently holds a value.
    pub(crate) fn contains(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    /// Number of values currently stored.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every value, returning them in index order.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);

        for index in 0..self.items.len() {
            if let Some(item) = self.remove(index) {
                out.push(item);
            }
        }

        out
    }
}

impl<T> Drop for Slab<T> {
    /// Drops all initialized elements stored in the slab.
    fn drop(&mut self) {
        for (slot, &used) in self.items.iter_mut().zip(self.used.iter()) {
            if used {
                unsafe {
                    slot.assume_init_drop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Slab;

    #[test]
    fn insert_reuses_freed_slots() {
        let mut slab = Slab::new(2);

        let a = slab.insert("a");
        let b = slab.insert("b");
        assert_eq!((a, b), (0, 1));

        assert_eq!(slab.remove(a), Some("a"));
        assert_eq!(slab.vacant_index(), a);
        assert_eq!(slab.insert("c"), a);
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut slab = Slab::new(0);

        let ids: Vec<_> = (0..5)
            .map(|i| {
                let expected = slab.vacant_index();
                let id = slab.insert(i);
                assert_eq!(id, expected);
                id
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(slab.len(), 5);
    }

    #[test]
    fn missing_slots_are_none() {
        let mut slab: Slab<u8> = Slab::new(1);

        assert!(slab.get_mut(0).is_none());
        assert!(slab.get_mut(42).is_none());
        assert_eq!(slab.remove(7), None);
    }

    #[test]
    fn drain_empties_the_slab() {
        let mut slab = Slab::new(4);
        slab.insert(1);
        let gone = slab.insert(2);
        slab.insert(3);
        slab.remove(gone);

        assert_eq!(slab.drain(), vec![1, 3]);
        assert_eq!(slab.len(), 0);
        assert!(!slab.contains(0));
    }
}
