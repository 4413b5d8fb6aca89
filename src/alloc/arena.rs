use core::cell::Cell;

/// Fixed-capacity slab handing out slots by bumping a cursor.
///
/// Slots are never returned: once `alloc` runs past the end every further
/// request fails, whatever happened to the slots handed out before.
pub struct Arena<T, const N: usize> {
    pos: Cell<usize>,
    slots: [T; N],
}

impl<T, const N: usize> Arena<T, N> {
    pub(crate) fn new(init: impl FnMut(usize) -> T) -> Self {
        Self {
            pos: Cell::new(0),
            slots: core::array::from_fn(init),
        }
    }

    /// Carves the next slot, returning its index and a reference to it
    pub(crate) fn alloc(&self) -> Option<(usize, &T)> {
        let pos = self.pos.get();
        if pos < N {
            self.pos.set(pos + 1);
            Some((pos, &self.slots[pos]))
        } else {
            // OOM
            None
        }
    }

    /// Returns a slot that has already been carved.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        if index < self.pos.get() {
            self.slots.get(index)
        } else {
            None
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pos.get()
    }

    pub(crate) fn capacity(&self) -> usize {
        N
    }

    pub(crate) fn remaining(&self) -> usize {
        N - self.pos.get()
    }
}
