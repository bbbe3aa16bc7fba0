use core::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

mod slot {
    pub const VACANT: u8 = 0;
    pub const FILLING: u8 = 1;
    pub const FILLED: u8 = 2;
}

/// A cell that is written at most once and then only read.
///
/// Readers never block: [`get`](Self::get) either sees the fully published
/// value or `None`. A second [`set`](Self::set) is rejected and hands the
/// value back. The only way to empty the cell is [`take`](Self::take), which
/// needs `&mut self` and therefore cannot race a reader.
pub struct WriteOnce<T> {
    slot: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

// Safety: writers are serialized by the VACANT -> FILLING transition and
// readers only ever see `&T` after FILLED.
unsafe impl<T: Send + Sync> Sync for WriteOnce<T> {}
unsafe impl<T: Send> Send for WriteOnce<T> {}

impl<T> Default for WriteOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WriteOnce<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: AtomicU8::new(slot::VACANT),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot.load(Ordering::Acquire) == slot::FILLED
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        // Safety: FILLED is only observed after the Release in `fill`.
        self.is_set().then(|| unsafe { self.filled_ref() })
    }

    /// Publish `value` unless the cell is already written or being written.
    ///
    /// # Errors
    /// Hands `value` back if another writer got there first.
    pub fn set(&self, value: T) -> Result<&T, T> {
        if self.claim() {
            Ok(self.fill(value))
        } else {
            Err(value)
        }
    }

    /// Move the value out and leave the cell vacant.
    pub fn take(&mut self) -> Option<T> {
        let state = self.slot.get_mut();
        if *state != slot::FILLED {
            return None;
        }
        *state = slot::VACANT;
        // Safety: was FILLED, and the reset above prevents a second read.
        Some(unsafe { self.value.get_mut().assume_init_read() })
    }

    fn claim(&self) -> bool {
        self.slot
            .compare_exchange(slot::VACANT, slot::FILLING, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Must only be called by the thread that won [`claim`](Self::claim).
    fn fill(&self, value: T) -> &T {
        // Safety: FILLING excludes every other writer and all readers.
        unsafe { (*self.value.get()).write(value) };
        self.slot.store(slot::FILLED, Ordering::Release);
        // Safety: just published.
        unsafe { self.filled_ref() }
    }

    /// # Safety
    /// The slot must be FILLED.
    unsafe fn filled_ref(&self) -> &T {
        unsafe { (*self.value.get()).assume_init_ref() }
    }
}

impl<T> Drop for WriteOnce<T> {
    fn drop(&mut self) {
        if *self.slot.get_mut() == slot::FILLED {
            // Safety: FILLED and exclusively borrowed.
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}
