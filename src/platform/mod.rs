//! Hardware seams: the millisecond time source, critical sections and
//! thread-mode detection.

use core::sync::atomic::{
    AtomicU32,
    Ordering,
};

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
pub use self::cortex_m::{
    critical_section,
    in_thread_mode,
};

#[cfg(all(not(all(feature = "cortex-m", target_arch = "arm")), feature = "std"))]
pub use self::std::{
    critical_section,
    in_thread_mode,
    StdClock,
};

#[cfg(not(any(all(feature = "cortex-m", target_arch = "arm"), feature = "std")))]
pub use self::bare::{
    critical_section,
    in_thread_mode,
};

/// A free-running millisecond counter.
///
/// The counter is 32 bits wide and wraps from `u32::MAX` to `0`; the
/// scheduler computes elapsed time with wrapping arithmetic.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<C> Clock for &C
    where C: Clock + ?Sized,
{
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Millisecond counter advanced from a periodic timer interrupt.
///
/// The ISR calls [`TickCounter::tick`] once per millisecond; thread-mode
/// code only ever reads it, with a single word-sized load.
pub struct TickCounter {
    ms: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            ms: AtomicU32::new(0),
        }
    }

    /// Advance by one millisecond. Intended for the timer interrupt.
    pub fn tick(&self) {
        self.advance(1)
    }

    /// Advance by `ms` milliseconds, wrapping at 2^32.
    pub fn advance(&self, ms: u32) {
        // thumbv6m has no atomic read-modify-write
        critical_section(|| {
            let now = self.ms.load(Ordering::Relaxed);
            self.ms.store(now.wrapping_add(ms), Ordering::Relaxed);
        })
    }

    /// Force the counter to `ms`.
    pub fn set(&self, ms: u32) {
        self.ms.store(ms, Ordering::Relaxed);
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TickCounter {
    fn now_ms(&self) -> u32 {
        self.ms.load(Ordering::Relaxed)
    }
}

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
mod cortex_m {
    pub fn in_thread_mode() -> bool {
        const SCB_ICSR: *const u32 = 0xE000_ED04 as *const u32;
        // NOTE(unsafe) single-instruction load with no side effects
        unsafe { SCB_ICSR.read_volatile() & 0x1FF == 0 }
    }

    pub fn critical_section<F, R>(f: F) -> R
        where
            F: FnOnce() -> R,
    {
        ::cortex_m::interrupt::free(|_| f())
    }
}

#[cfg(all(not(all(feature = "cortex-m", target_arch = "arm")), feature = "std"))]
mod std {
    use std::{
        sync::Mutex,
        time::Instant,
    };

    use super::Clock;

    pub fn in_thread_mode() -> bool {
        true
    }

    pub fn critical_section<F, R>(f: F) -> R
        where
            F: FnOnce() -> R,
    {
        static LOCK: Mutex<()> = Mutex::new(());
        let _lock = LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }

    /// Wall-clock milliseconds since the clock was created, for host builds.
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        start: Instant,
    }

    impl StdClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        fn now_ms(&self) -> u32 {
            // truncation is the 32-bit wrap
            self.start.elapsed().as_millis() as u32
        }
    }
}

#[cfg(not(any(all(feature = "cortex-m", target_arch = "arm"), feature = "std")))]
mod bare {
    pub fn in_thread_mode() -> bool {
        true
    }

    /// Single core, no interrupt controller to mask: run `f` directly.
    pub fn critical_section<F, R>(f: F) -> R
        where
            F: FnOnce() -> R,
    {
        f()
    }
}
