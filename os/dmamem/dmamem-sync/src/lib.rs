//! # Synchronization primitives for the reserved-memory driver
//!
//! - [`WriteOnce`] holds the region descriptor: written once during
//!   initialization, read without locking by every caller afterwards.
//! - [`SpinLock`] guards the small pieces of mutable platform state
//!   (pool cursors, simulated RAM pages).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;
mod write_once;

pub use spin_lock::{SpinLock, SpinLockGuard};
pub use write_once::WriteOnce;
