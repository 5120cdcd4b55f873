//! Time abstractions
//!
//! A [`Clock`] trait over monotonic time so TTL-bound components can be
//! tested by advancing a [`MockClock`] instead of sleeping.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use s3manager_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
