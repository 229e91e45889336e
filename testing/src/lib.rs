//! # Atelier Testing
//!
//! Testing utilities for the Atelier booking engine:
//!
//! - [`mocks::FixedClock`] / [`mocks::test_clock`]: deterministic time
//! - [`memory`]: in-memory implementations of every store port
//!   (`HashMap` behind a `tokio::sync::RwLock`)
//! - [`queue::RecordingJobQueue`]: captures enqueued jobs and can inject
//!   dispatch failures
//! - [`fixtures`]: builders for common test entities
//!
//! The fakes honor the same contracts as the Postgres stores, including
//! the optimistic [`StaleWrite`](atelier_core::store::StoreError::StaleWrite)
//! guard on appointment writes, so engine tests exercise the same code
//! paths production does.
//!
//! # Example
//!
//! ```ignore
//! use atelier_testing::{fixtures, mocks::test_clock, memory::InMemoryAgendaStore};
//!
//! #[tokio::test]
//! async fn books_inside_working_hours() {
//!     let agendas = InMemoryAgendaStore::default();
//!     let agenda = fixtures::open_agenda(UserId::new());
//!     agendas.insert(agenda.clone()).await;
//!     // ... drive the engine against the fakes
//! }
//! ```

pub mod fixtures;
pub mod memory;
pub mod queue;

/// Mock implementations of environment traits.
pub mod mocks {
    use atelier_core::clock::Clock;
    use chrono::{DateTime, Utc};

    /// Fixed clock for deterministic tests.
    ///
    /// Always returns the same time, making penalty buckets and log
    /// timestamps reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use atelier_testing::mocks::FixedClock;
    /// use atelier_core::clock::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-06-02 09:00:00 UTC,
    /// a Monday).
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to
    /// parse, which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-02T09:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
pub use queue::RecordingJobQueue;
