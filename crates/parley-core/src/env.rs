//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from system resources (time, randomness).
//! Enables deterministic simulation (virtual clock, seeded RNG) and
//! production use with real system resources.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls within a
    ///   single execution context.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be
    /// used by driver code (not protocol logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, a simulation environment produces the
    ///   same sequence of bytes
    /// - Production environments use a cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Current wall-clock time in Unix milliseconds.
    ///
    /// Used only for message timestamps (transcript ordering); protocol
    /// timing decisions use the monotonic [`Environment::now`].
    fn wall_clock_ms(&self) -> u64;

    /// Generates a random `u64`.
    ///
    /// Convenience for common use cases like request IDs.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a random `u128`.
    ///
    /// Useful for conversation IDs.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}

/// Production environment using system time and cryptographic RNG.
///
/// Uses `std::time::Instant::now()` for time, `tokio::time::sleep()` for
/// async sleeping, and getrandom for cryptographic randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional - a client without
/// functioning cryptographic randomness cannot operate securely, and RNG
/// failure indicates OS-level issues.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - client cannot operate securely");
    }

    #[allow(clippy::expect_used)]
    fn wall_clock_ms(&self) -> u64 {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_millis();

        // INVARIANT: u64 milliseconds overflow in the year 584,556,019.
        millis as u64
    }
}

/// Deterministic environment with a manually-advanced clock and seeded
/// RNG.
///
/// Intended for tests and simulations: time only moves when
/// [`ManualEnv::advance`] is called, and the RNG is a seeded xorshift
/// producing a reproducible byte stream. NOT cryptographically secure -
/// never use in production.
#[derive(Clone)]
pub struct ManualEnv {
    inner: Arc<Mutex<ManualEnvState>>,
}

struct ManualEnvState {
    elapsed: Duration,
    rng_state: u64,
    wall_clock_base_ms: u64,
}

impl ManualEnv {
    /// Create a deterministic environment from an RNG seed.
    ///
    /// The virtual clock starts at zero elapsed time; wall clock starts
    /// at a fixed arbitrary epoch so timestamps are stable across runs.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualEnvState {
                elapsed: Duration::ZERO,
                // A zero xorshift state would emit zeros forever.
                rng_state: seed | 1,
                wall_clock_base_ms: 1_700_000_000_000,
            })),
        }
    }

    /// Advance the virtual clock.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.elapsed += duration;
    }
}

impl Environment for ManualEnv {
    type Instant = Duration;

    fn now(&self) -> Self::Instant {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).elapsed
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        // Virtual time: sleeping advances the clock and resolves at once.
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        for chunk in buffer.chunks_mut(8) {
            // xorshift64
            let mut x = state.rng_state;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            state.rng_state = x;

            let bytes = x.to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn wall_clock_ms(&self) -> u64 {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.wall_clock_base_ms + state.elapsed.as_millis() as u64
    }
}
