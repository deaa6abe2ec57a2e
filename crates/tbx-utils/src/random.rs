//! Seedable pseudo-random number generator.
//!
//! Numbers come from a ChaCha8 stream. The stream is seeded lazily on the
//! first draw by the installed seed handler, so an application can supply
//! entropy (an ADC reading, a unique device ID) before the first number is
//! requested.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tbx_core::Assertions;

/// Callback supplying the 32-bit seed for the generator.
pub type SeedInitHandler = Box<dyn Fn() -> u32 + Send + Sync>;

struct State {
    seed_handler: SeedInitHandler,
    rng: Option<ChaCha8Rng>,
}

/// Pseudo-random number generator with a swappable seed source.
pub struct Random {
    state: Mutex<State>,
    asserts: Arc<Assertions>,
}

/// Seed derived from the system clock.
#[allow(clippy::cast_possible_truncation)]
pub fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0x5EED_1234, |elapsed| {
            let nanos = elapsed.as_nanos();
            (nanos as u32) ^ ((nanos >> 32) as u32)
        })
}

impl Random {
    /// Create a generator seeded from the system clock.
    #[must_use]
    pub fn new(asserts: Arc<Assertions>) -> Self {
        Self {
            state: Mutex::new(State {
                seed_handler: Box::new(clock_seed),
                rng: None,
            }),
            asserts,
        }
    }

    /// Install a seed handler. The generator reseeds on the next draw.
    ///
    /// `None` is a contract violation; the current handler stays installed.
    #[track_caller]
    pub fn set_seed_init_handler(&self, handler: Option<SeedInitHandler>) {
        let Some(handler) = handler else {
            self.asserts.check(false);
            return;
        };
        let mut state = self.state.lock();
        state.seed_handler = handler;
        state.rng = None;
    }

    /// Next 32-bit random number.
    pub fn number_get(&self) -> u32 {
        let mut state = self.state.lock();
        if state.rng.is_none() {
            let seed = (state.seed_handler)();
            tracing::debug!(seed, "random generator seeded");
            state.rng = Some(ChaCha8Rng::seed_from_u64(u64::from(seed)));
        }
        state.rng.as_mut().map_or(0, RngCore::next_u32)
    }
}

impl std::fmt::Debug for Random {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Random")
            .field("seeded", &self.state.lock().rng.is_some())
            .finish_non_exhaustive()
    }
}
