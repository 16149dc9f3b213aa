//! Wall-clock abstraction so the validator service can be driven by a real clock in production
//! and by a hand-advanced one in tests and the emulator.

use types::{config::Config, primitives::Slot};

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;

    fn is_current_slot<C: Config>(&self, slot: Slot, genesis_time: u64) -> bool {
        slot_at_millis::<C>(self.now_millis(), genesis_time) == slot
    }
}

fn slot_at_millis<C: Config>(now_millis: u64, genesis_time: u64) -> Slot {
    let genesis_millis = genesis_time.saturating_mul(1000);
    let elapsed_seconds = now_millis.saturating_sub(genesis_millis) / 1000;
    elapsed_seconds / C::seconds_per_slot()
}

/// Real wall clock, backed by [`std::time::SystemTime`].
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is after the Unix epoch")
            .as_millis() as u64
    }
}

/// A clock whose time is advanced explicitly. Used by tests and the emulator to exercise
/// slot-boundary behavior deterministically.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_millis: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    pub fn new(now_millis: u64) -> Self {
        Self {
            now_millis: std::sync::atomic::AtomicU64::new(now_millis),
        }
    }

    pub fn set_millis(&self, now_millis: u64) {
        self.now_millis
            .store(now_millis, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance_millis(&self, delta: u64) {
        self.now_millis
            .fetch_add(delta, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_millis.load(std::sync::atomic::Ordering::SeqCst)
    }
}
