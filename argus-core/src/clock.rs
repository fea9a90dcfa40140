use std::sync::OnceLock;
use std::time::Instant;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanosecond reading used for gateway timestamps and latency
/// accounting. Process-local; readings are not comparable across processes
/// or restarts.
pub fn gateway_now() -> u64 {
    ANCHOR.get_or_init(Instant::now).elapsed().as_nanos() as u64
}
