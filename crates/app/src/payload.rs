//! Payload generation for transfer runs.
//!
//! When no input file is specified, we generate line-oriented ASCII that
//! looks like serial sensor traffic: short readings terminated with CRLF,
//! the kind of data a device would actually push down a UART.
//!
//! # Design
//!
//! Generated data is deterministic for a given seed, so a run can be
//! reproduced exactly with `--seed`. Values drift with a small random walk
//! rather than jumping, which keeps the output plausible when eyeballed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `size_bytes` of sensor-log payload.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `size_bytes`: exact size of the generated data
///
/// # Returns
/// Vector of printable-ASCII-plus-CRLF bytes, truncated to `size_bytes`.
pub fn generate_payload(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes + 64);

    let mut temp_c = rng.gen_range(15.0..30.0);
    let mut rh_pct: i32 = rng.gen_range(30..70);
    let mut seq: u32 = 0;

    while data.len() < size_bytes {
        temp_c += rng.gen_range(-0.3..0.3);
        rh_pct = (rh_pct + rng.gen_range(-2..=2)).clamp(0, 100);
        seq = seq.wrapping_add(1);

        let line = format!("T={:.1}C RH={}% seq={}\r\n", temp_c, rh_pct, seq);
        data.extend_from_slice(line.as_bytes());
    }

    data.truncate(size_bytes);
    data
}
