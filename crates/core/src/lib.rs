//! serial-sim-core: a baud-rate-paced serial line, simulated in software
//!
//! This library lets code written against a byte-stream interface
//! (write/read/peek/available/flush) be exercised without UART hardware.
//! Bytes written to the stream cross over to the receive side only as fast
//! as the configured baud rate allows, computed lazily from elapsed clock
//! time — no timer threads, no blocking.
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `clock`: injectable time sources (system monotonic, manual for tests)
//! - `buffer`: bounded FIFO byte queue used on both sides of the link
//! - `stream`: pacing state machine and the byte release scheduler
//! - `metrics`: observable link counters
//!
//! # Design Principles
//!
//! - **Total operations**: stream calls never fail; absent data and
//!   disabled states are sentinel results (`None`, zero counts)
//! - **Bounded memory**: both queues have hard capacities; receive
//!   overflow evicts oldest-first, like hardware overrun
//! - **Deterministic**: inject a [`ManualClock`] and pacing becomes an
//!   exact function of the microseconds you advance
//! - **Pull-based time**: the simulation only ticks when the caller
//!   interacts with the stream
//!
//! # Quick Start
//!
//! ```
//! use serial_sim_core::{ByteQueue, SerialStream};
//!
//! let mut line = ByteQueue::with_capacity(64);
//! let mut stream = SerialStream::new(&mut line);
//! stream.begin(0); // unpaced: bytes are readable immediately
//!
//! stream.write(b'h');
//! stream.write(b'i');
//! assert_eq!(stream.read(), Some(b'h'));
//! assert_eq!(stream.read(), Some(b'i'));
//! ```

pub mod buffer;
pub mod clock;
pub mod metrics;
pub mod stream;

// Re-export commonly used types
pub use buffer::ByteQueue;
pub use clock::{Clock, ManualClock, Micros, SystemClock};
pub use metrics::LinkStats;
pub use stream::{SerialStream, BAUD_DISABLED, DEFAULT_RX_CAPACITY};
