//! The simulated serial stream.
//!
//! [`SerialStream`] wraps a caller-owned outgoing [`ByteQueue`] and meters
//! bytes out of it at a configured baud rate, exactly as a real serial line
//! would: a byte written now is not visible to the reader until its transit
//! time has passed. Released bytes land in a bounded receive queue (an
//! internal 8-byte queue by default, or one the caller supplies).
//!
//! # Pacing Model
//!
//! There is no timer thread. Every public operation first runs a release
//! pass that converts clock time elapsed since the last pass into whole
//! bytes and moves them from the outgoing queue to the receive queue. Time
//! only advances from the stream's point of view when the caller interacts
//! with it. Sub-byte remainders are left on the clock, so pacing never
//! drifts no matter how calls are spaced.
//!
//! # Rate Regimes
//!
//! - [`BAUD_DISABLED`]: the stream is inert. Writes are rejected, reads
//!   return `None`, counts are zero.
//! - `0`: unpaced. Everything in the outgoing queue is immediately
//!   readable; the receive queue is bypassed.
//! - Positive: paced at `ceil(10_000_000 / rate)` microseconds per byte,
//!   ten bit-times per byte (start + 8 data + stop).
//!
//! # Overrun Policy
//!
//! When a byte is due and the receive queue is full, the oldest queued byte
//! is evicted to admit it, mirroring hardware receive-overrun behavior.
//! Evictions are counted in [`LinkStats::rx_overruns`].
//!
//! # Thread Safety
//!
//! Not thread-safe. The stream holds exclusive borrows of its queues;
//! callers sharing a stream across contexts must serialize access.

use crate::buffer::ByteQueue;
use crate::clock::{Clock, Micros, SystemClock};
use crate::metrics::LinkStats;
use std::sync::Arc;

/// Reserved rate value meaning "not started"; the stream stays inert.
pub const BAUD_DISABLED: u32 = u32::MAX;

/// Capacity of the internal receive queue used when the caller does not
/// supply one.
pub const DEFAULT_RX_CAPACITY: usize = 8;

/// Bit-times charged per byte: one start bit, eight data bits, one stop bit.
const LINE_BITS_PER_BYTE: u64 = 10;

/// Microseconds of line time per byte at the given rate, rounded up.
fn us_per_byte(baud: u32) -> u64 {
    (1_000_000 * LINE_BITS_PER_BYTE).div_ceil(baud as u64)
}

/// Pacing state machine.
///
/// `Disabled` and `Unpaced` carry no timing state; only a paced link tracks
/// the release clock.
enum Pacing {
    Disabled,
    Unpaced,
    Paced {
        us_per_byte: u64,
        /// Time up to which whole-byte transit has been accounted for.
        /// Trails the clock by any unconsumed sub-byte remainder.
        last_release: Micros,
    },
}

/// Receive-side queue: internal by default, caller-supplied on request.
enum RxBuffer<'buf> {
    Internal(ByteQueue),
    External(&'buf mut ByteQueue),
}

impl RxBuffer<'_> {
    fn queue(&mut self) -> &mut ByteQueue {
        match self {
            RxBuffer::Internal(q) => q,
            RxBuffer::External(q) => q,
        }
    }

    fn queue_ref(&self) -> &ByteQueue {
        match self {
            RxBuffer::Internal(q) => q,
            RxBuffer::External(q) => q,
        }
    }
}

/// A baud-rate-paced byte stream over caller-owned queues.
///
/// The caller retains ownership of the queues; the stream holds exclusive
/// `&mut` borrows for its lifetime, so a queue lent to a stream cannot be
/// touched elsewhere until the stream is dropped.
///
/// # Example
///
/// ```
/// use serial_sim_core::{ByteQueue, ManualClock, SerialStream};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::new());
/// let mut line = ByteQueue::with_capacity(32);
/// let mut stream = SerialStream::with_clock(&mut line, clock.clone());
/// stream.begin(9600);
///
/// assert_eq!(stream.write(b'x'), 1);
/// // at 9600 baud a byte needs 1042us of line time
/// assert_eq!(stream.available(), 0);
/// clock.advance(1042);
/// assert_eq!(stream.read(), Some(b'x'));
/// ```
pub struct SerialStream<'buf> {
    tx: &'buf mut ByteQueue,
    rx: RxBuffer<'buf>,
    pacing: Pacing,
    clock: Arc<dyn Clock>,
    stats: LinkStats,
}

impl<'buf> SerialStream<'buf> {
    /// Create a stream over `tx` with the system clock and the internal
    /// receive queue. Inert until [`begin`](Self::begin) is called.
    pub fn new(tx: &'buf mut ByteQueue) -> Self {
        Self::with_clock(tx, Arc::new(SystemClock::new()))
    }

    /// Create a stream over `tx` that reads time from `clock`.
    pub fn with_clock(tx: &'buf mut ByteQueue, clock: Arc<dyn Clock>) -> Self {
        Self {
            tx,
            rx: RxBuffer::Internal(ByteQueue::with_capacity(DEFAULT_RX_CAPACITY)),
            pacing: Pacing::Disabled,
            clock,
            stats: LinkStats::default(),
        }
    }

    /// Create a stream over `tx` that releases into the caller's `rx`
    /// instead of the internal receive queue.
    pub fn with_rx_buffer(tx: &'buf mut ByteQueue, rx: &'buf mut ByteQueue) -> Self {
        let mut stream = Self::new(tx);
        stream.rx = RxBuffer::External(rx);
        stream
    }

    /// Start (or restart) the link at the given rate.
    ///
    /// `BAUD_DISABLED` turns the stream off, `0` selects unpaced transfer,
    /// any other value selects paced transfer. Always accepted; the pacing
    /// clock restarts from now.
    pub fn begin(&mut self, baud: u32) {
        self.pacing = match baud {
            BAUD_DISABLED => Pacing::Disabled,
            0 => Pacing::Unpaced,
            rate => Pacing::Paced {
                us_per_byte: us_per_byte(rate),
                last_release: self.clock.now(),
            },
        };
    }

    /// Rebind the outgoing queue and restart the link at `baud` in one
    /// step. Bytes left in the previous queue stay with its owner.
    pub fn begin_with(&mut self, tx: &'buf mut ByteQueue, baud: u32) {
        self.tx = tx;
        self.begin(baud);
    }

    /// Release arrivals into the caller's `rx` from now on.
    ///
    /// Bytes already delivered to the previous receive queue stay there.
    /// Restarts the pacing clock, like every configuration call.
    pub fn set_rx_buffer(&mut self, rx: &'buf mut ByteQueue) {
        let now = self.clock.now();
        self.rx = RxBuffer::External(rx);
        if let Pacing::Paced { last_release, .. } = &mut self.pacing {
            *last_release = now;
        }
    }

    /// Queue a byte for transmission.
    ///
    /// Returns 1 if the byte was accepted, 0 if the stream is disabled or
    /// the outgoing queue is full. Pending arrivals are released first, so
    /// a write never delays bytes already due.
    pub fn write(&mut self, byte: u8) -> usize {
        if matches!(self.pacing, Pacing::Disabled) {
            return 0;
        }
        self.release_pending();
        if self.tx.push(byte) {
            self.stats.bytes_written += 1;
            1
        } else {
            0
        }
    }

    /// Next received byte, or `None` if nothing has arrived (or the stream
    /// is disabled). Unpaced links read straight from the outgoing queue.
    pub fn read(&mut self) -> Option<u8> {
        let byte = match self.pacing {
            Pacing::Disabled => None,
            Pacing::Unpaced => self.tx.pop_front(),
            Pacing::Paced { .. } => {
                self.release_pending();
                self.rx.queue().pop_front()
            }
        };
        if byte.is_some() {
            self.stats.bytes_read += 1;
        }
        byte
    }

    /// Next received byte without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        match self.pacing {
            Pacing::Disabled => None,
            Pacing::Unpaced => self.tx.front(),
            Pacing::Paced { .. } => {
                self.release_pending();
                self.rx.queue_ref().front()
            }
        }
    }

    /// Number of bytes ready to read right now.
    pub fn available(&mut self) -> usize {
        match self.pacing {
            Pacing::Disabled => 0,
            Pacing::Unpaced => self.tx.len(),
            Pacing::Paced { .. } => {
                self.release_pending();
                self.rx.queue_ref().len()
            }
        }
    }

    /// Free space in the outgoing queue, after releasing pending arrivals.
    ///
    /// Zero while the stream is disabled.
    pub fn available_for_write(&mut self) -> usize {
        if matches!(self.pacing, Pacing::Disabled) {
            return 0;
        }
        self.release_pending();
        self.tx.remaining()
    }

    /// Apply any pending time-based arrivals without touching the data.
    pub fn flush(&mut self) {
        self.release_pending();
    }

    /// Bytes still waiting in the outgoing queue. Does not run a release
    /// pass; this is a raw snapshot.
    pub fn queued(&self) -> usize {
        self.tx.len()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Release every whole byte the elapsed clock time pays for.
    ///
    /// The deficit accounting lives here: `last_release` only ever advances
    /// by whole-byte amounts, so the sub-byte remainder of any elapsed
    /// interval is implicitly part of the next evaluation. With an empty
    /// outgoing queue the line is idle and accrues nothing, so the clock is
    /// pinned to now instead.
    fn release_pending(&mut self) {
        let (us_per_byte, last_release) = match self.pacing {
            Pacing::Paced {
                us_per_byte,
                last_release,
            } => (us_per_byte, last_release),
            _ => return,
        };

        let now = self.clock.now();
        if self.tx.is_empty() {
            self.pacing = Pacing::Paced {
                us_per_byte,
                last_release: now,
            };
            return;
        }

        let elapsed = now.wrapping_since(last_release);
        let due = elapsed / us_per_byte;
        if due == 0 {
            // less than one byte-time has passed; leave it on the clock
            return;
        }

        let rx: &mut ByteQueue = match &mut self.rx {
            RxBuffer::Internal(q) => q,
            RxBuffer::External(q) => q,
        };
        let count = due.min(self.tx.len() as u64);
        for _ in 0..count {
            if rx.is_full() {
                rx.pop_front();
                self.stats.rx_overruns += 1;
            }
            if let Some(byte) = self.tx.pop_front() {
                rx.push(byte);
            }
        }
        self.stats.bytes_released += count;
        self.stats.release_passes += 1;

        // Whole-byte time is consumed even if the queue ran dry before
        // `due` bytes; a drained line forfeits that credit rather than
        // banking it against future writes.
        self.pacing = Pacing::Paced {
            us_per_byte,
            last_release: last_release.wrapping_add(due * us_per_byte),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn paced_stream<'buf>(
        tx: &'buf mut ByteQueue,
        baud: u32,
    ) -> (SerialStream<'buf>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let mut stream = SerialStream::with_clock(tx, clock.clone());
        stream.begin(baud);
        (stream, clock)
    }

    #[test]
    fn test_us_per_byte_rounds_up() {
        assert_eq!(us_per_byte(100_000), 100);
        assert_eq!(us_per_byte(9_600), 1_042); // 10_000_000 / 9600 = 1041.67
        assert_eq!(us_per_byte(10_000_000), 1);
        assert_eq!(us_per_byte(1), 10_000_000);
    }

    #[test]
    fn test_inert_before_begin() {
        let mut tx = ByteQueue::with_capacity(8);
        let mut stream = SerialStream::new(&mut tx);

        assert_eq!(stream.write(b'a'), 0);
        assert_eq!(stream.read(), None);
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.available(), 0);
        assert_eq!(stream.available_for_write(), 0);
    }

    #[test]
    fn test_byte_takes_one_transit_time() {
        let mut tx = ByteQueue::with_capacity(8);
        // 100_000 baud -> 100us per byte
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        assert_eq!(stream.write(b'x'), 1);
        assert_eq!(stream.available(), 0);

        clock.advance(99);
        assert_eq!(stream.available(), 0);

        clock.advance(1);
        assert_eq!(stream.available(), 1);
        assert_eq!(stream.read(), Some(b'x'));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut tx = ByteQueue::with_capacity(8);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        stream.write(b'q');
        clock.advance(100);

        assert_eq!(stream.peek(), Some(b'q'));
        assert_eq!(stream.peek(), Some(b'q'));
        assert_eq!(stream.read(), Some(b'q'));
        assert_eq!(stream.read(), None);
    }

    #[test]
    fn test_write_releases_due_bytes_first() {
        let mut tx = ByteQueue::with_capacity(8);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        stream.write(b'a');
        clock.advance(250);
        // the release pass runs before 'b' is appended, so only 'a' was
        // eligible; the two whole byte-times are consumed either way
        stream.write(b'b');

        assert_eq!(stream.available(), 1);
        clock.advance(100);
        assert_eq!(stream.available(), 2);
        assert_eq!(stream.read(), Some(b'a'));
        assert_eq!(stream.read(), Some(b'b'));
    }

    #[test]
    fn test_idle_line_accrues_no_credit() {
        let mut tx = ByteQueue::with_capacity(8);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        // a long quiet stretch, then a write: the byte must still take a
        // full transit time
        clock.advance(10_000);
        stream.write(b'z');
        assert_eq!(stream.available(), 0);

        clock.advance(100);
        assert_eq!(stream.available(), 1);
    }

    #[test]
    fn test_flush_applies_pending_arrivals() {
        let mut tx = ByteQueue::with_capacity(8);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        stream.write(b'f');
        clock.advance(100);
        stream.flush();

        let stats = stream.stats();
        assert_eq!(stats.bytes_released, 1);
        assert_eq!(stats.release_passes, 1);
    }

    #[test]
    fn test_available_for_write_frees_released_space() {
        let mut tx = ByteQueue::with_capacity(2);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        assert_eq!(stream.write(b'a'), 1);
        assert_eq!(stream.write(b'b'), 1);
        assert_eq!(stream.write(b'c'), 0); // outgoing queue full
        assert_eq!(stream.available_for_write(), 0);

        clock.advance(200);
        assert_eq!(stream.available_for_write(), 2);
    }

    #[test]
    fn test_unpaced_reads_bypass_rx() {
        let mut tx = ByteQueue::with_capacity(8);
        let mut stream = SerialStream::new(&mut tx);
        stream.begin(0);

        stream.write(b'1');
        stream.write(b'2');

        assert_eq!(stream.available(), 2);
        assert_eq!(stream.peek(), Some(b'1'));
        assert_eq!(stream.read(), Some(b'1'));
        assert_eq!(stream.read(), Some(b'2'));
        assert_eq!(stream.read(), None);
    }

    #[test]
    fn test_external_rx_buffer_capacity_is_used() {
        let mut tx = ByteQueue::with_capacity(16);
        let mut rx = ByteQueue::with_capacity(16);
        let clock = Arc::new(ManualClock::new());
        let mut stream = SerialStream::with_clock(&mut tx, clock.clone());
        stream.set_rx_buffer(&mut rx);
        stream.begin(100_000);

        for b in 0..12u8 {
            assert_eq!(stream.write(b), 1);
        }
        clock.advance(1_200);

        // the internal queue would have overrun at 8
        assert_eq!(stream.available(), 12);
        assert_eq!(stream.stats().rx_overruns, 0);
    }

    #[test]
    fn test_begin_restarts_pacing_clock() {
        let mut tx = ByteQueue::with_capacity(8);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        stream.write(b'a');
        stream.write(b'b');
        clock.advance(150);
        assert_eq!(stream.available(), 1);

        // reconfiguring forgets the 50us remainder
        stream.begin(100_000);
        clock.advance(50);
        assert_eq!(stream.available(), 1);
        clock.advance(50);
        assert_eq!(stream.available(), 2);
    }

    #[test]
    fn test_stats_track_written_and_read() {
        let mut tx = ByteQueue::with_capacity(8);
        let (mut stream, clock) = paced_stream(&mut tx, 100_000);

        stream.write(b'a');
        stream.write(b'b');
        clock.advance(200);
        assert_eq!(stream.read(), Some(b'a'));
        assert_eq!(stream.read(), Some(b'b'));

        let stats = stream.stats();
        assert_eq!(stats.bytes_written, 2);
        assert_eq!(stats.bytes_released, 2);
        assert_eq!(stats.bytes_read, 2);
        assert_eq!(stats.in_flight(), 0);
    }
}
