//! Observable link behavior.
//!
//! Counters are collected inside the stream and handed out as a [`LinkStats`]
//! snapshot. They answer the questions a real UART's status registers would:
//! how much has been sent, how much has crossed the line, and how much was
//! lost to receive overruns.
//!
//! # Thread Safety
//!
//! Snapshots are plain `Copy` values; the live counters belong to the stream
//! and share its single-owner model.

/// Counter snapshot for one simulated link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Bytes accepted into the outgoing queue by `write`.
    pub bytes_written: u64,

    /// Bytes moved across the line by the release scheduler.
    ///
    /// Stays zero on an unpaced link, where reads drain the outgoing queue
    /// directly.
    pub bytes_released: u64,

    /// Bytes handed to the caller by `read`.
    pub bytes_read: u64,

    /// Bytes evicted from a full receive queue to admit newer arrivals.
    pub rx_overruns: u64,

    /// Release evaluations that moved at least one byte.
    pub release_passes: u64,
}

impl LinkStats {
    /// Bytes written but not yet released across the line.
    ///
    /// Meaningful for paced links; an unpaced link releases nothing.
    pub fn in_flight(&self) -> u64 {
        self.bytes_written.saturating_sub(self.bytes_released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zeroed() {
        let stats = LinkStats::default();
        assert_eq!(stats.bytes_written, 0);
        assert_eq!(stats.in_flight(), 0);
    }

    #[test]
    fn test_in_flight() {
        let stats = LinkStats {
            bytes_written: 10,
            bytes_released: 7,
            ..LinkStats::default()
        };
        assert_eq!(stats.in_flight(), 3);
    }

    #[test]
    fn test_in_flight_saturates() {
        // released can exceed written when bytes were preloaded into the
        // outgoing queue without going through write()
        let stats = LinkStats {
            bytes_written: 2,
            bytes_released: 5,
            ..LinkStats::default()
        };
        assert_eq!(stats.in_flight(), 0);
    }
}
