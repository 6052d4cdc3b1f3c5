//! Assigns outgoing sequence numbers for a media stream and its RTX stream.
//!
//! Two independent monotonic counters, each seeded from a random value in
//! the low 15 bits (non-zero, non-predictable starting sequence numbers
//! drawn from less than the full 16-bit range), plus a record of the most
//! recent keyframe boundary so the egress/pacer layer can find where a
//! retransmitted frame began.

/// Assigns media and RTX sequence numbers for one outgoing RTP stream.
pub struct Sequencer {
    next_seq: u16,
    next_rtx_seq: u16,
    last_keyframe_seq: Option<u16>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    /// Create a sequencer with independently randomized media and RTX
    /// starting sequence numbers, each drawn from the low 15 bits of a
    /// random `u16` (0..=32767).
    pub fn new() -> Self {
        Self {
            next_seq: rand::random::<u16>() & 0x7FFF,
            next_rtx_seq: rand::random::<u16>() & 0x7FFF,
            last_keyframe_seq: None,
        }
    }

    /// Assign and advance the next media sequence number.
    pub fn next_sequence_number(&mut self) -> u16 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    /// Assign and advance the next RTX sequence number. Independent of the
    /// media counter; RTX packets are retransmitted copies, not new media.
    pub fn next_rtx_sequence_number(&mut self) -> u16 {
        let seq = self.next_rtx_seq;
        self.next_rtx_seq = self.next_rtx_seq.wrapping_add(1);
        seq
    }

    /// Record that `seq` (already assigned by [`next_sequence_number`])
    /// began a keyframe, so a later NACK-driven retransmission or FEC
    /// protection decision can find the boundary.
    ///
    /// [`next_sequence_number`]: Sequencer::next_sequence_number
    pub fn mark_keyframe_boundary(&mut self, seq: u16) {
        self.last_keyframe_seq = Some(seq);
    }

    /// The sequence number of the most recent keyframe boundary, if any
    /// packet has been marked as one yet.
    pub fn last_keyframe_boundary(&self) -> Option<u16> {
        self.last_keyframe_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_within_low_15_bits() {
        for _ in 0..100 {
            let seq = Sequencer::new();
            assert!(seq.next_seq <= 0x7FFF);
            assert!(seq.next_rtx_seq <= 0x7FFF);
        }
    }

    #[test]
    fn test_media_sequence_monotonic() {
        let mut seq = Sequencer {
            next_seq: 0,
            next_rtx_seq: 0,
            last_keyframe_seq: None,
        };
        for expected in 0u16..10 {
            assert_eq!(seq.next_sequence_number(), expected);
        }
    }

    #[test]
    fn test_media_sequence_wraps() {
        let mut seq = Sequencer {
            next_seq: 65534,
            next_rtx_seq: 0,
            last_keyframe_seq: None,
        };
        assert_eq!(seq.next_sequence_number(), 65534);
        assert_eq!(seq.next_sequence_number(), 65535);
        assert_eq!(seq.next_sequence_number(), 0);
        assert_eq!(seq.next_sequence_number(), 1);
    }

    #[test]
    fn test_media_and_rtx_counters_are_independent() {
        let mut seq = Sequencer {
            next_seq: 100,
            next_rtx_seq: 5,
            last_keyframe_seq: None,
        };
        assert_eq!(seq.next_sequence_number(), 100);
        assert_eq!(seq.next_rtx_sequence_number(), 5);
        assert_eq!(seq.next_sequence_number(), 101);
        assert_eq!(seq.next_rtx_sequence_number(), 6);
        assert_eq!(seq.next_rtx_sequence_number(), 7);
    }

    #[test]
    fn test_keyframe_boundary_tracking() {
        let mut seq = Sequencer::new();
        assert_eq!(seq.last_keyframe_boundary(), None);

        let first = seq.next_sequence_number();
        seq.mark_keyframe_boundary(first);
        assert_eq!(seq.last_keyframe_boundary(), Some(first));

        // Non-keyframe packets don't move the marker.
        let _ = seq.next_sequence_number();
        let _ = seq.next_sequence_number();
        assert_eq!(seq.last_keyframe_boundary(), Some(first));

        let next_key = seq.next_sequence_number();
        seq.mark_keyframe_boundary(next_key);
        assert_eq!(seq.last_keyframe_boundary(), Some(next_key));
    }
}
