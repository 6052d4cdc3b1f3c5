//! Stores sent RTP packets so they can be re-sent (plain or re-wrapped as
//! RTX) in response to a NACK, and gates repeated retransmission of the
//! same sequence number within one RTT.
//!
//! Laid out as a circular buffer keyed by sequence number, the same shape
//! as [`crate::nack::send_buffer::SendBuffer`]; unlike that buffer this one
//! also remembers when a packet was last retransmitted so a storm of NACKs
//! for the same loss doesn't trigger the same retransmission more than
//! once per round trip.

use shared::marshal::MarshalSize;
use std::time::{Duration, Instant};

/// Half of u16 max value, used for sequence number wraparound detection.
const UINT16_SIZE_HALF: u16 = 1 << 15;

/// Default round-trip estimate used until [`PacketHistory::set_rtt`] is
/// called with a measured value.
const DEFAULT_RTT: Duration = Duration::from_millis(100);

struct Entry {
    packet: rtp::Packet,
    send_time: Instant,
    retransmit_count: u32,
    last_retransmit: Option<Instant>,
}

/// Snapshot of a stored packet's retransmission eligibility, returned by
/// [`PacketHistory::get_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHistoryState {
    /// Size in bytes of the packet as it was stored (original, not RTX-wrapped).
    pub size: usize,
    /// `true` if this packet was already retransmitted within the current
    /// RTT window and should not be retransmitted again yet.
    pub pending: bool,
}

/// Retains recently sent RTP packets for NACK-driven retransmission.
pub struct PacketHistory {
    entries: Vec<Option<Entry>>,
    size: u16,
    highest_added: u16,
    started: bool,
    rtt: Duration,
}

impl PacketHistory {
    /// Create a history with the given capacity, which must be a power of
    /// two between 1 and 32768 inclusive. Returns `None` otherwise.
    pub fn new(size: u16) -> Option<Self> {
        let is_valid = (0..=15).any(|i| size == 1 << i);
        if !is_valid {
            return None;
        }

        Some(Self {
            entries: (0..size).map(|_| None).collect(),
            size,
            highest_added: 0,
            started: false,
            rtt: DEFAULT_RTT,
        })
    }

    /// Update the RTT estimate used to gate repeated retransmissions.
    pub fn set_rtt(&mut self, rtt: Duration) {
        self.rtt = rtt;
    }

    /// Store a sent packet. Storing a packet at a sequence number that was
    /// previously marked pending clears the pending flag: it's a fresh
    /// send, not a retransmission, so it's eligible for its own NACK-driven
    /// retransmission again.
    pub fn put(&mut self, packet: rtp::Packet, send_time: Instant) {
        let seq = packet.header.sequence_number;

        if !self.started {
            self.entries[(seq % self.size) as usize] = Some(Entry {
                packet,
                send_time,
                retransmit_count: 0,
                last_retransmit: None,
            });
            self.highest_added = seq;
            self.started = true;
            return;
        }

        let diff = seq.wrapping_sub(self.highest_added);
        if diff == 0 {
            // Duplicate send of the same sequence number, ignore.
            return;
        } else if diff < UINT16_SIZE_HALF {
            let mut i = self.highest_added.wrapping_add(1);
            while i != seq {
                let idx = (i % self.size) as usize;
                self.entries[idx] = None;
                i = i.wrapping_add(1);
            }
            self.highest_added = seq;
        }
        // Negative diff (out of order): still store, don't move highest_added.

        let idx = (seq % self.size) as usize;
        self.entries[idx] = Some(Entry {
            packet,
            send_time,
            retransmit_count: 0,
            last_retransmit: None,
        });
    }

    fn lookup(&self, seq: u16) -> Option<&Entry> {
        if !self.started {
            return None;
        }

        let diff = self.highest_added.wrapping_sub(seq);
        if diff >= UINT16_SIZE_HALF || diff >= self.size {
            return None;
        }

        let idx = (seq % self.size) as usize;
        let entry = self.entries[idx].as_ref()?;
        if entry.packet.header.sequence_number != seq {
            return None;
        }
        Some(entry)
    }

    /// Look up the retransmission eligibility of a stored sequence number
    /// without mutating any state.
    pub fn get_state(&self, seq: u16, now: Instant) -> Option<PacketHistoryState> {
        let entry = self.lookup(seq)?;
        let pending = entry
            .last_retransmit
            .is_some_and(|t| now.duration_since(t) < self.rtt);
        Some(PacketHistoryState {
            size: entry.packet.marshal_size(),
            pending,
        })
    }

    /// Retrieve a stored packet for retransmission, running it through
    /// `transform` (e.g. to re-wrap it in an RFC4588 RTX envelope) and
    /// marking it pending so a second NACK for the same sequence number
    /// within one RTT is suppressed. Returns `None` if the packet isn't
    /// stored, or if it's already pending within the current RTT window.
    pub fn get_and_mark_pending<F>(
        &mut self,
        seq: u16,
        now: Instant,
        transform: F,
    ) -> Option<rtp::Packet>
    where
        F: FnOnce(&rtp::Packet) -> rtp::Packet,
    {
        if !self.started {
            return None;
        }

        let diff = self.highest_added.wrapping_sub(seq);
        if diff >= UINT16_SIZE_HALF || diff >= self.size {
            return None;
        }

        let idx = (seq % self.size) as usize;
        let entry = self.entries[idx].as_mut()?;
        if entry.packet.header.sequence_number != seq {
            return None;
        }
        if entry
            .last_retransmit
            .is_some_and(|t| now.duration_since(t) < self.rtt)
        {
            return None;
        }

        let retransmitted = transform(&entry.packet);
        entry.last_retransmit = Some(now);
        entry.retransmit_count += 1;
        Some(retransmitted)
    }
}
