//! RFC 5109 ULPFEC: XOR-based forward error correction for RTP media.
//!
//! The encoder groups media packets into one or more FEC rows and produces
//! one FEC packet per row by XOR-ing each protected packet's recoverable
//! header fields and payload together. The decoder mirrors this: it keeps
//! recently recovered/received media packets and received FEC packets, and
//! whenever an FEC packet ends up with exactly one still-missing protected
//! packet, it reconstructs that packet by XOR-ing the FEC packet against
//! every other protected packet it already has.

use std::collections::{BTreeMap, HashMap};

/// Maximum media packets an ULPFEC packet mask can cover with the 16-bit
/// (L bit clear) mask.
const MAX_MEDIA_PACKETS_L_BIT_CLEAR: usize = 16;
/// Maximum media packets covered with the 48-bit (L bit set) mask.
const MAX_MEDIA_PACKETS_L_BIT_SET: usize = 48;
/// ULPFEC level-0 header size in bytes (E/L/P/X/CC+M/PT-recovery, SN base,
/// TS recovery, length recovery).
const FEC_LEVEL0_HEADER_SIZE: usize = 10;

/// Sequence-number age beyond which a FEC packet is considered too old to
/// ever recover anything and is discarded (RFC 5109 doesn't mandate a
/// value; this mirrors the wraparound-safety margin used elsewhere in this
/// crate for NACK/RTX bookkeeping).
const OLD_SEQUENCE_THRESHOLD: u16 = 0x3fff;

/// Selects the packet-mask generation strategy. Both variants currently
/// drive the same round-robin interleave (see module docs); the type is
/// kept so a future bursty-loss-tuned generator can be swapped in without
/// changing the encoder's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecMaskType {
    /// Spread protected packets evenly across rows; best for independent
    /// packet loss.
    Random,
    /// Reserved for a future burst-loss-tuned mask generator.
    Bursty,
}

/// Parameters controlling how much protection [`UlpFecEncoder`] generates.
#[derive(Debug, Clone)]
pub struct UlpFecParams {
    /// Fraction of `num_media` packets to generate as FEC, expressed as a
    /// numerator over 256 (0 = no protection, 255 ≈ 1:1).
    pub protection_factor: u8,
    /// Number of leading packets (e.g. the packets of a keyframe) that get
    /// unequal (stronger) protection when `use_unequal_protection` is set.
    pub num_important_packets: usize,
    /// When set, `num_important_packets` leading packets are protected by
    /// every FEC row instead of just one.
    pub use_unequal_protection: bool,
    /// Mask generation strategy.
    pub mask_type: FecMaskType,
}

impl Default for UlpFecParams {
    fn default() -> Self {
        Self {
            protection_factor: 0,
            num_important_packets: 0,
            use_unequal_protection: false,
            mask_type: FecMaskType::Random,
        }
    }
}

/// `num_fec = max(1, round(num_media * protection / 256))` when protection
/// is non-zero, else 0.
fn calc_num_fec_packets(num_media_packets: usize, protection_factor: u8) -> usize {
    if protection_factor == 0 {
        return 0;
    }
    let weighted = num_media_packets * protection_factor as usize + (1 << 7);
    let num_fec = weighted >> 8;
    num_fec.max(1)
}

/// One XOR-accumulated FEC row, addressed by its position relative to
/// `seq_num_base`.
struct FecRow {
    byte0: u8,
    byte1: u8,
    ts_recovery: u32,
    length_recovery: u16,
    payload: Vec<u8>,
    mask_bits: Vec<bool>,
}

impl FecRow {
    fn new(mask_len: usize) -> Self {
        Self {
            byte0: 0,
            byte1: 0,
            ts_recovery: 0,
            length_recovery: 0,
            payload: Vec::new(),
            mask_bits: vec![false; mask_len],
        }
    }

    fn xor_in(&mut self, packet: &rtp::Packet, bit_index: usize, is_first: bool) {
        let header_byte0 = ((packet.header.version & 0x3) << 6)
            | ((packet.header.padding as u8) << 5)
            | ((packet.header.extension as u8) << 4)
            | (packet.header.csrc.len() as u8 & 0xF);
        let header_byte1 = ((packet.header.marker as u8) << 7) | (packet.header.payload_type & 0x7F);
        let payload_len = packet.payload.len() as u16;

        if is_first {
            self.byte0 = header_byte0;
            self.byte1 = header_byte1;
            self.ts_recovery = packet.header.timestamp;
            self.length_recovery = payload_len;
        } else {
            self.byte0 ^= header_byte0;
            self.byte1 ^= header_byte1;
            self.ts_recovery ^= packet.header.timestamp;
            self.length_recovery ^= payload_len;
        }

        for (i, &b) in packet.payload.iter().enumerate() {
            if i < self.payload.len() {
                self.payload[i] ^= b;
            } else {
                self.payload.push(b);
            }
        }

        self.mask_bits[bit_index] = true;
    }

    fn mask_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.mask_bits.len().div_ceil(8)];
        for (i, &set) in self.mask_bits.iter().enumerate() {
            if set {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        bytes
    }
}

/// A generated (or received) ULPFEC packet, independent of RTP wire framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FecPacket {
    /// Sequence number of the first media packet the mask is indexed from.
    pub seq_num_base: u16,
    /// `true` if the 48-bit (6-byte) mask is in use, `false` for 16-bit.
    pub l_bit: bool,
    /// Finalized E/L/P/X/CC + M/PT-recovery bytes (E always 0).
    pub byte0: u8,
    pub byte1: u8,
    /// XOR of protected packets' RTP timestamps.
    pub ts_recovery: u32,
    /// XOR of protected packets' payload lengths.
    pub length_recovery: u16,
    /// Packet mask, big-endian bit per protected sequence number offset
    /// from `seq_num_base`; 2 bytes when `l_bit` is clear, 6 when set.
    pub mask: Vec<u8>,
    /// XOR-accumulated protected payload bytes.
    pub payload: Vec<u8>,
}

impl FecPacket {
    /// Sequence number offsets (relative to `seq_num_base`) this packet protects.
    pub fn protected_offsets(&self) -> Vec<u16> {
        let mut offsets = Vec::new();
        for (byte_idx, byte) in self.mask.iter().enumerate() {
            for bit_idx in 0..8u16 {
                if byte & (0x80 >> bit_idx) != 0 {
                    offsets.push(byte_idx as u16 * 8 + bit_idx);
                }
            }
        }
        offsets
    }

    /// Wire size of the level-0 + level-1 FEC header, in bytes.
    pub fn header_size(&self) -> usize {
        FEC_LEVEL0_HEADER_SIZE + 2 + self.mask.len()
    }
}

/// Produces ULPFEC packets protecting a batch of media packets, per RFC 5109.
pub struct UlpFecEncoder {
    params: UlpFecParams,
}

impl UlpFecEncoder {
    pub fn new(params: UlpFecParams) -> Self {
        Self { params }
    }

    /// Replace the protection parameters used by subsequent `encode` calls,
    /// e.g. switching to stronger unequal protection at a keyframe boundary.
    pub fn set_params(&mut self, params: UlpFecParams) {
        self.params = params;
    }

    /// Generate FEC packets protecting `media_packets`, which must share an
    /// SSRC and be given in sequence-number order. Returns an empty vector
    /// if no protection is configured or there's nothing to protect.
    pub fn encode(&self, media_packets: &[rtp::Packet]) -> Vec<FecPacket> {
        if media_packets.is_empty() {
            return Vec::new();
        }

        let num_media = media_packets.len();
        let num_fec = calc_num_fec_packets(num_media, self.params.protection_factor);
        if num_fec == 0 {
            return Vec::new();
        }

        let seq_num_base = media_packets[0].header.sequence_number;
        let last_seq = media_packets[num_media - 1].header.sequence_number;
        let span = last_seq.wrapping_sub(seq_num_base) as usize + 1;

        let (mask_len, l_bit) = if span <= MAX_MEDIA_PACKETS_L_BIT_CLEAR {
            (MAX_MEDIA_PACKETS_L_BIT_CLEAR, false)
        } else if span <= MAX_MEDIA_PACKETS_L_BIT_SET {
            (MAX_MEDIA_PACKETS_L_BIT_SET, true)
        } else {
            // Too many packets/too large a gap to cover with one FEC block.
            return Vec::new();
        };

        let mut rows: Vec<FecRow> = (0..num_fec).map(|_| FecRow::new(mask_len)).collect();
        let mut row_has_first: Vec<bool> = vec![false; num_fec];

        for (i, packet) in media_packets.iter().enumerate() {
            let bit_index = packet.header.sequence_number.wrapping_sub(seq_num_base) as usize;
            let important = self.params.use_unequal_protection && i < self.params.num_important_packets;

            if important {
                for (row_idx, row) in rows.iter_mut().enumerate() {
                    let is_first = !row_has_first[row_idx];
                    row.xor_in(packet, bit_index, is_first);
                    row_has_first[row_idx] = true;
                }
            } else {
                let row_idx = i % num_fec;
                let is_first = !row_has_first[row_idx];
                rows[row_idx].xor_in(packet, bit_index, is_first);
                row_has_first[row_idx] = true;
            }
        }

        rows.into_iter()
            .filter(|row| row.mask_bits.iter().any(|&b| b))
            .map(|row| FecPacket {
                seq_num_base,
                l_bit,
                byte0: (row.byte0 & 0x3F) | ((l_bit as u8) << 6),
                byte1: row.byte1,
                ts_recovery: row.ts_recovery,
                length_recovery: row.length_recovery,
                mask: row.mask_bytes(),
                payload: row.payload,
            })
            .collect()
    }
}

struct FecEntry {
    packet: FecPacket,
    /// Protected sequence numbers this FEC packet covers, each mapped to
    /// the media packet once known (`None` while still missing).
    protected: BTreeMap<u16, Option<rtp::Packet>>,
}

/// Recovers media packets from ULPFEC packets, per RFC 5109.
pub struct UlpFecDecoder {
    protected_ssrc: u32,
    max_media_packets: usize,
    recovered: BTreeMap<u16, rtp::Packet>,
    fec_packets: HashMap<u16, FecEntry>,
}

impl UlpFecDecoder {
    /// Create a decoder for the media stream identified by `protected_ssrc`,
    /// keeping at most `max_media_packets` recovered/received packets.
    pub fn new(protected_ssrc: u32, max_media_packets: usize) -> Self {
        Self {
            protected_ssrc,
            max_media_packets,
            recovered: BTreeMap::new(),
            fec_packets: HashMap::new(),
        }
    }

    fn reset_if_big_gap(&mut self, seq: u16) {
        if self.recovered.len() < self.max_media_packets {
            return;
        }
        if let Some((&last_seq, _)) = self.recovered.iter().next_back() {
            let diff = seq.wrapping_sub(last_seq).min(last_seq.wrapping_sub(seq));
            if diff as usize > self.max_media_packets {
                self.recovered.clear();
                self.fec_packets.clear();
            }
        }
    }

    fn discard_old_recovered(&mut self) {
        while self.recovered.len() > self.max_media_packets {
            let oldest = *self.recovered.keys().next().expect("non-empty");
            self.recovered.remove(&oldest);
        }
    }

    /// Feed a media packet belonging to the protected stream. Returns any
    /// packets recovered as a result (normally empty).
    pub fn on_media_packet(&mut self, packet: rtp::Packet) -> Vec<rtp::Packet> {
        let seq = packet.header.sequence_number;
        self.reset_if_big_gap(seq);

        for entry in self.fec_packets.values_mut() {
            if let Some(slot) = entry.protected.get_mut(&seq) {
                *slot = Some(packet.clone());
            }
        }

        self.recovered.insert(seq, packet);
        self.discard_old_recovered();
        self.try_recover()
    }

    /// Feed an ULPFEC packet received at sequence number `fec_seq`. Returns
    /// any packets recovered as a result.
    pub fn on_fec_packet(&mut self, fec_seq: u16, fec: FecPacket) -> Vec<rtp::Packet> {
        let mut protected = BTreeMap::new();
        for offset in fec.protected_offsets() {
            let seq = fec.seq_num_base.wrapping_add(offset);
            let known = self.recovered.get(&seq).cloned();
            protected.insert(seq, known);
        }
        if protected.is_empty() {
            return Vec::new();
        }

        self.fec_packets.insert(fec_seq, FecEntry {
            packet: fec,
            protected,
        });
        self.try_recover()
    }

    fn try_recover(&mut self) -> Vec<rtp::Packet> {
        let mut recovered_out = Vec::new();
        let mut to_remove = Vec::new();

        for (&fec_seq, entry) in self.fec_packets.iter() {
            let missing: Vec<u16> = entry
                .protected
                .iter()
                .filter(|(_, v)| v.is_none())
                .map(|(&seq, _)| seq)
                .collect();

            if missing.len() == 1 {
                if let Some(mut recovered) = recover_one(entry) {
                    recovered.header.ssrc = self.protected_ssrc;
                    recovered_out.push((missing[0], recovered));
                    to_remove.push(fec_seq);
                }
            } else if missing.is_empty() || is_old(entry, &self.recovered) {
                to_remove.push(fec_seq);
            }
        }

        for fec_seq in to_remove {
            self.fec_packets.remove(&fec_seq);
        }

        let mut out = Vec::with_capacity(recovered_out.len());
        for (seq, packet) in recovered_out {
            self.recovered.insert(seq, packet.clone());
            out.push(packet);
        }
        self.discard_old_recovered();
        out
    }
}

fn is_old(entry: &FecEntry, recovered: &BTreeMap<u16, rtp::Packet>) -> bool {
    let Some((&last_recovered, _)) = recovered.iter().next_back() else {
        return false;
    };
    let Some((&last_protected, _)) = entry.protected.iter().next_back() else {
        return false;
    };
    let diff = last_recovered
        .wrapping_sub(last_protected)
        .min(last_protected.wrapping_sub(last_recovered));
    diff > OLD_SEQUENCE_THRESHOLD
}

fn recover_one(entry: &FecEntry) -> Option<rtp::Packet> {
    let fec = &entry.packet;
    let mut byte0 = fec.byte0;
    let mut byte1 = fec.byte1;
    let mut ts_recovery = fec.ts_recovery;
    let mut length_recovery = fec.length_recovery;
    let mut payload = fec.payload.clone();

    for known in entry.protected.values().flatten() {
        let header_byte0 = ((known.header.version & 0x3) << 6)
            | ((known.header.padding as u8) << 5)
            | ((known.header.extension as u8) << 4)
            | (known.header.csrc.len() as u8 & 0xF);
        let header_byte1 = ((known.header.marker as u8) << 7) | (known.header.payload_type & 0x7F);

        byte0 ^= header_byte0;
        byte1 ^= header_byte1;
        ts_recovery ^= known.header.timestamp;
        length_recovery ^= known.payload.len() as u16;

        for (i, &b) in known.payload.iter().enumerate() {
            if i < payload.len() {
                payload[i] ^= b;
            }
        }
    }

    let missing_seq = entry
        .protected
        .iter()
        .find(|(_, v)| v.is_none())
        .map(|(&seq, _)| seq)?;

    payload.truncate(length_recovery as usize);

    Some(rtp::Packet {
        header: rtp::header::Header {
            // byte0's top two bits were repurposed as E/L during transit;
            // the RTP version field (always 2) replaces them on recovery.
            version: 2,
            padding: (byte0 & 0x20) != 0,
            extension: (byte0 & 0x10) != 0,
            marker: (byte1 & 0x80) != 0,
            payload_type: byte1 & 0x7F,
            sequence_number: missing_seq,
            timestamp: ts_recovery,
            csrc: Vec::new(),
            ..Default::default()
        },
        payload: payload.into(),
    })
}
