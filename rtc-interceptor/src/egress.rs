//! Final hop for outgoing RTP: rejects packets on an unregistered SSRC,
//! assigns transport-wide sequence numbers, stamps a DSCP hint, and folds
//! each packet's size into the per-type byte/bitrate counters and
//! send-to-capture delay stats the rest of the stack reads back.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use shared::error::{Error, Result};
use shared::marshal::MarshalSize;
use shared::TransportContext;

use crate::fec::{UlpFecEncoder, UlpFecParams};
use crate::statistician::{PacketSendInfo, TransportFeedbackStatistician};
use crate::{Packet, TaggedPacket};

const BITRATE_WINDOW: Duration = Duration::from_secs(1);
const DEFAULT_MTU: usize = 1500;
const UDP_IPV6_OVERHEAD: usize = 28;
/// DSCP AF21, used while a DTLS/ICE handshake is still in flight.
const DSCP_AF21: u8 = 0b010_010;
/// DSCP default forwarding (best effort), used for established media.
const DSCP_DEFAULT: u8 = 0;

/// Differentiated Services Code Point applied to an outbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DscpHint {
    Default,
    Handshake,
}

impl DscpHint {
    fn value(self) -> u8 {
        match self {
            DscpHint::Default => DSCP_DEFAULT,
            DscpHint::Handshake => DSCP_AF21,
        }
    }
}

/// Configuration recognized by [`RtpSenderEgress`].
#[derive(Debug, Clone)]
pub struct EgressConfig {
    pub local_media_ssrc: u32,
    pub rtx_send_ssrc: Option<u32>,
    pub flex_fec_ssrc: Option<u32>,
    /// Local extension id for the transport-wide sequence number header
    /// extension. `None` disables TSN assignment (and therefore feedback
    /// history tracking) for this egress.
    pub transport_cc_extension_id: Option<u8>,
    pub max_rtp_packet_size: usize,
    /// When set, in-flight-bytes accounting (via the statistician) includes
    /// an estimate of the transport's own per-packet overhead.
    pub send_side_bwe_with_overhead: bool,
    pub transport_overhead_bytes: usize,
}

impl EgressConfig {
    pub fn new(local_media_ssrc: u32) -> Self {
        Self {
            local_media_ssrc,
            rtx_send_ssrc: None,
            flex_fec_ssrc: None,
            transport_cc_extension_id: None,
            max_rtp_packet_size: (DEFAULT_MTU - UDP_IPV6_OVERHEAD).clamp(100, 1500),
            send_side_bwe_with_overhead: false,
            transport_overhead_bytes: UDP_IPV6_OVERHEAD,
        }
    }
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Bytes and packet count accumulated for one counter bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCounter {
    pub bytes: u64,
    pub packets: u64,
}

impl ByteCounter {
    fn add(&mut self, bytes: usize) {
        self.bytes += bytes as u64;
        self.packets += 1;
    }
}

/// Per-type send counters, updated on every successful [`RtpSenderEgress::send`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SendCounters {
    pub total: ByteCounter,
    pub header: ByteCounter,
    pub payload: ByteCounter,
    pub padding: ByteCounter,
    pub retransmit: ByteCounter,
    pub fec: ByteCounter,
}

/// Average/max/total send-to-capture delay observed for one SSRC.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureDelayStats {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl CaptureDelayStats {
    fn observe(&mut self, delay: Duration) {
        self.count += 1;
        self.total += delay;
        self.max = self.max.max(delay);
    }

    pub fn average(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count as u32
        }
    }
}

/// A one-second sliding window of byte samples, used to estimate an
/// instantaneous send bitrate for a counter bucket.
#[derive(Debug, Default)]
struct RateWindow {
    samples: VecDeque<(Instant, usize)>,
}

impl RateWindow {
    fn record(&mut self, now: Instant, bytes: usize) {
        self.samples.push_back((now, bytes));
        self.evict(now);
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&(t, _)) = self.samples.front() {
            if now.duration_since(t) > BITRATE_WINDOW {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn bitrate_bps(&self, now: Instant) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }
        let total_bytes: usize = self.samples.iter().map(|(_, b)| b).sum();
        let span = now
            .duration_since(self.samples.front().unwrap().0)
            .max(Duration::from_millis(1));
        (total_bytes as f64 * 8.0 / span.as_secs_f64()) as u64
    }
}

/// A packet handed to [`RtpSenderEgress::send`], tagged with what kind of
/// send it is so counters and FEC/TSN bookkeeping apply correctly.
#[derive(Debug)]
pub struct EgressPacket {
    pub packet: rtp::Packet,
    pub is_retransmit: bool,
    pub is_fec: bool,
    /// When this packet's media was captured, if the caller tracks it, used
    /// to report send-to-capture delay.
    pub capture_time: Option<Instant>,
}

/// Validates, tags, and counts outgoing RTP on its way to the transport.
pub struct RtpSenderEgress {
    config: EgressConfig,
    dscp: DscpHint,
    next_transport_seq: u16,
    statistician: TransportFeedbackStatistician,
    fec_encoder: Option<UlpFecEncoder>,
    pending_fec_params: Option<UlpFecParams>,
    counters: SendCounters,
    total_rate: RateWindow,
    retransmit_rate: RateWindow,
    fec_rate: RateWindow,
    capture_delay: HashMap<u32, CaptureDelayStats>,
}

impl RtpSenderEgress {
    pub fn new(config: EgressConfig) -> Self {
        Self {
            config,
            dscp: DscpHint::Default,
            next_transport_seq: rand::random::<u16>(),
            statistician: TransportFeedbackStatistician::new(),
            fec_encoder: None,
            pending_fec_params: None,
            counters: SendCounters::default(),
            total_rate: RateWindow::default(),
            retransmit_rate: RateWindow::default(),
            fec_rate: RateWindow::default(),
            capture_delay: HashMap::new(),
        }
    }

    pub fn set_dscp(&mut self, dscp: DscpHint) {
        self.dscp = dscp;
    }

    pub fn set_fec_encoder(&mut self, encoder: UlpFecEncoder) {
        self.fec_encoder = Some(encoder);
    }

    /// Queues protection parameters (e.g. stronger unequal protection at a
    /// keyframe boundary) to be applied to the FEC encoder on the next send.
    pub fn queue_fec_params(&mut self, params: UlpFecParams) {
        self.pending_fec_params = Some(params);
    }

    pub fn counters(&self) -> SendCounters {
        self.counters
    }

    pub fn total_bitrate_bps(&self, now: Instant) -> u64 {
        self.total_rate.bitrate_bps(now)
    }

    pub fn retransmit_bitrate_bps(&self, now: Instant) -> u64 {
        self.retransmit_rate.bitrate_bps(now)
    }

    pub fn fec_bitrate_bps(&self, now: Instant) -> u64 {
        self.fec_rate.bitrate_bps(now)
    }

    pub fn capture_delay(&self, ssrc: u32) -> Option<CaptureDelayStats> {
        self.capture_delay.get(&ssrc).copied()
    }

    pub fn statistician(&self) -> &TransportFeedbackStatistician {
        &self.statistician
    }

    pub fn statistician_mut(&mut self) -> &mut TransportFeedbackStatistician {
        &mut self.statistician
    }

    fn ssrc_registered(&self, ssrc: u32) -> bool {
        ssrc == self.config.local_media_ssrc
            || self.config.rtx_send_ssrc == Some(ssrc)
            || self.config.flex_fec_ssrc == Some(ssrc)
    }

    /// Validates, tags, counts, and hands off one outgoing packet. Returns
    /// the [`TaggedPacket`] ready for the transport.
    pub fn send(
        &mut self,
        egress: EgressPacket,
        transport: TransportContext,
        now: Instant,
    ) -> Result<TaggedPacket> {
        let EgressPacket {
            mut packet,
            is_retransmit,
            is_fec,
            capture_time,
        } = egress;

        let ssrc = packet.header.ssrc;
        if !self.ssrc_registered(ssrc) {
            return Err(Error::OtherInterceptorErr(format!(
                "egress: ssrc {ssrc} is not registered as media, rtx, or fec for this sender"
            )));
        }

        let size_before_tsn = packet.marshal_size();
        if size_before_tsn > self.config.max_rtp_packet_size {
            return Err(Error::OtherInterceptorErr(format!(
                "egress: packet of {size_before_tsn} bytes exceeds max_rtp_packet_size {}",
                self.config.max_rtp_packet_size
            )));
        }

        let transport_seq = if let Some(id) = self.config.transport_cc_extension_id {
            let seq = self.next_transport_seq;
            self.next_transport_seq = self.next_transport_seq.wrapping_add(1);
            let ext = rtp::extension::transport_cc_extension::TransportCcExtension {
                transport_sequence: seq,
            };
            packet.allocate_extension(id, ext.marshal()?)?;
            Some(seq)
        } else {
            None
        };

        if let Some(params) = self.pending_fec_params.take() {
            if let Some(encoder) = self.fec_encoder.as_mut() {
                encoder.set_params(params);
            }
        }

        let overhead = if self.config.send_side_bwe_with_overhead {
            self.config.transport_overhead_bytes
        } else {
            0
        };
        if let Some(seq) = transport_seq {
            let size = packet.marshal_size();
            self.statistician.add_packet(
                PacketSendInfo {
                    transport_sequence_number: seq,
                    ssrc,
                    rtp_sequence_number: packet.header.sequence_number,
                    size,
                    is_retransmit,
                },
                overhead,
                now,
            );
            self.statistician.process_sent(seq, now);
        } else {
            self.statistician
                .add_untracked_bytes(packet.marshal_size() + overhead);
        }

        let mut stamped_transport = transport;
        stamped_transport.dscp = self.dscp.value();

        self.account(&packet, is_retransmit, is_fec, now);
        if let Some(capture_time) = capture_time {
            let delay = now.saturating_duration_since(capture_time);
            self.capture_delay.entry(ssrc).or_default().observe(delay);
        }

        Ok(TaggedPacket {
            now,
            transport: stamped_transport,
            message: Packet::Rtp(packet),
        })
    }

    fn account(&mut self, packet: &rtp::Packet, is_retransmit: bool, is_fec: bool, now: Instant) {
        let header_bytes = packet.header.marshal_size();
        let padding_bytes = packet.padding_size() as usize;
        let payload_bytes = packet.payload.len();
        let total_bytes = header_bytes + payload_bytes + padding_bytes;

        self.counters.total.add(total_bytes);
        self.counters.header.add(header_bytes);
        self.counters.payload.add(payload_bytes);
        if padding_bytes > 0 {
            self.counters.padding.add(padding_bytes);
        }
        self.total_rate.record(now, total_bytes);

        if is_retransmit {
            self.counters.retransmit.add(total_bytes);
            self.retransmit_rate.record(now, total_bytes);
        }
        if is_fec {
            self.counters.fec.add(total_bytes);
            self.fec_rate.record(now, total_bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_packet(ssrc: u32, seq: u16, payload_len: usize) -> rtp::Packet {
        rtp::Packet {
            header: rtp::header::Header {
                ssrc,
                sequence_number: seq,
                ..Default::default()
            },
            payload: vec![0u8; payload_len].into(),
        }
    }

    fn egress_packet(ssrc: u32, seq: u16) -> EgressPacket {
        EgressPacket {
            packet: make_packet(ssrc, seq, 100),
            is_retransmit: false,
            is_fec: false,
            capture_time: None,
        }
    }

    #[test]
    fn test_rejects_unregistered_ssrc() {
        let mut egress = RtpSenderEgress::new(EgressConfig::new(1));
        let err = egress
            .send(egress_packet(999, 0), TransportContext::default(), Instant::now())
            .unwrap_err();
        assert!(matches!(err, Error::OtherInterceptorErr(_)));
    }

    #[test]
    fn test_accepts_media_rtx_and_fec_ssrc() {
        let mut config = EgressConfig::new(1);
        config.rtx_send_ssrc = Some(2);
        config.flex_fec_ssrc = Some(3);
        let mut egress = RtpSenderEgress::new(config);
        let now = Instant::now();
        for ssrc in [1, 2, 3] {
            assert!(
                egress
                    .send(egress_packet(ssrc, 0), TransportContext::default(), now)
                    .is_ok()
            );
        }
    }

    #[test]
    fn test_rejects_oversized_packet() {
        let mut config = EgressConfig::new(1);
        config.max_rtp_packet_size = 50;
        let mut egress = RtpSenderEgress::new(config);
        let err = egress
            .send(
                egress_packet(1, 0),
                TransportContext::default(),
                Instant::now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::OtherInterceptorErr(_)));
    }

    #[test]
    fn test_stamps_dscp_hint() {
        let mut egress = RtpSenderEgress::new(EgressConfig::new(1));
        egress.set_dscp(DscpHint::Handshake);
        let tagged = egress
            .send(egress_packet(1, 0), TransportContext::default(), Instant::now())
            .unwrap();
        assert_eq!(tagged.transport.dscp, DSCP_AF21);
    }

    #[test]
    fn test_counters_accumulate_by_type() {
        let mut egress = RtpSenderEgress::new(EgressConfig::new(1));
        let now = Instant::now();
        egress
            .send(egress_packet(1, 0), TransportContext::default(), now)
            .unwrap();

        let mut rtx = egress_packet(1, 1);
        rtx.is_retransmit = true;
        egress
            .send(rtx, TransportContext::default(), now)
            .unwrap();

        let counters = egress.counters();
        assert_eq!(counters.total.packets, 2);
        assert_eq!(counters.retransmit.packets, 1);
        assert!(counters.header.bytes > 0);
        assert!(counters.payload.bytes > 0);
    }

    #[test]
    fn test_transport_sequence_assigned_when_configured() {
        let mut config = EgressConfig::new(1);
        config.transport_cc_extension_id = Some(5);
        let mut egress = RtpSenderEgress::new(config);
        let tagged = egress
            .send(egress_packet(1, 0), TransportContext::default(), Instant::now())
            .unwrap();
        let Packet::Rtp(packet) = tagged.message else {
            panic!("expected rtp packet");
        };
        assert!(packet.header.get_extension(5).is_some());
        assert_eq!(egress.statistician().in_flight_bytes(), packet.marshal_size());
    }

    #[test]
    fn test_capture_delay_tracks_average_and_max() {
        let mut egress = RtpSenderEgress::new(EgressConfig::new(1));
        let t0 = Instant::now();
        let mut p = egress_packet(1, 0);
        p.capture_time = Some(t0);
        egress
            .send(p, TransportContext::default(), t0 + Duration::from_millis(10))
            .unwrap();

        let mut p2 = egress_packet(1, 1);
        p2.capture_time = Some(t0);
        egress
            .send(p2, TransportContext::default(), t0 + Duration::from_millis(30))
            .unwrap();

        let stats = egress.capture_delay(1).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.max, Duration::from_millis(30));
        assert_eq!(stats.average(), Duration::from_millis(20));
    }
}
