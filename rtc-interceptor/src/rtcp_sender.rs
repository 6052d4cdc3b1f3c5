//! Schedules and assembles outbound compound RTCP.
//!
//! Callers register content under a [`RtcpPacketKind`]: sticky kinds
//! (SR/RR/SDES) replace their previous snapshot and are re-included in
//! every subsequent build until replaced again; volatile kinds (NACK,
//! PLI/FIR, BYE) are included once and then cleared. [`RtcpSender`] itself
//! never inspects RTP stream state — the per-stream reports it's handed are
//! built elsewhere (`crate::report`) and simply scheduled and packed here.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rtcp::compound::CompoundBuilder;
use rtcp::extended_reports::ExtendedReport;
use rtcp::goodbye::Goodbye;
use rtcp::packet::Packet as RtcpPacket;
use rtcp::payload_feedbacks::full_intra_request::{FirEntry, FullIntraRequest};
use rtcp::payload_feedbacks::picture_loss_indication::PictureLossIndication;
use rtcp::transport_feedbacks::transport_layer_nack::{
    TransportLayerNack, nack_pairs_from_sequence_numbers,
};
use shared::error::Result;

const VIDEO_BASE_INTERVAL: Duration = Duration::from_millis(1000);
const AUDIO_BASE_INTERVAL: Duration = Duration::from_millis(5000);
/// `360000 / send_bitrate_kbps` cap on the RTCP interval (RFC 3550 §6.2),
/// expressed directly in milliseconds since `send_bitrate_kbps` already is.
const INTERVAL_BITRATE_NUMERATOR_MS: u64 = 360_000;

/// How heavily an endpoint restricts RTCP traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcpMode {
    Off,
    Compound,
    ReducedSize,
}

/// Configuration recognized by [`RtcpSender`].
#[derive(Debug, Clone)]
pub struct RtcpSenderConfig {
    pub audio: bool,
    pub rtcp_mode: RtcpMode,
    /// Overrides the RFC 3550 base interval (1000 ms video / 5000 ms
    /// audio) when set.
    pub rtcp_report_interval_ms: Option<u32>,
    pub max_compound_size: usize,
}

impl Default for RtcpSenderConfig {
    fn default() -> Self {
        Self {
            audio: false,
            rtcp_mode: RtcpMode::Compound,
            rtcp_report_interval_ms: None,
            max_compound_size: 1200,
        }
    }
}

/// The RTCP packet kinds [`RtcpSender`] knows how to order and, for
/// transport-layer feedback, build from raw inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtcpPacketKind {
    SenderReport,
    ReceiverReport,
    Sdes,
    Nack,
    Pli,
    Fir,
    Xr,
    Bye,
}

/// Build order for a compound datagram. BYE is always last so a receiver
/// that stops processing after it doesn't miss other blocks.
const BUILD_ORDER: [RtcpPacketKind; 8] = [
    RtcpPacketKind::SenderReport,
    RtcpPacketKind::ReceiverReport,
    RtcpPacketKind::Sdes,
    RtcpPacketKind::Nack,
    RtcpPacketKind::Pli,
    RtcpPacketKind::Fir,
    RtcpPacketKind::Xr,
    RtcpPacketKind::Bye,
];

impl RtcpPacketKind {
    /// Sticky kinds persist across builds until replaced; volatile kinds
    /// fire once and are cleared after the next build.
    fn is_sticky(self) -> bool {
        matches!(
            self,
            RtcpPacketKind::SenderReport | RtcpPacketKind::ReceiverReport | RtcpPacketKind::Sdes
        )
    }
}

/// Schedules periodic/immediate RTCP sends and assembles them into one or
/// more size-bounded compound datagrams.
pub struct RtcpSender {
    config: RtcpSenderConfig,
    sticky: HashMap<RtcpPacketKind, Vec<Box<dyn RtcpPacket>>>,
    volatile: HashMap<RtcpPacketKind, Vec<Box<dyn RtcpPacket>>>,
    next_eval: Instant,
    send_bitrate_kbps: u64,
}

impl RtcpSender {
    pub fn new(config: RtcpSenderConfig, now: Instant) -> Self {
        Self {
            config,
            sticky: HashMap::new(),
            volatile: HashMap::new(),
            next_eval: now,
            send_bitrate_kbps: 0,
        }
    }

    /// Informs the interval cap of the current outbound bitrate so the
    /// scheduler never exceeds `360000 / send_bitrate_kbps` ms.
    pub fn set_send_bitrate_kbps(&mut self, kbps: u64) {
        self.send_bitrate_kbps = kbps;
    }

    fn base_interval(&self) -> Duration {
        match self.config.rtcp_report_interval_ms {
            Some(ms) => Duration::from_millis(ms as u64),
            None if self.config.audio => AUDIO_BASE_INTERVAL,
            None => VIDEO_BASE_INTERVAL,
        }
    }

    /// Registers content under `kind`. Off mode suppresses all RTCP; a
    /// sticky kind's previous content is replaced, a volatile kind's
    /// content is appended to whatever is already pending.
    pub fn send_rtcp(&mut self, kind: RtcpPacketKind, packets: Vec<Box<dyn RtcpPacket>>) {
        if self.config.rtcp_mode == RtcpMode::Off || packets.is_empty() {
            return;
        }
        if kind.is_sticky() {
            self.sticky.insert(kind, packets);
        } else {
            self.volatile.entry(kind).or_default().extend(packets);
        }
    }

    /// Convenience for queuing a NACK built from a list of missing sequence
    /// numbers, rather than requiring the caller to build
    /// [`TransportLayerNack`] itself.
    pub fn queue_nack(&mut self, sender_ssrc: u32, media_ssrc: u32, missing_seqs: &[u16]) {
        if missing_seqs.is_empty() {
            return;
        }
        let nacks = nack_pairs_from_sequence_numbers(missing_seqs);
        let packet = TransportLayerNack {
            sender_ssrc,
            media_ssrc,
            nacks,
        };
        self.send_rtcp(RtcpPacketKind::Nack, vec![Box::new(packet)]);
    }

    pub fn queue_pli(&mut self, sender_ssrc: u32, media_ssrc: u32) {
        self.send_rtcp(
            RtcpPacketKind::Pli,
            vec![Box::new(PictureLossIndication {
                sender_ssrc,
                media_ssrc,
            })],
        );
    }

    pub fn queue_fir(&mut self, sender_ssrc: u32, media_ssrc: u32, sequence_number: u8) {
        self.send_rtcp(
            RtcpPacketKind::Fir,
            vec![Box::new(FullIntraRequest {
                sender_ssrc,
                entries: vec![FirEntry {
                    ssrc: media_ssrc,
                    sequence_number,
                }],
            })],
        );
    }

    pub fn queue_bye(&mut self, sources: Vec<u32>, reason: String) {
        self.send_rtcp(
            RtcpPacketKind::Bye,
            vec![Box::new(Goodbye { sources, reason })],
        );
    }

    /// Merges every pending `ExtendedReport` (sticky and volatile) into a
    /// single packet, concatenating their sub-blocks in arrival order.
    fn coalesce_xr(&self) -> Option<ExtendedReport> {
        let mut sender_ssrc = None;
        let mut reports = Vec::new();
        for packets in [self.sticky.get(&RtcpPacketKind::Xr), self.volatile.get(&RtcpPacketKind::Xr)]
            .into_iter()
            .flatten()
        {
            for packet in packets {
                if let Some(xr) = packet.as_any().downcast_ref::<ExtendedReport>() {
                    sender_ssrc.get_or_insert(xr.sender_ssrc);
                    reports.extend(xr.reports.clone());
                }
            }
        }
        sender_ssrc.map(|sender_ssrc| ExtendedReport {
            sender_ssrc,
            reports,
        })
    }

    /// Packs every pending kind, in [`BUILD_ORDER`], into one or more
    /// datagrams no larger than `config.max_compound_size`, clears volatile
    /// content, and reschedules the next evaluation.
    pub fn build_and_flush(&mut self, now: Instant) -> Result<Vec<Bytes>> {
        let mut datagrams = Vec::new();
        {
            let mut builder = CompoundBuilder::new(self.config.max_compound_size, |d| {
                datagrams.push(d)
            });
            for kind in BUILD_ORDER {
                if kind == RtcpPacketKind::Xr {
                    if let Some(merged) = self.coalesce_xr() {
                        builder.push(&merged)?;
                    }
                    continue;
                }
                if let Some(packets) = self.sticky.get(&kind) {
                    builder.push_all(packets)?;
                }
                if let Some(packets) = self.volatile.get(&kind) {
                    builder.push_all(packets)?;
                }
            }
            builder.finish();
        }
        self.volatile.clear();
        self.schedule_next(now);
        Ok(datagrams)
    }

    fn schedule_next(&mut self, now: Instant) {
        let cap_ms = if self.send_bitrate_kbps > 0 {
            INTERVAL_BITRATE_NUMERATOR_MS / self.send_bitrate_kbps
        } else {
            u64::MAX
        };
        let interval_ms = self.base_interval().as_millis() as u64;
        let bounded_ms = interval_ms.min(cap_ms).max(1);

        let jitter = 0.5 + rand::random::<f64>();
        let delay_ms = ((bounded_ms as f64) * jitter).max(1.0) as u64;
        self.next_eval = now + Duration::from_millis(delay_ms);
    }

    pub fn next_eval(&self) -> Instant {
        self.next_eval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_eval <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcp::extended_reports::{DlrrReport, Rrtr, XrBlock};
    use rtcp::receiver_report::ReceiverReport;
    use rtcp::sender_report::SenderReport;

    fn sender(mode: RtcpMode, audio: bool) -> RtcpSender {
        RtcpSender::new(
            RtcpSenderConfig {
                audio,
                rtcp_mode: mode,
                ..Default::default()
            },
            Instant::now(),
        )
    }

    #[test]
    fn test_off_mode_drops_everything() {
        let mut s = sender(RtcpMode::Off, false);
        s.queue_bye(vec![1], String::new());
        let out = s.build_and_flush(Instant::now()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_build_order_places_bye_last_and_sr_first() {
        let mut s = sender(RtcpMode::Compound, false);
        s.queue_bye(vec![1], String::new());
        s.send_rtcp(
            RtcpPacketKind::SenderReport,
            vec![Box::new(SenderReport {
                ssrc: 1,
                ..Default::default()
            })],
        );
        s.send_rtcp(
            RtcpPacketKind::ReceiverReport,
            vec![Box::new(ReceiverReport {
                ssrc: 1,
                ..Default::default()
            })],
        );

        let datagrams = s.build_and_flush(Instant::now()).unwrap();
        assert_eq!(datagrams.len(), 1);
        let (packets, skipped) = rtcp::packet::unmarshal_compound(&datagrams[0]);
        assert_eq!(skipped, 0);
        assert!(packets[0].as_any().downcast_ref::<SenderReport>().is_some());
        assert!(
            packets
                .last()
                .unwrap()
                .as_any()
                .downcast_ref::<Goodbye>()
                .is_some()
        );
    }

    #[test]
    fn test_volatile_cleared_sticky_retained_after_build() {
        let mut s = sender(RtcpMode::Compound, false);
        s.send_rtcp(
            RtcpPacketKind::SenderReport,
            vec![Box::new(SenderReport {
                ssrc: 7,
                ..Default::default()
            })],
        );
        s.queue_pli(1, 2);

        let first = s.build_and_flush(Instant::now()).unwrap();
        let (first_packets, _) = rtcp::packet::unmarshal_compound(&first[0]);
        assert_eq!(first_packets.len(), 2);

        // A second build with no new content still re-sends the sticky SR
        // but not the one-shot PLI.
        let second = s.build_and_flush(Instant::now()).unwrap();
        let (second_packets, _) = rtcp::packet::unmarshal_compound(&second[0]);
        assert_eq!(second_packets.len(), 1);
        assert!(
            second_packets[0]
                .as_any()
                .downcast_ref::<SenderReport>()
                .is_some()
        );
    }

    #[test]
    fn test_xr_sub_blocks_coalesce_into_one_packet() {
        let mut s = sender(RtcpMode::Compound, false);
        s.send_rtcp(
            RtcpPacketKind::Xr,
            vec![Box::new(ExtendedReport {
                sender_ssrc: 1,
                reports: vec![XrBlock::Rrtr(Rrtr { ntp_timestamp: 42 })],
            })],
        );
        s.send_rtcp(
            RtcpPacketKind::Xr,
            vec![Box::new(ExtendedReport {
                sender_ssrc: 1,
                reports: vec![XrBlock::Dlrr(rtcp::extended_reports::Dlrr {
                    reports: vec![DlrrReport {
                        ssrc: 2,
                        last_rr: 1,
                        dlrr: 1,
                    }],
                })],
            })],
        );

        let datagrams = s.build_and_flush(Instant::now()).unwrap();
        let (packets, _) = rtcp::packet::unmarshal_compound(&datagrams[0]);
        assert_eq!(packets.len(), 1);
        let xr = packets[0].as_any().downcast_ref::<ExtendedReport>().unwrap();
        assert_eq!(xr.reports.len(), 2);
    }

    #[test]
    fn test_schedule_next_respects_bitrate_cap() {
        let mut s = sender(RtcpMode::Compound, false);
        s.set_send_bitrate_kbps(360_000); // cap -> 1ms
        let now = Instant::now();
        s.schedule_next(now);
        let delay = s.next_eval().duration_since(now);
        assert!(delay <= Duration::from_millis(2));
    }

    #[test]
    fn test_schedule_next_never_zero() {
        let mut s = sender(RtcpMode::Compound, false);
        let now = Instant::now();
        s.schedule_next(now);
        assert!(s.next_eval() > now);
    }

    #[test]
    fn test_nack_builder_expands_missing_seqs() {
        let mut s = sender(RtcpMode::Compound, false);
        s.queue_nack(1, 2, &[10, 11, 13]);
        let datagrams = s.build_and_flush(Instant::now()).unwrap();
        let (packets, _) = rtcp::packet::unmarshal_compound(&datagrams[0]);
        let nack = packets[0]
            .as_any()
            .downcast_ref::<TransportLayerNack>()
            .unwrap();
        assert_eq!(nack.nacks[0].packet_id, 10);
    }
}
