//! Rate-shapes outgoing RTP packets under a leaky-bucket budget, releasing
//! higher-priority classes (audio, then retransmissions, then video, then
//! padding) ahead of lower ones within the same wake-up.

use shared::marshal::MarshalSize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Release priority, highest first. Audio always preempts video;
/// retransmissions overtake fresh video so lost frames recover quickly;
/// padding only goes out when nothing else is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PacketPriority {
    Audio = 0,
    Retransmission = 1,
    Video = 2,
    Padding = 3,
}

const PRIORITY_CLASSES: [PacketPriority; 4] = [
    PacketPriority::Audio,
    PacketPriority::Retransmission,
    PacketPriority::Video,
    PacketPriority::Padding,
];

/// Configuration for [`PacedSender`].
#[derive(Debug, Clone)]
pub struct PacerConfig {
    /// Steady-state pacing rate.
    pub pacing_bitrate_bps: u64,
    /// Maximum leaky-bucket credit that can accumulate while idle; this is
    /// the one-time burst allowance on top of the steady rate.
    pub burst_budget_bytes: usize,
    /// Wake-ups this close together are coalesced into one.
    pub hold_back_window: Duration,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            pacing_bitrate_bps: 1_000_000,
            burst_budget_bytes: 1500,
            hold_back_window: Duration::from_millis(5),
        }
    }
}

struct Probe {
    #[allow(dead_code)]
    cluster_id: u32,
    target_bitrate_bps: u64,
    until: Instant,
}

struct QueuedPacket {
    packet: rtp::Packet,
    size: usize,
}

/// Shapes outgoing RTP into a configured bitrate using a leaky-bucket
/// budget, releasing the highest-priority non-empty queue first.
pub struct PacedSender {
    config: PacerConfig,
    queues: [VecDeque<QueuedPacket>; 4],
    budget_bytes: f64,
    last_refill: Instant,
    probe: Option<Probe>,
}

impl PacedSender {
    pub fn new(config: PacerConfig, now: Instant) -> Self {
        let burst = config.burst_budget_bytes as f64;
        Self {
            config,
            queues: Default::default(),
            budget_bytes: burst,
            last_refill: now,
            probe: None,
        }
    }

    /// Current pacing (or, during a probe, probe) rate in bits per second.
    fn effective_rate_bps(&self, now: Instant) -> u64 {
        match &self.probe {
            Some(p) if now < p.until => p.target_bitrate_bps,
            _ => self.config.pacing_bitrate_bps,
        }
    }

    /// Replace the steady-state pacing rate.
    pub fn set_pacing_bitrate(&mut self, bps: u64) {
        self.config.pacing_bitrate_bps = bps;
    }

    /// Temporarily replace the budget refill rate with a probe rate for
    /// `duration`, starting now.
    pub fn start_probe(&mut self, cluster_id: u32, target_bitrate_bps: u64, now: Instant, duration: Duration) {
        self.probe = Some(Probe {
            cluster_id,
            target_bitrate_bps,
            until: now + duration,
        });
    }

    fn refill(&mut self, now: Instant) {
        if now <= self.last_refill {
            return;
        }
        let elapsed = now.duration_since(self.last_refill);
        let rate = self.effective_rate_bps(now);
        let added_bytes = elapsed.as_secs_f64() * rate as f64 / 8.0;
        self.budget_bytes = (self.budget_bytes + added_bytes).min(self.config.burst_budget_bytes as f64);
        self.last_refill = now;

        if self.probe.as_ref().is_some_and(|p| now >= p.until) {
            self.probe = None;
        }
    }

    /// Queue a packet for release under `priority`.
    pub fn enqueue(&mut self, priority: PacketPriority, packet: rtp::Packet) {
        let size = packet.marshal_size();
        self.queues[priority as usize].push_back(QueuedPacket { packet, size });
    }

    /// Insert FEC packets produced after a release, ahead of any
    /// already-queued video so they go out with minimal added latency.
    pub fn enqueue_fec_ahead_of_video(&mut self, packets: Vec<rtp::Packet>) {
        for packet in packets.into_iter().rev() {
            let size = packet.marshal_size();
            self.queues[PacketPriority::Video as usize].push_front(QueuedPacket { packet, size });
        }
    }

    /// Budget as of `now`, without mutating any state (used by
    /// [`Self::next_send_time`], which takes `&self`).
    fn projected_budget(&self, now: Instant) -> f64 {
        if now <= self.last_refill {
            return self.budget_bytes;
        }
        let elapsed = now.duration_since(self.last_refill);
        let rate = self.effective_rate_bps(now);
        let added_bytes = elapsed.as_secs_f64() * rate as f64 / 8.0;
        (self.budget_bytes + added_bytes).min(self.config.burst_budget_bytes as f64)
    }

    fn front_size(&self) -> Option<(usize, usize)> {
        for (class_idx, priority) in PRIORITY_CLASSES.iter().enumerate() {
            if let Some(front) = self.queues[*priority as usize].front() {
                return Some((class_idx, front.size));
            }
        }
        None
    }

    /// Release as many queued packets as the current budget allows, highest
    /// priority first, replenishing the budget for elapsed time since the
    /// last call.
    pub fn poll_release(&mut self, now: Instant) -> Vec<rtp::Packet> {
        self.refill(now);

        let mut released = Vec::new();
        while let Some((class_idx, size)) = self.front_size() {
            if (size as f64) > self.budget_bytes {
                break;
            }
            let priority = PRIORITY_CLASSES[class_idx];
            let queued = self.queues[priority as usize].pop_front().expect("front_size found one");
            self.budget_bytes -= queued.size as f64;
            released.push(queued.packet);
        }
        released
    }

    /// When to next wake the pacer. `Some(now)` or earlier means there is
    /// immediate work to do; `None` means nothing is queued at all.
    pub fn next_send_time(&self, now: Instant) -> Option<Instant> {
        let (_, size) = self.front_size()?;
        let budget = self.projected_budget(now);

        if (size as f64) <= budget {
            return Some(now);
        }

        let deficit = size as f64 - budget;
        let rate = self.effective_rate_bps(now).max(1);
        let wait = Duration::from_secs_f64(deficit / (rate as f64 / 8.0));
        let mut deadline = now + wait;

        if deadline.duration_since(now) <= self.config.hold_back_window {
            deadline = now + self.config.hold_back_window;
        }
        if self.probe.is_some() {
            let millis = deadline.duration_since(now).as_millis() as u64;
            deadline = now + Duration::from_millis(millis);
        }
        Some(deadline)
    }
}
