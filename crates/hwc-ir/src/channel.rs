use crate::process::ProcessId;
use crate::types::SignalType;
use hwc_ssa::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub process: ProcessId,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub elem: SignalType,
    pub depth: u32,
    /// Net sends minus receives across the whole design, clamped to
    /// `[0, depth]` once the design is fully built (spec §3 invariant).
    pub occupancy: u32,
    pub pos: Option<Position>,
    pub producers: Vec<Endpoint>,
    pub consumers: Vec<Endpoint>,
    sends: i64,
    recvs: i64,
}

impl Channel {
    pub fn new(name: impl Into<String>, elem: SignalType, depth: u32, pos: Option<Position>) -> Self {
        assert!(depth >= 1, "channel depth must be a positive constant");
        Self {
            name: name.into(),
            elem,
            depth,
            occupancy: 0,
            pos,
            producers: Vec::new(),
            consumers: Vec::new(),
            sends: 0,
            recvs: 0,
        }
    }

    pub fn add_producer(&mut self, process: ProcessId) {
        self.producers.push(Endpoint {
            process,
            direction: Direction::Send,
        });
    }

    pub fn add_consumer(&mut self, process: ProcessId) {
        self.consumers.push(Endpoint {
            process,
            direction: Direction::Receive,
        });
    }

    pub fn record_send(&mut self) {
        self.sends += 1;
    }

    pub fn record_recv(&mut self) {
        self.recvs += 1;
    }

    /// Finalizes `occupancy` from the running send/recv counters, clamped
    /// to `[0, depth]` (spec §4.3, "Channel occupancy").
    pub fn finalize_occupancy(&mut self) {
        let net = self.sends - self.recvs;
        self.occupancy = net.clamp(0, self.depth as i64) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalType;

    #[test]
    fn occupancy_clamps_to_depth() {
        let mut ch = Channel::new("c", SignalType::new(8, false), 4, None);
        for _ in 0..10 {
            ch.record_send();
        }
        ch.finalize_occupancy();
        assert_eq!(ch.occupancy, 4);
    }

    #[test]
    fn occupancy_clamps_to_zero_when_recvs_exceed_sends() {
        let mut ch = Channel::new("c", SignalType::new(8, false), 4, None);
        ch.record_send();
        ch.record_recv();
        ch.record_recv();
        ch.finalize_occupancy();
        assert_eq!(ch.occupancy, 0);
    }
}
