use crate::channel::{Channel, ChannelId};
use crate::process::Process;
use crate::signal::{Signal, SignalId};
use crate::types::SignalType;
use hwc_ssa::Position;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDir {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub ty: SignalType,
    pub dir: PortDir,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum IrError {
    #[error("duplicate signal name `{0}` in module `{1}`")]
    DuplicateSignal(String, String),
    #[error("duplicate channel name `{0}` in module `{1}`")]
    DuplicateChannel(String, String),
}

/// A hardware module (spec §3, "Module"). Owns its ports, signals,
/// channels, and processes; the first process is always the root
/// process, whose name matches the module's.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub ports: Vec<Port>,
    signals: IndexMap<String, Signal>,
    channels: IndexMap<String, Channel>,
    pub processes: Vec<Process>,
    pub pos: Option<Position>,
}

impl Module {
    /// A module starts with the two default ports: `clk` and `rst`, each
    /// 1-bit unsigned input (spec §3, "Module").
    pub fn new(name: impl Into<String>, pos: Option<Position>) -> Self {
        Self {
            name: name.into(),
            ports: vec![
                Port {
                    name: "clk".to_string(),
                    ty: SignalType::bit(),
                    dir: PortDir::In,
                },
                Port {
                    name: "rst".to_string(),
                    ty: SignalType::bit(),
                    dir: PortDir::In,
                },
            ],
            signals: IndexMap::new(),
            channels: IndexMap::new(),
            processes: Vec::new(),
            pos,
        }
    }

    pub fn add_signal(&mut self, signal: Signal) -> Result<SignalId, IrError> {
        if self.signals.contains_key(&signal.name) {
            return Err(IrError::DuplicateSignal(signal.name.clone(), self.name.clone()));
        }
        let (idx, _) = self.signals.insert_full(signal.name.clone(), signal);
        Ok(SignalId(idx as u32))
    }

    pub fn add_channel(&mut self, channel: Channel) -> Result<ChannelId, IrError> {
        if self.channels.contains_key(&channel.name) {
            return Err(IrError::DuplicateChannel(channel.name.clone(), self.name.clone()));
        }
        let (idx, _) = self.channels.insert_full(channel.name.clone(), channel);
        Ok(ChannelId(idx as u32))
    }

    pub fn signal(&self, id: SignalId) -> &Signal {
        self.signals
            .get_index(id.0 as usize)
            .expect("SignalId out of range")
            .1
    }

    pub fn signal_mut(&mut self, id: SignalId) -> &mut Signal {
        self.signals
            .get_index_mut(id.0 as usize)
            .expect("SignalId out of range")
            .1
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        self.channels
            .get_index(id.0 as usize)
            .expect("ChannelId out of range")
            .1
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> &mut Channel {
        self.channels
            .get_index_mut(id.0 as usize)
            .expect("ChannelId out of range")
            .1
    }

    pub fn signal_id(&self, name: &str) -> Option<SignalId> {
        self.signals.get_index_of(name).map(|i| SignalId(i as u32))
    }

    pub fn channel_id(&self, name: &str) -> Option<ChannelId> {
        self.channels.get_index_of(name).map(|i| ChannelId(i as u32))
    }

    /// Signals in insertion order, as `(id, signal)` pairs.
    pub fn signals(&self) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(i, (_, s))| (SignalId(i as u32), s))
    }

    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, &Channel)> {
        self.channels
            .iter()
            .enumerate()
            .map(|(i, (_, c))| (ChannelId(i as u32), c))
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The root process (spec §3 invariant: "the first process's name
    /// matches the module name").
    pub fn root_process(&self) -> &Process {
        &self.processes[0]
    }
}
