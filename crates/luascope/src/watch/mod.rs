//! Tick-driven value feed on top of the resolvers.
//!
//! Resolution is the expensive part and happens once: while unresolved, each
//! tick retries the anchors and every configured key path; once every
//! address is known the tracker only samples the (stable) slot addresses.
//! The `Unresolved -> Resolved` transition is terminal.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::{AnchorKind, ValueKind, WatchConfig};
use crate::memory::layout::{itype, tvalue};
use crate::memory::{Address, ModuleSnapshot, NOT_FOUND, ReadMemory};
use crate::resolve::{PointerPathResolver, TableResolver};

/// Decode a boolean tag word. Only the two runtime sentinel patterns are
/// accepted; anything else is an unexpected state.
pub fn decode_bool(word: u32) -> Option<bool> {
    match word {
        itype::TRUE => Some(true),
        itype::FALSE => Some(false),
        _ => None,
    }
}

/// One successfully sampled value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampledValue {
    Number(f64),
    Boolean(bool),
}

impl fmt::Display for SampledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampledValue::Number(n) => write!(f, "{n}"),
            SampledValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Samples one resolved value slot once per tick, keeping the last two
/// successful samples for edge detection.
#[derive(Debug)]
pub struct ValueWatcher {
    addr: Address,
    kind: ValueKind,
    current: Option<SampledValue>,
    previous: Option<SampledValue>,
    tag_warned: bool,
}

impl ValueWatcher {
    pub fn new(addr: Address, kind: ValueKind) -> Self {
        Self {
            addr,
            kind,
            current: None,
            previous: None,
            tag_warned: false,
        }
    }

    /// The resolved value-slot address being sampled.
    pub fn addr(&self) -> Address {
        self.addr
    }

    pub fn current(&self) -> Option<SampledValue> {
        self.current
    }

    pub fn previous(&self) -> Option<SampledValue> {
        self.previous
    }

    /// True when the last two successful samples differ.
    pub fn changed(&self) -> bool {
        matches!((self.current, self.previous), (Some(c), Some(p)) if c != p)
    }

    /// Sample once. A failed read or an unexpected tag word leaves the
    /// current/previous pair untouched.
    pub fn tick<R: ReadMemory>(&mut self, reader: &R) {
        let sample = match self.kind {
            ValueKind::Number => reader.read_f64(self.addr).map(SampledValue::Number),
            ValueKind::Boolean => match reader.read_u32(self.addr.wrapping_add(tvalue::IT)) {
                Some(word) => {
                    let decoded = decode_bool(word);
                    if decoded.is_none() && !self.tag_warned {
                        warn!(addr = self.addr, word, "unexpected tag word for boolean value");
                        self.tag_warned = true;
                    }
                    decoded.map(SampledValue::Boolean)
                }
                None => None,
            },
        };
        if let Some(sample) = sample {
            self.previous = self.current;
            self.current = Some(sample);
        }
    }
}

/// Resolution state of the tracker. The transition to `Resolved` is
/// terminal; addresses, once valid, are assumed stable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolved,
}

/// The two resolved anchor tables.
#[derive(Debug, Clone, Copy)]
pub struct Anchors {
    pub registry: Address,
    pub globals: Address,
}

/// Drives resolution and sampling, one call per host tick.
pub struct Tracker {
    config: WatchConfig,
    state: ResolutionState,
    anchors: Option<Anchors>,
    watchers: Vec<(String, ValueWatcher)>,
}

impl Tracker {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            state: ResolutionState::Unresolved,
            anchors: None,
            watchers: Vec::new(),
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// The anchor tables, once resolved.
    pub fn anchors(&self) -> Option<Anchors> {
        self.anchors
    }

    /// One polling tick: retry resolution while unresolved, sample once
    /// resolved. Failures are silent; the next tick retries.
    pub fn tick<R: ReadMemory>(&mut self, reader: &R, modules: &ModuleSnapshot) {
        match self.state {
            ResolutionState::Unresolved => self.try_resolve(reader, modules),
            ResolutionState::Resolved => {
                for (_, watcher) in &mut self.watchers {
                    watcher.tick(reader);
                }
            }
        }
    }

    /// The watcher for a named value, once resolved.
    pub fn value(&self, name: &str) -> Option<&ValueWatcher> {
        self.watchers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, w)| w)
    }

    /// All named watchers in config order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &ValueWatcher)> {
        self.watchers.iter().map(|(n, w)| (n.as_str(), w))
    }

    fn try_resolve<R: ReadMemory>(&mut self, reader: &R, modules: &ModuleSnapshot) {
        let paths = PointerPathResolver::new(reader, modules);
        let registry = paths.resolve(&self.config.registry.module, &self.config.registry.offsets);
        let globals = paths.resolve(&self.config.globals.module, &self.config.globals.offsets);
        if registry == NOT_FOUND || globals == NOT_FOUND {
            debug!(registry, globals, "anchors not resolvable yet");
            return;
        }

        let tables = TableResolver::new(reader);
        let mut watchers = Vec::with_capacity(self.config.values.len());
        for spec in &self.config.values {
            let root = match spec.anchor {
                AnchorKind::Registry => registry,
                AnchorKind::Globals => globals,
            };
            // keep the slot address itself: it is re-read every tick
            let addr = tables.resolve_path(root, &spec.path, false);
            if addr == NOT_FOUND {
                debug!(name = %spec.name, "value not resolvable yet");
                return;
            }
            watchers.push((spec.name.clone(), ValueWatcher::new(addr, spec.kind)));
        }

        info!(registry, globals, values = watchers.len(), "all addresses resolved");
        self.anchors = Some(Anchors { registry, globals });
        self.watchers = watchers;
        self.state = ResolutionState::Resolved;
        // sample immediately so the feed carries a value this same tick
        for (_, watcher) in &mut self.watchers {
            watcher.tick(reader);
        }
    }
}
