//! Containers: sections play their children in sequence, tracks play them
//! all at once.

use tracing::debug;

use super::beat::Beat;
use super::context::PlayContext;
use super::element::sequential;
use super::event::{sort_events, Event};
use super::instrument::InstrumentId;
use super::playable::Playable;
use super::PlayableId;

/// Settings a container imposes on everything below it. Unset fields are
/// inherited from the enclosing context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainerSettings {
    /// Carried into the children's context only. Event times are in beats
    /// and playback runs at the score tempo, so this does not move events.
    pub bpm: Option<f64>,
    pub volume: Option<u8>,
    pub instrument: Option<InstrumentId>,
    pub channel: Option<u8>,
}

impl ContainerSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer these settings over `ctx`. A drum kit without an explicit
    /// channel moves to the drum channel.
    pub fn apply(&self, ctx: &PlayContext) -> PlayContext {
        let mut next = ctx.clone();
        if let Some(bpm) = self.bpm {
            next.bpm = bpm;
        }
        if let Some(volume) = self.volume {
            next.volume = volume;
        }
        if let Some(instrument) = self.instrument {
            next.instrument = instrument;
            if instrument.is_drum_kit() && self.channel.is_none() {
                next.channel = instrument.default_channel();
            }
        }
        if let Some(channel) = self.channel {
            next.channel = channel;
        }
        next
    }

    /// Program and volume changes needed when entering a container whose
    /// settings differ from what it inherits.
    fn control_events(
        &self,
        start: Beat,
        inherited: &PlayContext,
        inner: &PlayContext,
        source: &PlayableId,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(instrument) = self.instrument.filter(|&i| i != inherited.instrument) {
            events.push(Event::program_change(
                start,
                instrument,
                inner.channel,
                source.clone(),
            ));
        }
        if let Some(volume) = self.volume.filter(|&v| v != inherited.volume) {
            events.push(Event::volume_change(
                start,
                volume,
                inner.channel,
                source.clone(),
            ));
        }
        events
    }
}

/// Setters for the parameters a container accepts. Leaf elements do not
/// implement this.
pub trait ConfigurableContainer {
    fn settings_mut(&mut self) -> &mut ContainerSettings;

    /// No `set` block can declare a container tempo; this is for trees built
    /// in code. See [`ContainerSettings::bpm`].
    fn set_bpm(&mut self, bpm: f64) {
        self.settings_mut().bpm = Some(bpm);
    }

    fn set_volume(&mut self, volume: u8) {
        self.settings_mut().volume = Some(volume);
    }

    fn set_instrument(&mut self, instrument: InstrumentId) {
        self.settings_mut().instrument = Some(instrument);
    }

    fn set_channel(&mut self, channel: u8) {
        self.settings_mut().channel = Some(channel);
    }
}

/// Context for the children of container `id`, or `None` when the container
/// is already being expanded further up (a cycle).
fn open(id: &PlayableId, settings: &ContainerSettings, ctx: &PlayContext) -> Option<PlayContext> {
    match ctx.enter(id) {
        Some(inner) => Some(settings.apply(&inner)),
        None => {
            debug!(container = %id, "container is its own ancestor, skipping");
            None
        }
    }
}

/// Children played one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub id: Option<PlayableId>,
    pub children: Vec<Playable>,
    pub settings: ContainerSettings,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            children: Vec::new(),
            settings: ContainerSettings::default(),
        }
    }

    pub fn with_children(mut self, children: Vec<Playable>) -> Self {
        self.children = children;
        self
    }

    pub fn push(&mut self, child: impl Into<Playable>) {
        self.children.push(child.into());
    }

    pub fn id(&self) -> PlayableId {
        self.id
            .clone()
            .unwrap_or_else(|| PlayableId::new(format!("section_{}", self.name)))
    }

    pub fn duration(&self, ctx: &PlayContext) -> Beat {
        let Some(inner) = open(&self.id(), &self.settings, ctx) else {
            return Beat::ZERO;
        };
        self.children.iter().map(|c| c.duration(&inner)).sum()
    }

    pub fn generate_events(&self, start: Beat, ctx: &PlayContext) -> Vec<Event> {
        let id = self.id();
        let Some(inner) = open(&id, &self.settings, ctx) else {
            return Vec::new();
        };
        let mut events = self.settings.control_events(start, ctx, &inner, &id);
        events.extend(sequential(&self.children, start, &inner));
        events
    }
}

impl ConfigurableContainer for Section {
    fn settings_mut(&mut self) -> &mut ContainerSettings {
        &mut self.settings
    }
}

/// Children played simultaneously.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub id: Option<PlayableId>,
    pub children: Vec<Playable>,
    pub settings: ContainerSettings,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            children: Vec::new(),
            settings: ContainerSettings::default(),
        }
    }

    pub fn with_children(mut self, children: Vec<Playable>) -> Self {
        self.children = children;
        self
    }

    pub fn push(&mut self, child: impl Into<Playable>) {
        self.children.push(child.into());
    }

    pub fn id(&self) -> PlayableId {
        self.id
            .clone()
            .unwrap_or_else(|| PlayableId::new(format!("track_{}", self.name)))
    }

    pub fn duration(&self, ctx: &PlayContext) -> Beat {
        let Some(inner) = open(&self.id(), &self.settings, ctx) else {
            return Beat::ZERO;
        };
        self.children
            .iter()
            .map(|c| c.duration(&inner))
            .max()
            .unwrap_or(Beat::ZERO)
    }

    pub fn generate_events(&self, start: Beat, ctx: &PlayContext) -> Vec<Event> {
        let id = self.id();
        let Some(inner) = open(&id, &self.settings, ctx) else {
            return Vec::new();
        };
        let mut events = self.settings.control_events(start, ctx, &inner, &id);
        for child in &self.children {
            events.extend(child.generate_events(start, &inner));
        }
        sort_events(&mut events);
        events
    }
}

impl ConfigurableContainer for Track {
    fn settings_mut(&mut self) -> &mut ContainerSettings {
        &mut self.settings
    }
}
