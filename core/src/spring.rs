use crate::error::ConfigError;

pub const DEFAULT_PRECISION: f32 = 0.01;
pub const CHANNEL_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    X,
    Y,
    Opacity,
    Scale,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] =
        [Channel::X, Channel::Y, Channel::Opacity, Channel::Scale];

    const fn index(self) -> usize {
        match self {
            Channel::X => 0,
            Channel::Y => 1,
            Channel::Opacity => 2,
            Channel::Scale => 3,
        }
    }
}

/// A sparse vector of named spring channels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpringVec {
    slots: [Option<f32>; CHANNEL_COUNT],
}

impl SpringVec {
    pub const fn xy(x: f32, y: f32) -> Self {
        Self {
            slots: [Some(x), Some(y), None, None],
        }
    }

    pub const fn xyo(x: f32, y: f32, opacity: f32) -> Self {
        Self {
            slots: [Some(x), Some(y), Some(opacity), None],
        }
    }

    pub const fn xy_scale(x: f32, y: f32, scale: f32) -> Self {
        Self {
            slots: [Some(x), Some(y), None, Some(scale)],
        }
    }

    pub fn with(mut self, channel: Channel, value: f32) -> Self {
        self.slots[channel.index()] = Some(value);
        self
    }

    pub fn get(&self, channel: Channel) -> Option<f32> {
        self.slots[channel.index()]
    }

    pub fn x(&self) -> f32 {
        self.get(Channel::X).unwrap_or(0.0)
    }

    pub fn y(&self) -> f32 {
        self.get(Channel::Y).unwrap_or(0.0)
    }

    pub fn opacity(&self) -> f32 {
        self.get(Channel::Opacity).unwrap_or(0.0)
    }

    pub fn scale(&self) -> f32 {
        self.get(Channel::Scale).unwrap_or(1.0)
    }

    pub fn channels(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        Channel::ALL
            .iter()
            .filter_map(|channel| self.get(*channel).map(|value| (*channel, value)))
    }
}

/// Integrator constants. Only the presets and [`SpringConfig::new`] build
/// one, so every config a spring holds has passed validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    stiffness: f32,
    damping: f32,
    precision: f32,
}

impl SpringConfig {
    pub const INTERACT: SpringConfig = SpringConfig::preset(0.066, 0.25);
    pub const SNAP: SpringConfig = SpringConfig::preset(0.01, 0.06);
    pub const POPOVER: SpringConfig = SpringConfig::preset(0.033, 0.45);
    pub const FLIP: SpringConfig = SpringConfig::preset(0.025, 0.5);
    pub const RETURN: SpringConfig = SpringConfig::preset(0.07, 0.55);

    const fn preset(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn new(stiffness: f32, damping: f32, precision: f32) -> Result<Self, ConfigError> {
        let config = Self {
            stiffness,
            damping,
            precision,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn precision(&self) -> f32 {
        self.precision
    }

    /// Rejects configurations under which the integrator would never settle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stiffness > 0.0 && self.stiffness <= 1.0) {
            return Err(ConfigError::Stiffness(self.stiffness));
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ConfigError::Damping(self.damping));
        }
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(ConfigError::Precision(self.precision));
        }
        Ok(())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::INTERACT
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SetMode {
    #[default]
    Soft,
    Hard,
    TargetOnly,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ChannelState {
    value: f32,
    target: f32,
    velocity: f32,
}

#[derive(Clone, Debug)]
pub struct Spring {
    channels: [Option<ChannelState>; CHANNEL_COUNT],
    config: SpringConfig,
    animating: bool,
}

impl Spring {
    pub fn new(initial: SpringVec, config: SpringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_preset(initial, config))
    }

    /// Builds a spring from one of the built-in presets, which are known valid.
    pub(crate) fn with_preset(initial: SpringVec, config: SpringConfig) -> Self {
        let mut channels = [None; CHANNEL_COUNT];
        for (channel, value) in initial.channels() {
            channels[channel.index()] = Some(ChannelState {
                value,
                target: value,
                velocity: 0.0,
            });
        }
        Self {
            channels,
            config,
            animating: false,
        }
    }

    /// Applies a new target. Returns `true` when this call started the spring.
    pub fn set(&mut self, target: SpringVec, mode: SetMode) -> bool {
        if mode == SetMode::Hard {
            let mut channels = [None; CHANNEL_COUNT];
            for (channel, value) in target.channels() {
                channels[channel.index()] = Some(ChannelState {
                    value,
                    target: value,
                    velocity: 0.0,
                });
            }
            self.channels = channels;
            self.animating = false;
            return false;
        }

        for (channel, value) in target.channels() {
            let slot = &mut self.channels[channel.index()];
            match slot {
                Some(state) => state.target = value,
                None => {
                    *slot = Some(ChannelState {
                        value,
                        target: value,
                        velocity: 0.0,
                    })
                }
            }
        }

        if mode == SetMode::Soft && !self.animating {
            self.animating = true;
            return true;
        }
        false
    }

    /// Advances one frame. Returns whether the spring is still animating.
    pub fn tick(&mut self) -> bool {
        if !self.animating {
            return false;
        }
        let SpringConfig {
            stiffness,
            damping,
            precision,
        } = self.config;
        let mut settled = true;
        for state in self.channels.iter_mut().flatten() {
            let delta = state.target - state.value;
            state.velocity += delta * stiffness;
            state.velocity *= 1.0 - damping;
            state.value += state.velocity;
            if delta.abs() >= precision || state.velocity.abs() >= precision {
                settled = false;
            }
        }
        if settled {
            for state in self.channels.iter_mut().flatten() {
                state.value = state.target;
                state.velocity = 0.0;
            }
            self.animating = false;
        }
        self.animating
    }

    pub fn value(&self) -> SpringVec {
        self.collect(|state| state.value)
    }

    pub fn target(&self) -> SpringVec {
        self.collect(|state| state.target)
    }

    pub fn velocity(&self, channel: Channel) -> Option<f32> {
        self.channels[channel.index()].map(|state| state.velocity)
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    /// Swaps the integrator constants; value and velocity carry over untouched.
    pub fn set_config(&mut self, config: SpringConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn collect(&self, field: impl Fn(&ChannelState) -> f32) -> SpringVec {
        let mut out = SpringVec::default();
        for channel in Channel::ALL {
            if let Some(state) = &self.channels[channel.index()] {
                out = out.with(channel, field(state));
            }
        }
        out
    }
}
