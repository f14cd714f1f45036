use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::spring::SpringConfig;

pub const ROTATION_MAX_ANGLE: f32 = 26.0;
pub const ROTATION_INNER_FACTOR: f32 = -0.1;
pub const ROTATION_DIVISOR_X: f32 = 2.5;
pub const ROTATION_DIVISOR_Y: f32 = 3.0;
pub const PERSPECTIVE_DEFAULT: f32 = 1500.0;
pub const PERSPECTIVE_ACTIVE: f32 = 1800.0;
pub const SCALE_DEFAULT: f32 = 1.0;
pub const SCALE_ACTIVE: f32 = 1.03;
pub const SCALE_POPOVER: f32 = 1.75;
pub const REFLECTION_POSITION_MULTIPLIER: f32 = 400.0;
pub const GLOW_BASE_SIZE: f32 = 60.0;
pub const GLOW_MAX_SIZE_INCREASE: f32 = 20.0;
pub const POPPED_Z_INDEX: &str = "1000";
pub const POP_FLIP_DEGREES: f32 = 360.0;
pub const POP_DEPTH_PX: f32 = 50.0;

pub const TRANSITION_DEFAULT: &str = "transform 0.2s cubic-bezier(0.13, 0.53, 0.38, 0.97)";
pub const TRANSITION_SPRING: &str = "transform 0.5s cubic-bezier(0.175, 0.885, 0.32, 1.275)";
pub const TRANSITION_INNER_SPRING: &str = "transform 0.4s cubic-bezier(0.175, 0.885, 0.32, 1.175)";
pub const TRANSITION_INNER_DEFAULT: &str = "transform 0.15s cubic-bezier(0.13, 0.53, 0.38, 0.97)";
pub const TRANSITION_BACKGROUND: &str = "background-position 0.1s ease-out";
pub const TRANSITION_REFLECTION_RETURN: &str = "background-position 0.4s ease-out";

pub const SNAP_TRANSITION_RESTORE_MS: u32 = 500;
pub const CLICK_OUTSIDE_GRACE_MS: u32 = 500;
pub const CLEANUP_STYLE_DELAY_MS: u32 = 50;
pub const GALAXY_CLEANUP_DELAY_MS: u32 = 100;
pub const ANIMATION_RESTART_DELAY_MS: u32 = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    #[default]
    Standard,
    Galaxy,
    Radial,
    FullArt,
    Premium,
}

impl EffectType {
    pub const ALL: [EffectType; 5] = [
        EffectType::Standard,
        EffectType::Galaxy,
        EffectType::Radial,
        EffectType::FullArt,
        EffectType::Premium,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EffectType::Standard => "standard",
            EffectType::Galaxy => "galaxy",
            EffectType::Radial => "radial",
            EffectType::FullArt => "fullart",
            EffectType::Premium => "premium",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectType::Standard => "Standard",
            EffectType::Galaxy => "Galaxy",
            EffectType::Radial => "Radial",
            EffectType::FullArt => "Full Art",
            EffectType::Premium => "Premium",
        }
    }

    pub fn class_name(self) -> String {
        format!("effect-{}", self.as_str())
    }

    /// Parses a stored preference, falling back to the default for anything
    /// unknown or missing.
    pub fn from_preference(value: Option<&str>) -> Self {
        value
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_default()
    }

    pub fn profile(self) -> &'static EffectProfile {
        match self {
            EffectType::Standard => &STANDARD_PROFILE,
            EffectType::Galaxy => &GALAXY_PROFILE,
            EffectType::Radial => &RADIAL_PROFILE,
            EffectType::FullArt => &FULLART_PROFILE,
            EffectType::Premium => &PREMIUM_PROFILE,
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown effect type: {0}")]
pub struct UnknownEffect(pub String);

impl FromStr for EffectType {
    type Err = UnknownEffect;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EffectType::ALL
            .into_iter()
            .find(|effect| effect.as_str() == value)
            .ok_or_else(|| UnknownEffect(value.to_string()))
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Layers: u8 {
        const REFLECTION = 1 << 0;
        const GLOW = 1 << 1;
        const GALAXY_OVERLAY = 1 << 2;
        const SPARKLE_TINT = 1 << 3;
        const SPARKLE_LOOP = 1 << 4;
        const SHADER_PARAMS = 1 << 5;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlarePolicy {
    /// Full intensity whenever the pointer is over the card.
    Constant,
    /// Intensity grows with the pointer's distance from the card centre.
    DistanceFromCenter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskUsage {
    None,
    /// Holographic layers are stenciled by the background mask.
    Background,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundBand {
    pub lo: f32,
    pub hi: f32,
}

impl BackgroundBand {
    pub const fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    pub fn midpoint(&self) -> f32 {
        (self.lo + self.hi) * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectProfile {
    pub effect: EffectType,
    pub interact: SpringConfig,
    pub snap: SpringConfig,
    pub background_band: BackgroundBand,
    pub glare: GlarePolicy,
    pub layers: Layers,
    pub masks: MaskUsage,
}

impl EffectProfile {
    pub fn uses_masks(&self) -> bool {
        self.masks != MaskUsage::None
    }
}

const STANDARD_PROFILE: EffectProfile = EffectProfile {
    effect: EffectType::Standard,
    interact: SpringConfig::INTERACT,
    snap: SpringConfig::SNAP,
    background_band: BackgroundBand::new(35.0, 65.0),
    glare: GlarePolicy::Constant,
    layers: Layers::empty(),
    masks: MaskUsage::None,
};

const GALAXY_PROFILE: EffectProfile = EffectProfile {
    effect: EffectType::Galaxy,
    interact: SpringConfig::INTERACT,
    snap: SpringConfig::SNAP,
    background_band: BackgroundBand::new(30.0, 70.0),
    glare: GlarePolicy::Constant,
    layers: Layers::REFLECTION
        .union(Layers::GLOW)
        .union(Layers::GALAXY_OVERLAY)
        .union(Layers::SPARKLE_TINT)
        .union(Layers::SHADER_PARAMS),
    masks: MaskUsage::Background,
};

const RADIAL_PROFILE: EffectProfile = EffectProfile {
    effect: EffectType::Radial,
    interact: SpringConfig::INTERACT,
    snap: SpringConfig::SNAP,
    background_band: BackgroundBand::new(35.0, 65.0),
    glare: GlarePolicy::DistanceFromCenter,
    layers: Layers::REFLECTION
        .union(Layers::GLOW)
        .union(Layers::SHADER_PARAMS),
    masks: MaskUsage::Background,
};

const FULLART_PROFILE: EffectProfile = EffectProfile {
    effect: EffectType::FullArt,
    interact: SpringConfig::INTERACT,
    snap: SpringConfig::SNAP,
    background_band: BackgroundBand::new(20.0, 80.0),
    glare: GlarePolicy::Constant,
    layers: Layers::REFLECTION.union(Layers::GLOW),
    masks: MaskUsage::None,
};

const PREMIUM_PROFILE: EffectProfile = EffectProfile {
    effect: EffectType::Premium,
    interact: SpringConfig::INTERACT,
    snap: SpringConfig::SNAP,
    background_band: BackgroundBand::new(25.0, 75.0),
    glare: GlarePolicy::DistanceFromCenter,
    layers: Layers::REFLECTION
        .union(Layers::GLOW)
        .union(Layers::SPARKLE_LOOP)
        .union(Layers::SHADER_PARAMS),
    masks: MaskUsage::Background,
};
