pub mod card;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod pointer;
pub mod profile;
pub mod render;
pub mod spring;

pub use card::{CardState, FrameOutcome, LayoutSnapshot, MaskState, PopCommand};
pub use driver::FrameDriver;
pub use error::ConfigError;
pub use metadata::CardRecord;
pub use pointer::{CardRect, EffectTargets, PointerPercent};
pub use profile::{EffectProfile, EffectType, GlarePolicy, Layers, MaskUsage};
pub use render::CardFrame;
pub use spring::{Channel, SetMode, Spring, SpringConfig, SpringVec};
