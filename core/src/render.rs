//! Turns spring values into the style strings a card writes each frame.

use crate::pointer::distance_from_center;
use crate::profile::{
    EffectProfile, Layers, PERSPECTIVE_ACTIVE, PERSPECTIVE_DEFAULT, POP_DEPTH_PX,
    REFLECTION_POSITION_MULTIPLIER, ROTATION_INNER_FACTOR, SCALE_ACTIVE, SCALE_DEFAULT,
    SCALE_POPOVER, GLOW_BASE_SIZE, GLOW_MAX_SIZE_INCREASE,
};
use crate::spring::SpringVec;

pub const PROP_POINTER_X: &str = "--pointer-x";
pub const PROP_POINTER_Y: &str = "--pointer-y";
pub const PROP_POINTER_FROM_CENTER: &str = "--pointer-from-center";
pub const PROP_POINTER_FROM_LEFT: &str = "--pointer-from-left";
pub const PROP_POINTER_FROM_TOP: &str = "--pointer-from-top";
pub const PROP_CARD_OPACITY: &str = "--card-opacity";

#[derive(Clone, Debug, PartialEq)]
pub struct SparkleTint {
    pub color: String,
    pub filter: String,
}

/// Everything a card writes to the DOM for one frame. `None` layers are left
/// untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CardFrame {
    pub transform: String,
    pub inner_transform: String,
    pub reflection_position: Option<String>,
    pub glow_background: Option<String>,
    pub overlay_background: Option<String>,
    pub sparkle_tint: Option<SparkleTint>,
    pub properties: Vec<(&'static str, String)>,
}

/// Formats a CSS number with at most three decimals and no negative zero.
pub fn css_num(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}", rounded + 0.0)
}

pub fn tilt_transform(rotate: SpringVec, active: bool) -> String {
    let (perspective, scale) = if active {
        (PERSPECTIVE_ACTIVE, SCALE_ACTIVE)
    } else {
        (PERSPECTIVE_DEFAULT, SCALE_DEFAULT)
    };
    format!(
        "perspective({}px) rotateX({}deg) rotateY({}deg) scale({})",
        css_num(perspective),
        css_num(rotate.x()),
        css_num(rotate.y()),
        css_num(scale)
    )
}

pub fn rest_transform() -> String {
    tilt_transform(SpringVec::xy(0.0, 0.0), false)
}

pub fn inner_transform(rotate: SpringVec) -> String {
    format!(
        "rotateX({}deg) rotateY({}deg)",
        css_num(rotate.x() * ROTATION_INNER_FACTOR),
        css_num(rotate.y() * ROTATION_INNER_FACTOR)
    )
}

pub fn popped_transform(delta: (f32, f32), flip_deg: Option<f32>) -> String {
    let rotation = flip_deg
        .map(|deg| format!(" rotateY({}deg)", css_num(deg)))
        .unwrap_or_default();
    format!(
        "perspective({}px) translate3d({}px, {}px, {}px){} scale({})",
        css_num(PERSPECTIVE_ACTIVE),
        css_num(delta.0),
        css_num(delta.1),
        css_num(POP_DEPTH_PX),
        rotation,
        css_num(SCALE_POPOVER)
    )
}

pub fn return_transform(motion: SpringVec) -> String {
    format!(
        "perspective({}px) translate3d({}px, {}px, 0px) scale({})",
        css_num(PERSPECTIVE_DEFAULT),
        css_num(motion.x()),
        css_num(motion.y()),
        css_num(motion.scale())
    )
}

pub fn reflection_position(background: SpringVec) -> String {
    let factor = REFLECTION_POSITION_MULTIPLIER / 100.0;
    format!(
        "{}% {}%",
        css_num(background.x() * factor),
        css_num(background.y() * factor)
    )
}

pub fn glow_gradient(glare: SpringVec) -> String {
    let distance = distance_from_center(glare.x(), glare.y());
    let size = GLOW_BASE_SIZE + distance * GLOW_MAX_SIZE_INCREASE;
    let alpha = 0.6 + distance * 0.4;
    format!(
        "radial-gradient(circle at {}% {}%, rgba(255, 255, 255, {}) 0%, rgba(255, 255, 255, 0) {}%)",
        css_num(glare.x()),
        css_num(glare.y()),
        css_num(alpha),
        css_num(size)
    )
}

pub fn galaxy_overlay(glare: SpringVec) -> String {
    let x = glare.x();
    let y = glare.y();
    let near = |value: f32, offset: f32| (value + offset).clamp(0.0, 100.0);
    format!(
        "radial-gradient(circle at {}% {}%, rgba(255, 255, 255, 0.3) 10%, rgba(255, 255, 255, 0) 45%), \
         radial-gradient(circle at {}% {}%, rgba(255, 215, 0, 0.2) 0%, rgba(255, 215, 0, 0) 50%), \
         radial-gradient(circle at {}% {}%, rgba(148, 0, 211, 0.2) 0%, rgba(148, 0, 211, 0) 50%)",
        css_num(x),
        css_num(y),
        css_num(near(x, -20.0)),
        css_num(near(y, -10.0)),
        css_num(near(x, 20.0)),
        css_num(near(y, 10.0))
    )
}

pub fn sparkle_tint(glare: SpringVec) -> SparkleTint {
    let x = (glare.x() / 100.0).clamp(0.0, 1.0);
    let y = (glare.y() / 100.0).clamp(0.0, 1.0);
    let hue = (x * 360.0).floor().min(359.0);
    let saturation = 80.0 + (y * 20.0).floor();
    let lightness = 50.0 + ((x + y) * 0.5 * 20.0).floor();
    SparkleTint {
        color: format!("hsl({}, {}%, {}%)", hue, saturation, lightness),
        filter: format!(
            "drop-shadow(0 0 3px hsla({}, {}%, {}%, 0.8))",
            hue, saturation, lightness
        ),
    }
}

pub fn shader_properties(glare: SpringVec) -> Vec<(&'static str, String)> {
    let x = glare.x();
    let y = glare.y();
    vec![
        (PROP_POINTER_X, format!("{}%", css_num(x))),
        (PROP_POINTER_Y, format!("{}%", css_num(y))),
        (
            PROP_POINTER_FROM_CENTER,
            css_num(distance_from_center(x, y).clamp(0.0, 1.0)),
        ),
        (PROP_POINTER_FROM_LEFT, css_num((x / 100.0).clamp(0.0, 1.0))),
        (PROP_POINTER_FROM_TOP, css_num((y / 100.0).clamp(0.0, 1.0))),
        (PROP_CARD_OPACITY, css_num(glare.opacity().clamp(0.0, 1.0))),
    ]
}

/// Fills the layer fields of `frame` that `profile` enables.
pub fn apply_layers(
    frame: &mut CardFrame,
    profile: &EffectProfile,
    glare: SpringVec,
    background: SpringVec,
) {
    let layers = profile.layers;
    if layers.contains(Layers::REFLECTION) {
        frame.reflection_position = Some(reflection_position(background));
    }
    if layers.contains(Layers::GLOW) {
        frame.glow_background = Some(glow_gradient(glare));
    }
    if layers.contains(Layers::GALAXY_OVERLAY) {
        frame.overlay_background = Some(galaxy_overlay(glare));
    }
    if layers.contains(Layers::SPARKLE_TINT) {
        frame.sparkle_tint = Some(sparkle_tint(glare));
    }
    if layers.contains(Layers::SHADER_PARAMS) {
        frame.properties = shader_properties(glare);
    }
}
