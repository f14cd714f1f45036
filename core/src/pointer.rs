use crate::profile::{EffectProfile, GlarePolicy, ROTATION_DIVISOR_X, ROTATION_DIVISOR_Y, ROTATION_MAX_ANGLE};
use crate::spring::SpringVec;

pub const REST_ROTATE: SpringVec = SpringVec::xy(0.0, 0.0);
pub const REST_GLARE: SpringVec = SpringVec::xyo(50.0, 50.0, 0.0);
pub const REST_BACKGROUND: SpringVec = SpringVec::xy(50.0, 50.0);

/// Bounding box of a card in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CardRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    /// Offset that moves this box's centre onto the centre of the viewport,
    /// rounded to whole pixels.
    pub fn delta_to_viewport_center(&self, viewport_w: f32, viewport_h: f32) -> (f32, f32) {
        let (cx, cy) = self.center();
        (
            round_half_up(viewport_w * 0.5 - cx),
            round_half_up(viewport_h * 0.5 - cy),
        )
    }
}

/// Pointer position inside a card, in whole percent (0..=100).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerPercent {
    pub x: f32,
    pub y: f32,
}

impl PointerPercent {
    pub const CENTER: PointerPercent = PointerPercent { x: 50.0, y: 50.0 };

    pub fn from_center(&self) -> f32 {
        distance_from_center(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectTargets {
    pub background: SpringVec,
    pub rotate: SpringVec,
    pub glare: SpringVec,
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Rounds halves toward positive infinity, matching browser `Math.round`.
pub fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Linearly remaps `value` from one range onto another.
pub fn adjust(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    to_min + (to_max - to_min) * ((value - from_min) / (from_max - from_min))
}

/// Distance of a percent position from the card centre, 1.0 at the edge midpoints.
pub fn distance_from_center(x: f32, y: f32) -> f32 {
    let dx = x - 50.0;
    let dy = y - 50.0;
    (dx * dx + dy * dy).sqrt() / 50.0
}

pub fn pointer_percent(rect: CardRect, client_x: f32, client_y: f32) -> Option<PointerPercent> {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return None;
    }
    let local_x = clamp(client_x - rect.left, 0.0, rect.width);
    let local_y = clamp(client_y - rect.top, 0.0, rect.height);
    Some(PointerPercent {
        x: round_half_up(local_x / rect.width * 100.0),
        y: round_half_up(local_y / rect.height * 100.0),
    })
}

/// Rotation target for a pointer position.
///
/// Vertical offset drives `rotateX` with inverted sign so the top edge tilts
/// away from the viewer; horizontal offset drives `rotateY`. Both axes use
/// fixed divisors and are clamped to the maximum tilt angle.
pub fn rotation_for(percent: PointerPercent) -> SpringVec {
    let offset_x = percent.x - 50.0;
    let offset_y = percent.y - 50.0;
    let rotate_x = round_half_up(-(offset_y / ROTATION_DIVISOR_X));
    let rotate_y = round_half_up(offset_x / ROTATION_DIVISOR_Y);
    SpringVec::xy(
        clamp(rotate_x, -ROTATION_MAX_ANGLE, ROTATION_MAX_ANGLE),
        clamp(rotate_y, -ROTATION_MAX_ANGLE, ROTATION_MAX_ANGLE),
    )
}

pub fn map_pointer(percent: PointerPercent, profile: &EffectProfile) -> EffectTargets {
    let band = profile.background_band;
    let background = SpringVec::xy(
        adjust(percent.x, 0.0, 100.0, band.lo, band.hi),
        adjust(percent.y, 0.0, 100.0, band.lo, band.hi),
    );
    let opacity = match profile.glare {
        GlarePolicy::Constant => 1.0,
        GlarePolicy::DistanceFromCenter => percent.from_center().min(1.0),
    };
    EffectTargets {
        background,
        rotate: rotation_for(percent),
        glare: SpringVec::xyo(percent.x, percent.y, opacity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::EffectType;

    #[test]
    fn percent_is_clamped_and_rounded() {
        let rect = CardRect::new(100.0, 50.0, 300.0, 420.0);
        assert_eq!(
            pointer_percent(rect, 250.0, 260.0),
            Some(PointerPercent { x: 50.0, y: 50.0 })
        );
        assert_eq!(
            pointer_percent(rect, -40.0, 9000.0),
            Some(PointerPercent { x: 0.0, y: 100.0 })
        );
        assert_eq!(
            pointer_percent(rect, 101.0, 50.0),
            Some(PointerPercent { x: 0.0, y: 0.0 })
        );
        assert_eq!(pointer_percent(CardRect::new(0.0, 0.0, 0.0, 10.0), 1.0, 1.0), None);
    }

    #[test]
    fn rounding_matches_browser_halves() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-16.67), -17.0);
    }

    #[test]
    fn background_band_remaps_each_axis() {
        let profile = EffectType::Standard.profile();
        let targets = map_pointer(PointerPercent { x: 0.0, y: 100.0 }, profile);
        assert_eq!(targets.background, SpringVec::xy(35.0, 65.0));
    }

    #[test]
    fn rotation_is_clamped() {
        let rotate = rotation_for(PointerPercent { x: 100.0, y: 100.0 });
        assert_eq!(rotate, SpringVec::xy(-20.0, 17.0));
        for x in (0..=100).step_by(5) {
            for y in (0..=100).step_by(5) {
                let rotate = rotation_for(PointerPercent {
                    x: x as f32,
                    y: y as f32,
                });
                assert!(rotate.x().abs() <= ROTATION_MAX_ANGLE);
                assert!(rotate.y().abs() <= ROTATION_MAX_ANGLE);
            }
        }
    }

    #[test]
    fn distance_policy_scales_glare() {
        let profile = EffectType::Radial.profile();
        let center = map_pointer(PointerPercent::CENTER, profile);
        assert_eq!(center.glare.opacity(), 0.0);
        let corner = map_pointer(PointerPercent { x: 0.0, y: 0.0 }, profile);
        assert_eq!(corner.glare.opacity(), 1.0);
        let edge = map_pointer(PointerPercent { x: 75.0, y: 50.0 }, profile);
        assert!((edge.glare.opacity() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn viewport_delta_centres_the_box() {
        let rect = CardRect::new(10.0, 20.0, 200.0, 280.0);
        assert_eq!(rect.delta_to_viewport_center(1000.0, 800.0), (390.0, 240.0));
    }
}
