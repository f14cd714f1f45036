//! Per-card interaction state: hover activity, the popped presentation and the
//! springs behind both. The browser layer feeds it events and writes whatever
//! [`CardState::step_frame`] returns.

use crate::pointer::{
    map_pointer, pointer_percent, CardRect, REST_BACKGROUND, REST_GLARE, REST_ROTATE,
};
use crate::profile::{
    EffectProfile, EffectType, POPPED_Z_INDEX, POP_FLIP_DEGREES, SCALE_DEFAULT, SCALE_POPOVER,
};
use crate::render::{
    apply_layers, inner_transform, popped_transform, return_transform, tilt_transform, CardFrame,
};
use crate::spring::{SetMode, Spring, SpringConfig, SpringVec};

/// Inline layout values saved before a pop and restored after the unpop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub left: String,
    pub top: String,
    pub z_index: String,
    pub transform: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskState {
    Pending,
    Applied,
    Unavailable,
}

#[derive(Clone, Debug)]
pub struct CardSprings {
    rotate: Spring,
    glare: Spring,
    background: Spring,
}

impl CardSprings {
    fn new(profile: &EffectProfile) -> Self {
        Self {
            rotate: Spring::with_preset(REST_ROTATE, profile.interact),
            glare: Spring::with_preset(REST_GLARE, profile.interact),
            background: Spring::with_preset(REST_BACKGROUND, profile.interact),
        }
    }

    pub fn rotate(&self) -> &Spring {
        &self.rotate
    }

    pub fn glare(&self) -> &Spring {
        &self.glare
    }

    pub fn background(&self) -> &Spring {
        &self.background
    }

    fn configure(&mut self, config: SpringConfig) {
        for spring in [&mut self.rotate, &mut self.glare, &mut self.background] {
            // Profile presets are validated by the profile table tests.
            let _ = spring.set_config(config);
        }
    }

    fn retarget(&mut self, rotate: SpringVec, glare: SpringVec, background: SpringVec) -> bool {
        let mut started = self.background.set(background, SetMode::Soft);
        started |= self.rotate.set(rotate, SetMode::Soft);
        started |= self.glare.set(glare, SetMode::Soft);
        started
    }

    fn tick(&mut self) -> bool {
        let rotate = self.rotate.tick();
        let glare = self.glare.tick();
        let background = self.background.tick();
        rotate || glare || background
    }

    fn is_animating(&self) -> bool {
        self.rotate.is_animating() || self.glare.is_animating() || self.background.is_animating()
    }
}

#[derive(Clone, Debug)]
enum PopPhase {
    Normal,
    Popped {
        delta: (f32, f32),
        flip: Option<Spring>,
    },
    Returning {
        motion: Spring,
    },
}

/// DOM changes that accompany a pop.
#[derive(Clone, Debug, PartialEq)]
pub struct PopCommand {
    pub z_index: &'static str,
    pub transform: String,
    pub plays_flip: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutcome {
    pub frame: CardFrame,
    pub animating: bool,
    /// Set on the frame that finishes an unpop.
    pub restore: Option<LayoutSnapshot>,
}

#[derive(Clone, Debug)]
pub struct CardState {
    effect: EffectType,
    is_active: bool,
    hovered: bool,
    has_been_popped_once: bool,
    springs: CardSprings,
    pop: PopPhase,
    original_layout: Option<LayoutSnapshot>,
    masks: MaskState,
}

impl CardState {
    pub fn new(effect: EffectType) -> Self {
        let profile = effect.profile();
        let masks = if profile.uses_masks() {
            MaskState::Pending
        } else {
            MaskState::Unavailable
        };
        Self {
            effect,
            is_active: false,
            hovered: false,
            has_been_popped_once: false,
            springs: CardSprings::new(profile),
            pop: PopPhase::Normal,
            original_layout: None,
            masks,
        }
    }

    pub fn effect(&self) -> EffectType {
        self.effect
    }

    pub fn profile(&self) -> &'static EffectProfile {
        self.effect.profile()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_popped(&self) -> bool {
        matches!(self.pop, PopPhase::Popped { .. })
    }

    pub fn is_returning(&self) -> bool {
        matches!(self.pop, PopPhase::Returning { .. })
    }

    pub fn has_been_popped_once(&self) -> bool {
        self.has_been_popped_once
    }

    pub fn springs(&self) -> &CardSprings {
        &self.springs
    }

    pub fn original_layout(&self) -> Option<&LayoutSnapshot> {
        self.original_layout.as_ref()
    }

    pub fn mask_state(&self) -> MaskState {
        self.masks
    }

    pub fn set_mask_state(&mut self, masks: MaskState) {
        self.masks = masks;
    }

    /// Whether holographic layers should be stenciled by the background mask.
    pub fn presents_masked(&self) -> bool {
        self.profile().uses_masks() && self.masks == MaskState::Applied
    }

    /// Switches the profile. An effect without masks never waits on a
    /// pending segmentation; a late result may still mark masks applied.
    pub fn set_effect(&mut self, effect: EffectType) {
        self.effect = effect;
        let uses_masks = effect.profile().uses_masks();
        match self.masks {
            MaskState::Unavailable if uses_masks => self.masks = MaskState::Pending,
            MaskState::Pending if !uses_masks => self.masks = MaskState::Unavailable,
            _ => {}
        }
    }

    pub fn activate(&mut self) {
        self.hovered = true;
        self.is_active = true;
    }

    /// Sends every spring back to rest on the slow profile. Returns whether
    /// the card needs frames.
    pub fn deactivate(&mut self) -> bool {
        self.hovered = false;
        self.is_active = false;
        let snap = self.profile().snap;
        self.springs.configure(snap);
        self.springs.retarget(REST_ROTATE, REST_GLARE, REST_BACKGROUND) || self.needs_frames()
    }

    /// Retargets the springs from a pointer position in client coordinates.
    /// Inactive and popped cards ignore movement.
    pub fn pointer_move(&mut self, rect: CardRect, client_x: f32, client_y: f32) -> bool {
        if !self.is_active || !matches!(self.pop, PopPhase::Normal) {
            return false;
        }
        let Some(percent) = pointer_percent(rect, client_x, client_y) else {
            return false;
        };
        let profile = self.profile();
        let targets = map_pointer(percent, profile);
        self.springs.configure(profile.interact);
        self.springs
            .retarget(targets.rotate, targets.glare, targets.background)
            || self.needs_frames()
    }

    /// Enlarges the card into the centre of the viewport. `current` is the
    /// inline layout to restore later; it is ignored when a previous unpop has
    /// not finished yet so the pre-pop layout survives.
    pub fn pop(
        &mut self,
        rect: CardRect,
        viewport: (f32, f32),
        current: LayoutSnapshot,
    ) -> Option<PopCommand> {
        if self.is_popped() {
            return None;
        }
        if !self.is_returning() || self.original_layout.is_none() {
            self.original_layout = Some(current);
        }
        // The measured box still carries the in-flight return translation.
        let rect = match &self.pop {
            PopPhase::Returning { motion } => {
                let offset = motion.value();
                CardRect::new(
                    rect.left - offset.x(),
                    rect.top - offset.y(),
                    rect.width,
                    rect.height,
                )
            }
            _ => rect,
        };
        let delta = rect.delta_to_viewport_center(viewport.0, viewport.1);
        let flip = if self.has_been_popped_once {
            None
        } else {
            let mut spring = Spring::with_preset(SpringVec::xy(0.0, 0.0), SpringConfig::FLIP);
            spring.set(SpringVec::xy(0.0, POP_FLIP_DEGREES), SetMode::Soft);
            Some(spring)
        };
        self.has_been_popped_once = true;
        let plays_flip = flip.is_some();
        self.pop = PopPhase::Popped { delta, flip };
        Some(PopCommand {
            z_index: POPPED_Z_INDEX,
            transform: popped_transform(delta, None),
            plays_flip,
        })
    }

    /// Starts the return spring. Returns `false` when the card was not popped.
    pub fn unpop(&mut self) -> bool {
        let PopPhase::Popped { delta, .. } = self.pop else {
            return false;
        };
        let start = SpringVec::xy_scale(delta.0, delta.1, SCALE_POPOVER);
        let mut motion = Spring::with_preset(start, SpringConfig::RETURN);
        motion.set(SpringVec::xy_scale(0.0, 0.0, SCALE_DEFAULT), SetMode::Soft);
        self.pop = PopPhase::Returning { motion };
        let interact = self.profile().interact;
        let _ = self.springs.rotate.set_config(interact);
        true
    }

    pub fn needs_frames(&self) -> bool {
        if self.springs.is_animating() {
            return true;
        }
        match &self.pop {
            PopPhase::Normal => false,
            PopPhase::Popped { flip, .. } => flip.as_ref().is_some_and(Spring::is_animating),
            PopPhase::Returning { motion } => motion.is_animating(),
        }
    }

    /// The transform for the current state without advancing anything.
    pub fn current_transform(&self) -> String {
        match &self.pop {
            PopPhase::Normal => tilt_transform(self.springs.rotate.value(), self.is_active),
            PopPhase::Popped { delta, flip } => popped_transform(
                *delta,
                flip.as_ref()
                    .filter(|spring| spring.is_animating())
                    .map(|spring| spring.value().y()),
            ),
            PopPhase::Returning { motion } => return_transform(motion.value()),
        }
    }

    /// Advances every spring one frame and renders the result.
    pub fn step_frame(&mut self) -> FrameOutcome {
        let tilt_animating = self.springs.tick();
        let mut restore = None;
        let mut pop_animating = false;
        let mut finished_return = false;

        match &mut self.pop {
            PopPhase::Normal => {}
            PopPhase::Popped { flip, .. } => {
                if let Some(spring) = flip {
                    pop_animating = spring.tick();
                }
            }
            PopPhase::Returning { motion } => {
                pop_animating = motion.tick();
                finished_return = !pop_animating;
            }
        }

        let mut frame = CardFrame {
            transform: self.current_transform(),
            inner_transform: inner_transform(self.springs.rotate.value()),
            ..CardFrame::default()
        };

        if finished_return {
            self.pop = PopPhase::Normal;
            self.is_active = self.hovered;
            if let Some(layout) = self.original_layout.take() {
                frame.transform = layout.transform.clone();
                restore = Some(layout);
            } else {
                frame.transform = tilt_transform(self.springs.rotate.value(), self.is_active);
            }
        }

        if matches!(self.pop, PopPhase::Normal) {
            apply_layers(
                &mut frame,
                self.profile(),
                self.springs.glare.value(),
                self.springs.background.value(),
            );
        }

        FrameOutcome {
            frame,
            animating: tilt_animating || pop_animating,
            restore,
        }
    }
}
