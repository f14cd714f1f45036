use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use holocard_core::profile::{
    ANIMATION_RESTART_DELAY_MS, CLEANUP_STYLE_DELAY_MS, CLICK_OUTSIDE_GRACE_MS,
    GALAXY_CLEANUP_DELAY_MS, PERSPECTIVE_DEFAULT, SNAP_TRANSITION_RESTORE_MS,
    TRANSITION_BACKGROUND, TRANSITION_DEFAULT, TRANSITION_INNER_DEFAULT,
    TRANSITION_INNER_SPRING, TRANSITION_REFLECTION_RETURN, TRANSITION_SPRING,
};
use holocard_core::render::{
    rest_transform, CardFrame, PROP_CARD_OPACITY, PROP_POINTER_FROM_CENTER,
    PROP_POINTER_FROM_LEFT, PROP_POINTER_FROM_TOP, PROP_POINTER_X, PROP_POINTER_Y,
};
use holocard_core::{CardRecord, CardRect, CardState, EffectType, Layers, LayoutSnapshot, MaskState};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, Node};

use crate::frame_loop::{FrameLoop, FrameTarget};
use crate::input::{sample_from_event, PointerSample, TapGesture};
use crate::masks::{build_masks, CardMasks};
use crate::style_registry::{StyleRegistry, StyleScope};
use crate::styles;

const ACTIVE_CLASS: &str = "active";
const POPPED_CLASS: &str = "popped";
const MASKED_CLASS: &str = "masked";
const BODY_POPPED_CLASS: &str = "card-popped";

const SPARKLE_BURST_ANIMATION: &str = "sparkle 0.8s ease forwards";
const SPARKLE_POP_ANIMATION: &str = "sparkle-pop 1.2s ease-out forwards";
const SPARKLE_LOOP_ANIMATION: &str = "sparkle-premium 7s linear infinite";

const POINTER_PROPERTIES: [&str; 6] = [
    PROP_POINTER_X,
    PROP_POINTER_Y,
    PROP_POINTER_FROM_CENTER,
    PROP_POINTER_FROM_LEFT,
    PROP_POINTER_FROM_TOP,
    PROP_CARD_OPACITY,
];

fn set_style(element: &HtmlElement, property: &str, value: &str) {
    let _ = element.style().set_property(property, value);
}

fn create_div(document: &Document, class: &str) -> Result<HtmlElement, JsValue> {
    let element: HtmlElement = document.create_element("div")?.dyn_into()?;
    element.set_class_name(class);
    Ok(element)
}

fn card_rect(element: &Element) -> CardRect {
    let rect = element.get_bounding_client_rect();
    CardRect::new(
        rect.left() as f32,
        rect.top() as f32,
        rect.width() as f32,
        rect.height() as f32,
    )
}

fn viewport_size() -> (f32, f32) {
    let Some(window) = web_sys::window() else {
        return (0.0, 0.0);
    };
    let read = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0) as f32
    };
    (read(window.inner_width()), read(window.inner_height()))
}

fn body_class(add: bool) {
    let Some(body) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
    else {
        return;
    };
    let classes = body.class_list();
    let _ = if add {
        classes.add_1(BODY_POPPED_CLASS)
    } else {
        classes.remove_1(BODY_POPPED_CLASS)
    };
}

/// The named layers of one card. Any of them may be missing from custom
/// markup; writes to a missing layer are skipped.
struct CardNodes {
    root: HtmlElement,
    inner: Option<HtmlElement>,
    overlay: Option<HtmlElement>,
    reflection: Option<HtmlElement>,
    diffraction: Option<HtmlElement>,
    glow: Option<HtmlElement>,
    sparkle: Option<HtmlElement>,
}

impl CardNodes {
    fn from_root(root: HtmlElement) -> Self {
        let find = |selector: &str| {
            root.query_selector(selector)
                .ok()
                .flatten()
                .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        };
        Self {
            inner: find(".card-inner"),
            overlay: find(".holo-overlay"),
            reflection: find(".holo-reflection"),
            diffraction: find(".holo-diffraction"),
            glow: find(".holo-glow"),
            sparkle: find(".holo-sparkle"),
            root,
        }
    }

    fn build(document: &Document, key: u32, record: &CardRecord) -> Result<Self, JsValue> {
        let root = create_div(document, "card")?;
        root.set_attribute(styles::CARD_KEY_ATTR, &key.to_string())?;
        root.set_attribute("data-id", &record.id.to_string())?;

        let inner = create_div(document, "card-inner")?;
        let face = create_div(document, "card-face")?;
        let image = document.create_element("img")?;
        image.set_class_name("card-image");
        image.set_attribute("crossorigin", "anonymous")?;
        image.set_attribute("src", &record.image_url)?;
        image.set_attribute("alt", &record.name)?;
        face.append_child(&image)?;
        for class in [
            "holo-overlay",
            "holo-sparkle",
            "holo-reflection",
            "holo-diffraction",
            "holo-glow",
        ] {
            face.append_child(&create_div(document, class)?)?;
        }
        let character = create_div(document, "holo-character")?;
        set_style(
            &character,
            "background-image",
            &format!("url(\"{}\")", record.image_url),
        );
        face.append_child(&character)?;

        let info = create_div(document, "card-info")?;
        let name = create_div(document, "card-name")?;
        name.set_text_content(Some(&record.name));
        let rarity = create_div(document, "card-rarity")?;
        rarity.set_text_content(Some(&record.rarity_stars()));
        let effect = create_div(document, "card-effect")?;
        effect.set_text_content(Some(&record.effect_text));
        info.append_child(&name)?;
        info.append_child(&rarity)?;
        info.append_child(&effect)?;
        face.append_child(&info)?;
        inner.append_child(&face)?;
        root.append_child(&inner)?;
        Ok(Self::from_root(root))
    }

    fn layers(&self) -> impl Iterator<Item = &HtmlElement> {
        [
            &self.overlay,
            &self.reflection,
            &self.diffraction,
            &self.glow,
            &self.sparkle,
        ]
        .into_iter()
        .flatten()
    }

    fn reflow(&self) {
        let _ = self.root.offset_height();
        for layer in self.inner.iter().chain(self.layers()) {
            let _ = layer.offset_height();
        }
    }
}

#[derive(Default)]
struct CardTimers {
    transition_restore: Option<Timeout>,
    outside_grace: Option<Timeout>,
    reset_cleanup: Option<Timeout>,
    galaxy_cleanup: Option<Timeout>,
    animation_restart: Option<Timeout>,
}

/// One card on the page: its DOM, its interaction state and everything that
/// keeps it alive. Event handlers hold weak references, so dropping the last
/// `Rc` (or calling [`CardView::destroy`]) releases it.
pub(crate) struct CardView {
    key: u32,
    record: CardRecord,
    nodes: CardNodes,
    state: RefCell<Option<CardState>>,
    frames: Rc<FrameLoop>,
    styles: StyleScope,
    listeners: RefCell<Vec<EventListener>>,
    outside_click: RefCell<Option<EventListener>>,
    timers: RefCell<CardTimers>,
    tap: RefCell<TapGesture>,
    mask_job: Cell<bool>,
}

impl CardView {
    pub(crate) fn mount(
        document: &Document,
        container: &Node,
        key: u32,
        record: CardRecord,
        effect: EffectType,
        frames: Rc<FrameLoop>,
        registry: &Rc<StyleRegistry>,
    ) -> Result<Rc<Self>, JsValue> {
        let nodes = CardNodes::build(document, key, &record)?;
        container.append_child(&nodes.root)?;
        let view = Rc::new(Self {
            key,
            record,
            nodes,
            state: RefCell::new(Some(CardState::new(effect))),
            frames,
            styles: registry.scope(),
            listeners: RefCell::new(Vec::new()),
            outside_click: RefCell::new(None),
            timers: RefCell::new(CardTimers::default()),
            tap: RefCell::new(TapGesture::new()),
            mask_job: Cell::new(false),
        });
        let weak: Weak<CardView> = Rc::downgrade(&view);
        let target: Weak<dyn FrameTarget> = weak;
        view.frames.register(key, target);
        view.install_listeners();
        view.present_effect();
        Ok(view)
    }

    pub(crate) fn root(&self) -> &HtmlElement {
        &self.nodes.root
    }

    #[cfg(test)]
    pub(crate) fn effect(&self) -> Option<EffectType> {
        self.state.borrow().as_ref().map(CardState::effect)
    }

    fn with_state<R>(&self, action: impl FnOnce(&mut CardState) -> R) -> Option<R> {
        self.state.borrow_mut().as_mut().map(action)
    }

    fn install_listeners(self: &Rc<Self>) {
        let root = self.nodes.root.clone();
        let mut listeners = Vec::new();
        let blocking = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: false,
        };

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&root, "mouseenter", move |_event: &Event| {
            if let Some(view) = view.upgrade() {
                view.activate();
            }
        }));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&root, "mouseleave", move |_event: &Event| {
            if let Some(view) = view.upgrade() {
                view.deactivate();
            }
        }));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&root, "mousemove", move |event: &Event| {
            let (Some(view), Some(sample)) = (view.upgrade(), sample_from_event(event)) else {
                return;
            };
            view.move_to(sample);
        }));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&root, "click", move |event: &Event| {
            let Some(view) = view.upgrade() else {
                return;
            };
            event.stop_propagation();
            if let Some(sample) = sample_from_event(event) {
                view.sparkle_at(sample.client_x, sample.client_y);
            }
            view.toggle_pop();
        }));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &root,
            "touchstart",
            blocking,
            move |event: &Event| {
                event.prevent_default();
                let Some(view) = view.upgrade() else {
                    return;
                };
                view.activate();
                if let Some(sample) = sample_from_event(event) {
                    view.tap.borrow_mut().arm(sample, js_sys::Date::now());
                    view.move_to(sample);
                }
            },
        ));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &root,
            "touchmove",
            blocking,
            move |event: &Event| {
                let (Some(view), Some(sample)) = (view.upgrade(), sample_from_event(event)) else {
                    return;
                };
                event.prevent_default();
                view.tap.borrow_mut().update(sample);
                view.move_to(sample);
            },
        ));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&root, "touchend", move |_event: &Event| {
            let Some(view) = view.upgrade() else {
                return;
            };
            let tap = view.tap.borrow_mut().finish(js_sys::Date::now());
            if let Some((x, y)) = tap {
                view.sparkle_at(x, y);
                view.toggle_pop();
            }
            view.deactivate();
        }));

        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&root, "touchcancel", move |_event: &Event| {
            if let Some(view) = view.upgrade() {
                view.tap.borrow_mut().cancel();
                view.deactivate();
            }
        }));

        *self.listeners.borrow_mut() = listeners;
    }

    fn activate(&self) {
        if self.with_state(CardState::activate).is_some() {
            let _ = self.nodes.root.class_list().add_1(ACTIVE_CLASS);
        }
    }

    fn deactivate(self: &Rc<Self>) {
        let Some((needs_frames, presenting_pop)) = self.with_state(|state| {
            let needs_frames = state.deactivate();
            (needs_frames, state.is_popped() || state.is_returning())
        }) else {
            return;
        };
        let _ = self.nodes.root.class_list().remove_1(ACTIVE_CLASS);

        if !presenting_pop {
            let root = &self.nodes.root;
            set_style(root, "transition", TRANSITION_SPRING);
            set_style(root, "transform", &rest_transform());
            if let Some(inner) = &self.nodes.inner {
                set_style(inner, "transition", TRANSITION_INNER_SPRING);
                set_style(inner, "transform", "rotateX(0deg) rotateY(0deg)");
            }
            if let Some(reflection) = &self.nodes.reflection {
                set_style(reflection, "transition", TRANSITION_REFLECTION_RETURN);
                set_style(reflection, "background-position", "0% 0%");
            }
            let view = Rc::downgrade(self);
            self.timers.borrow_mut().transition_restore =
                Some(Timeout::new(SNAP_TRANSITION_RESTORE_MS, move || {
                    if let Some(view) = view.upgrade() {
                        view.restore_transitions();
                    }
                }));
        }

        if needs_frames {
            self.frames.schedule(self.key);
        }
    }

    fn restore_transitions(&self) {
        self.timers.borrow_mut().transition_restore.take();
        set_style(&self.nodes.root, "transition", TRANSITION_DEFAULT);
        if let Some(inner) = &self.nodes.inner {
            set_style(inner, "transition", TRANSITION_INNER_DEFAULT);
        }
        if let Some(reflection) = &self.nodes.reflection {
            set_style(reflection, "transition", TRANSITION_BACKGROUND);
        }
    }

    fn move_to(self: &Rc<Self>, sample: PointerSample) {
        let rect = card_rect(&self.nodes.root);
        let started = self
            .with_state(|state| state.pointer_move(rect, sample.client_x, sample.client_y))
            .unwrap_or(false);
        if started {
            self.frames.schedule(self.key);
        }
    }

    fn sparkle_at(&self, client_x: f32, client_y: f32) {
        let Some(sparkle) = &self.nodes.sparkle else {
            return;
        };
        let rect = card_rect(&self.nodes.root);
        set_style(
            sparkle,
            "background-position",
            &format!("{}px {}px", client_x - rect.left, client_y - rect.top),
        );
        set_style(sparkle, "animation", SPARKLE_BURST_ANIMATION);
    }

    fn toggle_pop(self: &Rc<Self>) {
        let popped = self
            .state
            .borrow()
            .as_ref()
            .is_some_and(CardState::is_popped);
        if popped {
            self.unpop();
        } else {
            self.pop();
        }
    }

    fn pop(self: &Rc<Self>) {
        let root = &self.nodes.root;
        let style = root.style();
        let current = LayoutSnapshot {
            left: style.get_property_value("left").unwrap_or_default(),
            top: style.get_property_value("top").unwrap_or_default(),
            z_index: style.get_property_value("z-index").unwrap_or_default(),
            transform: style.get_property_value("transform").unwrap_or_default(),
        };
        let rect = card_rect(root);
        let viewport = viewport_size();
        let Some(command) = self
            .with_state(|state| state.pop(rect, viewport, current))
            .flatten()
        else {
            return;
        };

        let _ = root.class_list().add_1(POPPED_CLASS);
        body_class(true);
        set_style(root, "z-index", command.z_index);
        set_style(root, "transition", TRANSITION_SPRING);
        set_style(root, "transform", &command.transform);
        if let Some(sparkle) = &self.nodes.sparkle {
            set_style(sparkle, "animation", SPARKLE_POP_ANIMATION);
        }
        if command.plays_flip {
            self.frames.schedule(self.key);
        }

        self.outside_click.borrow_mut().take();
        let view = Rc::downgrade(self);
        self.timers.borrow_mut().outside_grace =
            Some(Timeout::new(CLICK_OUTSIDE_GRACE_MS, move || {
                if let Some(view) = view.upgrade() {
                    view.timers.borrow_mut().outside_grace.take();
                    view.install_outside_click();
                }
            }));
    }

    fn install_outside_click(self: &Rc<Self>) {
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            return;
        };
        let view = Rc::downgrade(self);
        let listener = EventListener::new(&document, "click", move |event: &Event| {
            let Some(view) = view.upgrade() else {
                return;
            };
            let target = event.target().and_then(|target| target.dyn_into::<Node>().ok());
            if view.nodes.root.contains(target.as_ref()) {
                return;
            }
            let popped = view
                .state
                .borrow()
                .as_ref()
                .is_some_and(CardState::is_popped);
            if popped {
                // Unpopping drops this listener, so leave the handler first.
                wasm_bindgen_futures::spawn_local(async move {
                    view.unpop();
                });
            }
        });
        *self.outside_click.borrow_mut() = Some(listener);
    }

    fn unpop(self: &Rc<Self>) {
        self.outside_click.borrow_mut().take();
        self.timers.borrow_mut().outside_grace.take();
        if !self.with_state(CardState::unpop).unwrap_or(false) {
            return;
        }
        let _ = self.nodes.root.class_list().remove_1(POPPED_CLASS);
        body_class(false);
        set_style(&self.nodes.root, "transition", TRANSITION_DEFAULT);
        self.frames.schedule(self.key);
    }

    fn write_frame(&self, frame: &CardFrame) {
        let nodes = &self.nodes;
        set_style(&nodes.root, "transform", &frame.transform);
        if let Some(inner) = &nodes.inner {
            set_style(inner, "transform", &frame.inner_transform);
        }
        if let (Some(reflection), Some(position)) = (&nodes.reflection, &frame.reflection_position)
        {
            set_style(reflection, "background-position", position);
        }
        if let (Some(glow), Some(background)) = (&nodes.glow, &frame.glow_background) {
            set_style(glow, "background", background);
        }
        if let (Some(overlay), Some(background)) = (&nodes.overlay, &frame.overlay_background) {
            set_style(overlay, "background", background);
        }
        if let (Some(sparkle), Some(tint)) = (&nodes.sparkle, &frame.sparkle_tint) {
            set_style(sparkle, "color", &tint.color);
            set_style(sparkle, "filter", &tint.filter);
        }
        for (name, value) in &frame.properties {
            set_style(&nodes.root, name, value);
        }
    }

    fn restore_layout(&self, layout: &LayoutSnapshot, active: bool) {
        let root = &self.nodes.root;
        set_style(root, "left", &layout.left);
        set_style(root, "top", &layout.top);
        set_style(root, "z-index", &layout.z_index);
        set_style(root, "transform", &layout.transform);
        let classes = root.class_list();
        let _ = if active {
            classes.add_1(ACTIVE_CLASS)
        } else {
            classes.remove_1(ACTIVE_CLASS)
        };
    }

    pub(crate) fn set_effect_type(self: &Rc<Self>, effect: EffectType) {
        if self.with_state(|state| state.set_effect(effect)).is_none() {
            return;
        }
        self.reset_elements();
        let classes = self.nodes.root.class_list();
        for known in EffectType::ALL {
            let _ = classes.remove_1(&known.class_name());
        }
        let _ = classes.remove_1(MASKED_CLASS);

        let cleanup_id = styles::style_id(self.key, "galaxy-cleanup");
        self.styles
            .write(&cleanup_id, &styles::galaxy_cleanup_rules(self.key));
        self.nodes.reflow();
        let view = Rc::downgrade(self);
        self.timers.borrow_mut().galaxy_cleanup =
            Some(Timeout::new(GALAXY_CLEANUP_DELAY_MS, move || {
                if let Some(view) = view.upgrade() {
                    view.timers.borrow_mut().galaxy_cleanup.take();
                    view.styles.remove(&cleanup_id);
                }
            }));

        self.present_effect();
    }

    /// Attaches the effect class, or starts segmentation first when the
    /// effect wants masks that are not ready yet.
    fn present_effect(self: &Rc<Self>) {
        let Some((effect, masks)) = self
            .state
            .borrow()
            .as_ref()
            .map(|state| (state.effect(), state.mask_state()))
        else {
            return;
        };
        if masks == MaskState::Pending {
            self.start_masks();
            return;
        }
        let presents_masked = self
            .state
            .borrow()
            .as_ref()
            .is_some_and(CardState::presents_masked);
        let classes = self.nodes.root.class_list();
        let _ = classes.add_1(&effect.class_name());
        let _ = if presents_masked {
            classes.add_1(MASKED_CLASS)
        } else {
            classes.remove_1(MASKED_CLASS)
        };
        self.restart_animations();
    }

    fn start_masks(self: &Rc<Self>) {
        if self.mask_job.replace(true) {
            return;
        }
        let view = Rc::downgrade(self);
        let image_url = self.record.image_url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = build_masks(&image_url).await;
            // The card may have been destroyed while the image loaded.
            let Some(view) = view.upgrade() else {
                return;
            };
            view.mask_job.set(false);
            view.apply_masks(result);
        });
    }

    fn apply_masks(self: &Rc<Self>, result: Result<CardMasks, holocard_image_pipeline::SegmentError>) {
        if self.state.borrow().is_none() {
            return;
        }
        let mask_state = match result {
            Ok(masks) => {
                self.styles.write(
                    &styles::style_id(self.key, "masks"),
                    &styles::mask_rules(self.key, &masks.background_url, &masks.character_url),
                );
                MaskState::Applied
            }
            Err(err) => {
                gloo::console::warn!(
                    "masks: card falls back to unmasked",
                    self.record.id,
                    err.to_string()
                );
                MaskState::Unavailable
            }
        };
        if self
            .with_state(|state| state.set_mask_state(mask_state))
            .is_none()
        {
            return;
        }
        self.present_effect();
    }

    fn reset_elements(self: &Rc<Self>) {
        let nodes = &self.nodes;
        if let Some(overlay) = &nodes.overlay {
            set_style(overlay, "animation", "none");
            set_style(overlay, "background", "");
            set_style(overlay, "background-position", "");
        }
        if let Some(reflection) = &nodes.reflection {
            set_style(reflection, "animation", "none");
            set_style(reflection, "background-position", "0% 0%");
        }
        if let Some(diffraction) = &nodes.diffraction {
            set_style(diffraction, "animation", "none");
        }
        if let Some(glow) = &nodes.glow {
            set_style(glow, "animation", "none");
            set_style(glow, "background", "");
        }
        if let Some(sparkle) = &nodes.sparkle {
            set_style(sparkle, "animation", "none");
            set_style(sparkle, "color", "");
            set_style(sparkle, "filter", "");
        }
        let root_style = nodes.root.style();
        for property in POINTER_PROPERTIES {
            let _ = root_style.remove_property(property);
        }
        set_style(
            &nodes.root,
            "transform",
            &format!("perspective({PERSPECTIVE_DEFAULT}px)"),
        );
        if let Some(inner) = &nodes.inner {
            set_style(inner, "transform", "");
        }

        let reset_id = styles::style_id(self.key, "reset");
        self.styles.write(&reset_id, &styles::reset_rules(self.key));
        nodes.reflow();
        let view = Rc::downgrade(self);
        self.timers.borrow_mut().reset_cleanup =
            Some(Timeout::new(CLEANUP_STYLE_DELAY_MS, move || {
                if let Some(view) = view.upgrade() {
                    view.timers.borrow_mut().reset_cleanup.take();
                    view.styles.remove(&reset_id);
                }
            }));
    }

    fn restart_animations(self: &Rc<Self>) {
        let view = Rc::downgrade(self);
        self.timers.borrow_mut().animation_restart =
            Some(Timeout::new(ANIMATION_RESTART_DELAY_MS, move || {
                let Some(view) = view.upgrade() else {
                    return;
                };
                view.timers.borrow_mut().animation_restart.take();
                for layer in view.nodes.layers() {
                    set_style(layer, "animation", "");
                }
                let Some(layers) = view.state.borrow().as_ref().map(|state| state.profile().layers)
                else {
                    return;
                };
                let galaxy_id = styles::style_id(view.key, "galaxy-animation");
                if layers.contains(Layers::GALAXY_OVERLAY) {
                    view.styles
                        .write(&galaxy_id, &styles::galaxy_animation_rules(view.key));
                } else {
                    view.styles.remove(&galaxy_id);
                }
                if layers.contains(Layers::SPARKLE_LOOP) {
                    if let Some(sparkle) = &view.nodes.sparkle {
                        set_style(sparkle, "animation", SPARKLE_LOOP_ANIMATION);
                    }
                }
            }));
    }

    /// Releases listeners, timers, injected styles and the frame registration.
    /// Safe to call more than once.
    pub(crate) fn destroy(&self) {
        let Some(state) = self.state.borrow_mut().take() else {
            return;
        };
        self.frames.unregister(self.key);
        self.listeners.borrow_mut().clear();
        self.outside_click.borrow_mut().take();
        *self.timers.borrow_mut() = CardTimers::default();
        self.styles.clear();
        if state.is_popped() || state.is_returning() {
            body_class(false);
        }
    }
}

impl FrameTarget for CardView {
    fn advance_frame(&self) -> bool {
        let Some(outcome) = self.with_state(CardState::step_frame) else {
            return false;
        };
        self.write_frame(&outcome.frame);
        if let Some(layout) = &outcome.restore {
            let active = self
                .state
                .borrow()
                .as_ref()
                .is_some_and(CardState::is_active);
            self.restore_layout(layout, active);
        }
        outcome.animating
    }
}

impl Drop for CardView {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const KEY: u32 = 41;

    fn record() -> CardRecord {
        CardRecord {
            id: 41,
            name: "Servant 41".to_string(),
            rarity: 4,
            image_url: "data:image/gif;base64,R0lGODlhAQABAAAAACw=".to_string(),
            effect_text: "Test".to_string(),
        }
    }

    fn card_styles(document: &Document) -> u32 {
        document
            .query_selector_all(&format!("style[id^=\"holocard-{KEY}-\"]"))
            .expect("query")
            .length()
    }

    #[wasm_bindgen_test]
    async fn destroy_releases_frames_timers_and_styles() {
        let document = web_sys::window().unwrap().document().unwrap();
        let body = document.body().unwrap();
        let container = document.create_element("div").unwrap();
        body.append_child(&container).unwrap();
        let registry = StyleRegistry::new(document.clone());
        let frames = FrameLoop::new();
        let card = CardView::mount(
            &document,
            &container,
            KEY,
            record(),
            EffectType::Standard,
            Rc::clone(&frames),
            &registry,
        )
        .expect("mount");
        set_style(card.root(), "width", "200px");
        set_style(card.root(), "height", "280px");

        card.set_effect_type(EffectType::FullArt);
        assert!(card_styles(&document) > 0);

        card.activate();
        let rect = card_rect(card.root());
        card.move_to(PointerSample::mouse(rect.left + 10.0, rect.top + 10.0));
        assert!(!frames.is_idle());

        card.pop();
        assert!(card.timers.borrow().outside_grace.is_some());
        assert!(body.class_list().contains(BODY_POPPED_CLASS));

        card.destroy();
        card.destroy();

        assert!(frames.is_idle());
        assert_eq!(card_styles(&document), 0);
        {
            let timers = card.timers.borrow();
            assert!(timers.outside_grace.is_none());
            assert!(timers.reset_cleanup.is_none());
            assert!(timers.galaxy_cleanup.is_none());
            assert!(timers.animation_restart.is_none());
        }
        assert!(card.listeners.borrow().is_empty());
        assert!(!body.class_list().contains(BODY_POPPED_CLASS));

        // Past the grace period nothing reinstalls the outside-click handler.
        TimeoutFuture::new(CLICK_OUTSIDE_GRACE_MS + 100).await;
        assert!(card.outside_click.borrow().is_none());
        body.click();
        TimeoutFuture::new(16).await;
        assert!(card.state.borrow().is_none());
        assert!(frames.is_idle());
        container.remove();
    }

    #[wasm_bindgen_test]
    fn switching_to_an_unmasked_effect_attaches_it_at_once() {
        let document = web_sys::window().unwrap().document().unwrap();
        let container = document.create_element("div").unwrap();
        document.body().unwrap().append_child(&container).unwrap();
        let registry = StyleRegistry::new(document.clone());
        let card = CardView::mount(
            &document,
            &container,
            KEY + 1,
            record(),
            EffectType::Galaxy,
            FrameLoop::new(),
            &registry,
        )
        .expect("mount");
        let classes = card.root().class_list();
        assert!(!classes.contains("effect-galaxy"));

        card.set_effect_type(EffectType::Standard);
        assert!(classes.contains("effect-standard"));
        assert!(!classes.contains(MASKED_CLASS));
        card.destroy();
        container.remove();
    }
}
