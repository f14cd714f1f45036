use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use holocard_core::metadata::DEFAULT_SERVANT_IDS;
use holocard_core::{CardRecord, EffectType};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlSelectElement};

use crate::card_view::CardView;
use crate::frame_loop::FrameLoop;
use crate::metadata::{fetch_servants, js_err};
use crate::persisted::{load_effect_preference, save_effect_preference};
use crate::style_registry::StyleRegistry;

const CONTAINER_CLASS: &str = "card-container";
const EFFECT_SELECT_ID: &str = "effect-select";

thread_local! {
    static DECK: RefCell<Option<Rc<Deck>>> = const { RefCell::new(None) };
}

/// Every mounted card plus the page-wide services they share.
pub(crate) struct Deck {
    document: Document,
    container: Element,
    registry: Rc<StyleRegistry>,
    frames: Rc<FrameLoop>,
    cards: RefCell<Vec<Rc<CardView>>>,
    effect: RefCell<EffectType>,
    select_listener: RefCell<Option<EventListener>>,
}

impl Deck {
    fn new(document: Document, container: Element, effect: EffectType) -> Rc<Self> {
        Rc::new(Self {
            registry: StyleRegistry::new(document.clone()),
            frames: FrameLoop::new(),
            document,
            container,
            cards: RefCell::new(Vec::new()),
            effect: RefCell::new(effect),
            select_listener: RefCell::new(None),
        })
    }

    fn mount_cards(&self, records: Vec<CardRecord>) -> Result<(), JsValue> {
        let effect = *self.effect.borrow();
        let mut cards = self.cards.borrow_mut();
        for (index, record) in records.into_iter().enumerate() {
            let card = CardView::mount(
                &self.document,
                &self.container,
                index as u32,
                record,
                effect,
                Rc::clone(&self.frames),
                &self.registry,
            )?;
            cards.push(card);
        }
        Ok(())
    }

    /// Switches every card to `effect` and remembers the choice.
    pub(crate) fn set_effect(&self, effect: EffectType) {
        if *self.effect.borrow() == effect {
            return;
        }
        *self.effect.borrow_mut() = effect;
        save_effect_preference(effect);
        let cards: Vec<Rc<CardView>> = self.cards.borrow().clone();
        for card in &cards {
            card.set_effect_type(effect);
        }
    }

    fn bind_select(self: &Rc<Self>, select: HtmlSelectElement) {
        let deck = Rc::downgrade(self);
        let target = select.clone();
        let listener = EventListener::new(&select, "change", move |_event: &Event| {
            let Some(deck) = deck.upgrade() else {
                return;
            };
            match target.value().parse::<EffectType>() {
                Ok(effect) => deck.set_effect(effect),
                Err(err) => gloo::console::warn!("effect select:", err.to_string()),
            }
        });
        *self.select_listener.borrow_mut() = Some(listener);
    }

    fn show_error(&self, message: &str) {
        let Ok(node) = self.document.create_element("div") else {
            return;
        };
        node.set_class_name("error-message");
        node.set_text_content(Some(message));
        let _ = self.container.append_child(&node);
    }

    /// Tears every card down. The deck is unusable afterwards.
    pub(crate) fn destroy(&self) {
        self.select_listener.borrow_mut().take();
        for card in self.cards.borrow_mut().drain(..) {
            card.destroy();
            card.root().remove();
        }
    }
}

fn ensure_container(document: &Document) -> Result<Element, JsValue> {
    if let Some(existing) = document.query_selector(&format!(".{CONTAINER_CLASS}"))? {
        return Ok(existing);
    }
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    let container = document.create_element("div")?;
    container.set_class_name(CONTAINER_CLASS);
    body.append_child(&container)?;
    Ok(container)
}

fn ensure_effect_select(
    document: &Document,
    container: &Element,
) -> Result<HtmlSelectElement, JsValue> {
    if let Some(existing) = document.get_element_by_id(EFFECT_SELECT_ID) {
        return existing.dyn_into().map_err(|_| JsValue::from_str("#effect-select is not a select"));
    }
    let select: HtmlSelectElement = document.create_element("select")?.dyn_into()?;
    select.set_id(EFFECT_SELECT_ID);
    for effect in EffectType::ALL {
        let option = document.create_element("option")?;
        option.set_attribute("value", effect.as_str())?;
        option.set_text_content(Some(effect.label()));
        select.append_child(&option)?;
    }
    if let Some(parent) = container.parent_node() {
        parent.insert_before(&select, Some(container))?;
    }
    Ok(select)
}

async fn start() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("missing document"))?;
    let container = ensure_container(&document)?;
    let select = ensure_effect_select(&document, &container)?;

    let effect = load_effect_preference();
    select.set_value(effect.as_str());

    let deck = Deck::new(document, container, effect);
    deck.bind_select(select);
    DECK.with(|slot| {
        if let Some(previous) = slot.borrow_mut().replace(Rc::clone(&deck)) {
            previous.destroy();
        }
    });

    match fetch_servants(DEFAULT_SERVANT_IDS).await {
        Ok(records) => {
            gloo::console::log!("deck: mounting cards", records.len());
            deck.mount_cards(records)?;
        }
        Err(err) => {
            gloo::console::error!("deck: metadata unavailable", err.to_string());
            deck.show_error(&format!("Failed to load cards: {err}"));
        }
    }
    Ok(())
}

pub(crate) async fn run() {
    if let Err(err) = start().await {
        gloo::console::error!("deck: startup failed", js_err(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn record(id: u32) -> CardRecord {
        CardRecord {
            id,
            name: format!("Servant {id}"),
            rarity: 5,
            image_url: "data:image/gif;base64,R0lGODlhAQABAAAAACw=".to_string(),
            effect_text: "Test".to_string(),
        }
    }

    fn fresh_container(document: &Document) -> Element {
        let container = document.create_element("div").expect("div");
        document
            .body()
            .expect("body")
            .append_child(&container)
            .expect("append");
        container
    }

    #[wasm_bindgen_test]
    fn mounting_builds_card_layers() {
        let document = web_sys::window().unwrap().document().unwrap();
        let container = fresh_container(&document);
        let deck = Deck::new(document, container.clone(), EffectType::Standard);
        deck.mount_cards(vec![record(1), record(2)]).expect("mount");

        let cards = container.query_selector_all(".card").expect("query");
        assert_eq!(cards.length(), 2);
        for selector in [
            ".card-inner",
            ".holo-overlay",
            ".holo-reflection",
            ".holo-diffraction",
            ".holo-glow",
            ".holo-sparkle",
        ] {
            assert!(container.query_selector(selector).unwrap().is_some(), "{selector}");
        }
        let first = container.query_selector(".card").unwrap().unwrap();
        assert!(first.class_list().contains("effect-standard"));
        deck.destroy();
        assert_eq!(container.query_selector_all(".card").unwrap().length(), 0);
        container.remove();
    }

    #[wasm_bindgen_test]
    fn effect_switch_swaps_classes() {
        let document = web_sys::window().unwrap().document().unwrap();
        let container = fresh_container(&document);
        let deck = Deck::new(document, container.clone(), EffectType::Standard);
        deck.mount_cards(vec![record(3)]).expect("mount");
        deck.set_effect(EffectType::FullArt);

        let card = container.query_selector(".card").unwrap().unwrap();
        let classes = card.class_list();
        assert!(classes.contains("effect-fullart"));
        assert!(!classes.contains("effect-standard"));
        assert_eq!(deck.cards.borrow()[0].effect(), Some(EffectType::FullArt));
        deck.destroy();
        container.remove();
    }
}
