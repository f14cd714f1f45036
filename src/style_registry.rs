use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlStyleElement};

/// Owns every `<style>` element injected at runtime. Writing an id replaces
/// the previous element with that id.
pub(crate) struct StyleRegistry {
    document: Document,
    ids: RefCell<Vec<String>>,
}

impl StyleRegistry {
    pub(crate) fn new(document: Document) -> Rc<Self> {
        Rc::new(Self {
            document,
            ids: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn write(&self, id: &str, css: &str) -> Result<(), JsValue> {
        self.remove_element(id);
        let head = self
            .document
            .head()
            .ok_or_else(|| JsValue::from_str("document has no head"))?;
        let style: HtmlStyleElement = self.document.create_element("style")?.dyn_into()?;
        style.set_id(id);
        style.set_text_content(Some(css));
        head.append_child(&style)?;
        let mut ids = self.ids.borrow_mut();
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
        Ok(())
    }

    pub(crate) fn remove(&self, id: &str) {
        self.remove_element(id);
        self.ids.borrow_mut().retain(|known| known != id);
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.borrow().iter().any(|known| known == id)
    }

    pub(crate) fn scope(self: &Rc<Self>) -> StyleScope {
        StyleScope {
            registry: Rc::downgrade(self),
            ids: RefCell::new(Vec::new()),
        }
    }

    fn remove_element(&self, id: &str) {
        if let Some(existing) = self.document.get_element_by_id(id) {
            existing.remove();
        }
    }
}

impl Drop for StyleRegistry {
    fn drop(&mut self) {
        for id in self.ids.get_mut().drain(..) {
            if let Some(existing) = self.document.get_element_by_id(&id) {
                existing.remove();
            }
        }
    }
}

/// The rules one owner has written. Dropping the scope removes them.
pub(crate) struct StyleScope {
    registry: Weak<StyleRegistry>,
    ids: RefCell<Vec<String>>,
}

impl StyleScope {
    pub(crate) fn write(&self, id: &str, css: &str) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Err(err) = registry.write(id, css) {
            gloo::console::warn!("styles: failed to write", id, err);
            return;
        }
        let mut ids = self.ids.borrow_mut();
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }

    pub(crate) fn remove(&self, id: &str) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(id);
        }
        self.ids.borrow_mut().retain(|known| known != id);
    }

    pub(crate) fn clear(&self) {
        let ids: Vec<String> = self.ids.borrow_mut().drain(..).collect();
        if let Some(registry) = self.registry.upgrade() {
            for id in ids {
                registry.remove(&id);
            }
        }
    }
}

impl Drop for StyleScope {
    fn drop(&mut self) {
        self.clear();
    }
}
