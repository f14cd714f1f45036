use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gloo::render::{request_animation_frame, AnimationFrame};
use holocard_core::FrameDriver;

/// Something that advances once per animation frame. Returns whether it wants
/// another frame.
pub(crate) trait FrameTarget {
    fn advance_frame(&self) -> bool;
}

/// The page-wide animation loop: at most one pending frame request, shared
/// by every card.
pub(crate) struct FrameLoop {
    driver: RefCell<FrameDriver<u32>>,
    targets: RefCell<HashMap<u32, Weak<dyn FrameTarget>>>,
    handle: RefCell<Option<AnimationFrame>>,
}

impl FrameLoop {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            driver: RefCell::new(FrameDriver::new()),
            targets: RefCell::new(HashMap::new()),
            handle: RefCell::new(None),
        })
    }

    pub(crate) fn register(&self, key: u32, target: Weak<dyn FrameTarget>) {
        self.targets.borrow_mut().insert(key, target);
    }

    pub(crate) fn unregister(&self, key: u32) {
        self.targets.borrow_mut().remove(&key);
        let mut driver = self.driver.borrow_mut();
        driver.cancel(key);
        if driver.is_idle() {
            self.handle.borrow_mut().take();
        }
    }

    pub(crate) fn schedule(self: &Rc<Self>, key: u32) {
        if !self.targets.borrow().contains_key(&key) {
            return;
        }
        self.driver.borrow_mut().schedule(key);
        self.ensure_frame();
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        self.driver.borrow().is_idle()
    }

    fn ensure_frame(self: &Rc<Self>) {
        if self.handle.borrow().is_some() {
            return;
        }
        let frames = Rc::clone(self);
        let handle = request_animation_frame(move |_timestamp| {
            frames.run_frame();
        });
        *self.handle.borrow_mut() = Some(handle);
    }

    fn run_frame(self: &Rc<Self>) {
        self.handle.borrow_mut().take();
        let keys = self.driver.borrow_mut().take_frame();
        let due: Vec<(u32, Option<Rc<dyn FrameTarget>>)> = {
            let targets = self.targets.borrow();
            keys.into_iter()
                .map(|key| (key, targets.get(&key).and_then(Weak::upgrade)))
                .collect()
        };
        let survivors: Vec<u32> = due
            .into_iter()
            .filter_map(|(key, target)| {
                let target = target?;
                target.advance_frame().then_some(key)
            })
            .collect();
        let pending = self.driver.borrow_mut().requeue(survivors);
        if pending {
            self.ensure_frame();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    struct Countdown {
        left: Cell<u32>,
        steps: Cell<u32>,
    }

    impl FrameTarget for Countdown {
        fn advance_frame(&self) -> bool {
            self.steps.set(self.steps.get() + 1);
            let left = self.left.get().saturating_sub(1);
            self.left.set(left);
            left > 0
        }
    }

    async fn next_frame() {
        gloo::timers::future::TimeoutFuture::new(32).await;
    }

    #[wasm_bindgen_test]
    async fn loop_stops_when_targets_settle() {
        let frames = FrameLoop::new();
        let target = Rc::new(Countdown {
            left: Cell::new(3),
            steps: Cell::new(0),
        });
        let weak: Weak<dyn FrameTarget> = Rc::downgrade(&(target.clone() as Rc<dyn FrameTarget>));
        frames.register(1, weak);
        frames.schedule(1);
        for _ in 0..20 {
            if frames.is_idle() {
                break;
            }
            next_frame().await;
        }
        assert!(frames.is_idle());
        assert_eq!(target.steps.get(), 3);
    }

    #[wasm_bindgen_test]
    fn unregistered_keys_are_ignored() {
        let frames = FrameLoop::new();
        frames.schedule(9);
        assert!(frames.is_idle());
    }
}
