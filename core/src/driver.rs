//! One driver steps every animating card per frame.
//!
//! Cards register themselves when one of their springs starts and the driver
//! drops them as soon as a step reports that nothing is moving anymore, so an
//! idle page has an empty driver and no pending frame request.

#[derive(Clone, Debug)]
pub struct FrameDriver<K> {
    active: Vec<K>,
}

impl<K> Default for FrameDriver<K> {
    fn default() -> Self {
        Self { active: Vec::new() }
    }
}

impl<K: Copy + Eq> FrameDriver<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key`. Returns `true` when the driver was idle, meaning the
    /// caller has to request a new animation frame.
    pub fn schedule(&mut self, key: K) -> bool {
        let was_idle = self.active.is_empty();
        if !self.active.contains(&key) {
            self.active.push(key);
        }
        was_idle
    }

    pub fn cancel(&mut self, key: K) {
        self.active.retain(|active| *active != key);
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.active.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Hands out the keys to step this frame. Keys scheduled while the frame
    /// runs land in the fresh list and are merged by [`FrameDriver::requeue`].
    pub fn take_frame(&mut self) -> Vec<K> {
        std::mem::take(&mut self.active)
    }

    /// Puts back the keys that are still animating after a frame. Returns
    /// whether another frame is needed.
    pub fn requeue(&mut self, survivors: impl IntoIterator<Item = K>) -> bool {
        let scheduled_during_frame = std::mem::take(&mut self.active);
        for key in survivors.into_iter().chain(scheduled_during_frame) {
            if !self.active.contains(&key) {
                self.active.push(key);
            }
        }
        !self.active.is_empty()
    }

    /// Steps each active key once and keeps the ones that report motion.
    pub fn step<F>(&mut self, mut step: F) -> bool
    where
        F: FnMut(K) -> bool,
    {
        let keys = self.take_frame();
        let survivors: Vec<K> = keys.into_iter().filter(|key| step(*key)).collect();
        self.requeue(survivors)
    }
}
