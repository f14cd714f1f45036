#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PointerKind {
    Mouse,
    Touch,
}

/// A pointer position in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PointerSample {
    pub client_x: f32,
    pub client_y: f32,
    pub kind: PointerKind,
}

impl PointerSample {
    pub(crate) fn mouse(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            kind: PointerKind::Mouse,
        }
    }

    pub(crate) fn touch(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            kind: PointerKind::Touch,
        }
    }
}

pub(crate) const TAP_MAX_DURATION_MS: f64 = 240.0;
pub(crate) const TAP_QUICK_MS: f64 = 120.0;
pub(crate) const TAP_DEFAULT_SLOP_PX: f32 = 8.0;

/// Recognizes a tap among touch events, since cancelling `touchstart`
/// suppresses the synthetic click.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TapGesture {
    start: [f32; 2],
    start_ms: f64,
    max_slop: f32,
    moved: bool,
    active: bool,
}

impl TapGesture {
    pub(crate) fn new() -> Self {
        Self::with_slop(TAP_DEFAULT_SLOP_PX)
    }

    pub(crate) fn with_slop(max_slop: f32) -> Self {
        Self {
            start: [0.0, 0.0],
            start_ms: 0.0,
            max_slop,
            moved: false,
            active: false,
        }
    }

    pub(crate) fn arm(&mut self, sample: PointerSample, now_ms: f64) {
        if sample.kind != PointerKind::Touch {
            return;
        }
        self.start = [sample.client_x, sample.client_y];
        self.start_ms = now_ms;
        self.moved = false;
        self.active = true;
    }

    pub(crate) fn update(&mut self, sample: PointerSample) {
        if !self.active || self.moved {
            return;
        }
        let dx = sample.client_x - self.start[0];
        let dy = sample.client_y - self.start[1];
        if dx * dx + dy * dy > self.max_slop * self.max_slop {
            self.moved = true;
        }
    }

    /// Ends the gesture and returns where the tap landed, if it was one.
    pub(crate) fn finish(&mut self, now_ms: f64) -> Option<(f32, f32)> {
        if !self.active {
            return None;
        }
        self.active = false;
        let elapsed = (now_ms - self.start_ms).max(0.0);
        let is_tap = elapsed <= TAP_QUICK_MS || (!self.moved && elapsed <= TAP_MAX_DURATION_MS);
        is_tap.then_some((self.start[0], self.start[1]))
    }

    pub(crate) fn cancel(&mut self) {
        self.active = false;
        self.moved = false;
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn sample_from_event(event: &web_sys::Event) -> Option<PointerSample> {
    use wasm_bindgen::JsCast;

    if let Some(touch_event) = event.dyn_ref::<web_sys::TouchEvent>() {
        let touch = touch_event
            .touches()
            .get(0)
            .or_else(|| touch_event.changed_touches().get(0))?;
        return Some(PointerSample::touch(
            touch.client_x() as f32,
            touch.client_y() as f32,
        ));
    }
    let mouse = event.dyn_ref::<web_sys::MouseEvent>()?;
    Some(PointerSample::mouse(
        mouse.client_x() as f32,
        mouse.client_y() as f32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_still_touch_is_a_tap() {
        let mut tap = TapGesture::new();
        tap.arm(PointerSample::touch(10.0, 20.0), 1000.0);
        tap.update(PointerSample::touch(12.0, 21.0));
        assert_eq!(tap.finish(1200.0), Some((10.0, 20.0)));
        assert_eq!(tap.finish(1201.0), None);
    }

    #[test]
    fn drags_and_long_presses_are_not_taps() {
        let mut tap = TapGesture::new();
        tap.arm(PointerSample::touch(0.0, 0.0), 0.0);
        tap.update(PointerSample::touch(30.0, 0.0));
        assert_eq!(tap.finish(200.0), None);

        tap.arm(PointerSample::touch(0.0, 0.0), 0.0);
        assert_eq!(tap.finish(600.0), None);
    }

    #[test]
    fn quick_flick_still_counts() {
        let mut tap = TapGesture::with_slop(2.0);
        tap.arm(PointerSample::touch(5.0, 5.0), 50.0);
        tap.update(PointerSample::touch(9.0, 5.0));
        assert!(tap.finish(100.0).is_some());
    }

    #[test]
    fn cancel_disarms() {
        let mut tap = TapGesture::new();
        tap.arm(PointerSample::touch(1.0, 1.0), 0.0);
        tap.cancel();
        assert_eq!(tap.finish(10.0), None);
    }

    #[test]
    fn mouse_samples_never_arm() {
        let mut tap = TapGesture::new();
        tap.arm(PointerSample::mouse(1.0, 1.0), 0.0);
        assert_eq!(tap.finish(10.0), None);
    }
}
