use holocard_core::pointer::{REST_BACKGROUND, REST_ROTATE};
use holocard_core::render::rest_transform;
use holocard_core::{
    CardRect, CardState, EffectType, FrameDriver, LayoutSnapshot, SpringVec,
};

fn card_rect() -> CardRect {
    CardRect::new(40.0, 60.0, 250.0, 350.0)
}

fn settle(card: &mut CardState) -> holocard_core::FrameOutcome {
    let mut frames = 0;
    loop {
        let outcome = card.step_frame();
        if !outcome.animating {
            return outcome;
        }
        frames += 1;
        assert!(frames < 20_000, "card never settled");
    }
}

#[test]
fn pointer_at_center_targets_neutral_pose() {
    let mut card = CardState::new(EffectType::Standard);
    card.activate();
    let rect = card_rect();
    let (cx, cy) = rect.center();
    assert!(card.pointer_move(rect, cx, cy));

    let springs = card.springs();
    assert_eq!(springs.rotate().target(), SpringVec::xy(0.0, 0.0));
    assert_eq!(springs.glare().target(), SpringVec::xyo(50.0, 50.0, 1.0));
    let band = EffectType::Standard.profile().background_band;
    assert_eq!(
        springs.background().target(),
        SpringVec::xy(band.midpoint(), band.midpoint())
    );
}

#[test]
fn pointer_at_top_left_tilts_top_away_and_left_toward() {
    let mut card = CardState::new(EffectType::Standard);
    card.activate();
    let rect = card_rect();
    assert!(card.pointer_move(rect, rect.left, rect.top));

    let rotate = card.springs().rotate().target();
    assert_eq!(rotate, SpringVec::xy(20.0, -17.0));
    assert!(rotate.x() > 0.0);
    assert!(rotate.y() < 0.0);
    assert_eq!(card.springs().glare().target(), SpringVec::xyo(0.0, 0.0, 1.0));
    assert_eq!(card.springs().background().target(), SpringVec::xy(35.0, 35.0));
}

#[test]
fn pop_then_unpop_restores_original_transform() {
    let mut card = CardState::new(EffectType::Galaxy);
    card.activate();
    let rect = card_rect();
    let original = LayoutSnapshot {
        left: "12px".into(),
        top: "8px".into(),
        z_index: String::new(),
        transform: rest_transform(),
    };

    let command = card
        .pop(rect, (1280.0, 720.0), original.clone())
        .expect("card pops");
    assert!(command.plays_flip);
    assert!(card.is_popped());
    assert!(card.unpop());
    assert!(!card.is_popped());

    let last = settle(&mut card);
    assert_eq!(last.restore, Some(original.clone()));
    assert_eq!(last.frame.transform, original.transform);
    assert!(!card.is_popped());
    assert!(!card.is_returning());
    assert!(card.is_active());
    assert!(card.original_layout().is_none());
}

#[test]
fn unpop_after_leaving_ends_inactive() {
    let mut card = CardState::new(EffectType::Standard);
    card.activate();
    card.pop(card_rect(), (800.0, 600.0), LayoutSnapshot::default());
    card.deactivate();
    card.unpop();
    settle(&mut card);
    assert!(!card.is_active());
}

#[test]
fn driver_goes_idle_once_every_card_settles() {
    let mut cards = vec![
        CardState::new(EffectType::Standard),
        CardState::new(EffectType::Premium),
    ];
    let mut driver = FrameDriver::new();
    let rect = card_rect();
    for (id, card) in cards.iter_mut().enumerate() {
        card.activate();
        if card.pointer_move(rect, rect.left + 10.0 * id as f32, rect.top) {
            driver.schedule(id);
        }
    }
    assert_eq!(driver.len(), 2);

    let mut frames = 0;
    while driver.step(|id| cards[id].step_frame().animating) {
        frames += 1;
        assert!(frames < 20_000);
    }
    assert!(driver.is_idle());
    for card in &cards {
        assert!(!card.needs_frames());
    }

    cards[0].deactivate();
    assert!(driver.schedule(0));
    while driver.step(|id| cards[id].step_frame().animating) {}
    assert_eq!(cards[0].springs().rotate().value(), REST_ROTATE);
    assert_eq!(cards[0].springs().background().value(), REST_BACKGROUND);
}

#[test]
fn public_springs_always_settle() {
    use holocard_core::{ConfigError, SetMode, Spring, SpringConfig};

    assert_eq!(
        SpringConfig::new(0.066, 0.25, 0.0),
        Err(ConfigError::Precision(0.0))
    );
    let mut spring = Spring::new(SpringVec::xy(0.0, 0.0), SpringConfig::INTERACT).expect("preset");
    assert!(spring.set_config(SpringConfig::new(0.066, 0.25, 0.01).expect("config")).is_ok());
    spring.set(SpringVec::xy(10.0, 10.0), SetMode::Soft);
    let mut ticks = 0;
    while spring.tick() {
        ticks += 1;
        assert!(ticks < 10_000, "spring never settled");
    }
    assert_eq!(spring.value(), SpringVec::xy(10.0, 10.0));
}
