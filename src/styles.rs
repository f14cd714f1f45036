//! Rule text for the stylesheets a card injects at runtime. Each rule is
//! scoped to one card through its `data-card-key` attribute.

pub(crate) const CARD_KEY_ATTR: &str = "data-card-key";

pub(crate) const MASKED_LAYERS: [&str; 5] = [
    ".holo-overlay",
    ".holo-reflection",
    ".holo-diffraction",
    ".holo-glow",
    ".holo-sparkle",
];

pub(crate) fn card_selector(key: u32) -> String {
    format!("[{CARD_KEY_ATTR}=\"{key}\"]")
}

pub(crate) fn style_id(key: u32, name: &str) -> String {
    format!("holocard-{key}-{name}")
}

/// Silences the pseudo-element layers while an effect switch settles.
pub(crate) fn reset_rules(key: u32) -> String {
    let card = card_selector(key);
    format!(
        "{card} .card-inner::before,\n{card} .card-inner::after {{\n  \
         animation: none !important;\n  opacity: 0 !important;\n  \
         background: none !important;\n  filter: none !important;\n  \
         content: \"\" !important;\n}}\n"
    )
}

/// Clears what the galaxy variant leaves behind on the shared layers.
pub(crate) fn galaxy_cleanup_rules(key: u32) -> String {
    let card = card_selector(key);
    format!(
        "{card} .card-inner::before {{\n  opacity: 0 !important;\n  \
         animation: none !important;\n  background: none !important;\n  \
         filter: none !important;\n}}\n\
         {card} .holo-sparkle {{\n  color: initial !important;\n  \
         filter: none !important;\n}}\n\
         {card} .holo-overlay {{\n  background: initial !important;\n}}\n"
    )
}

pub(crate) fn galaxy_animation_rules(key: u32) -> String {
    let card = card_selector(key);
    format!(
        "{card}.effect-galaxy.active .card-inner::before {{\n  opacity: 1;\n  \
         animation: galaxy-rotate 14s linear infinite;\n}}\n"
    )
}

/// Stencils the holographic layers with the background mask and lays the
/// character cut-out over them.
pub(crate) fn mask_rules(key: u32, background_url: &str, character_url: &str) -> String {
    let card = card_selector(key);
    let layers = MASKED_LAYERS
        .iter()
        .map(|layer| format!("{card}.masked {layer}"))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "{layers} {{\n  -webkit-mask-image: url(\"{background_url}\");\n  \
         mask-image: url(\"{background_url}\");\n  \
         -webkit-mask-size: 100% 100%;\n  mask-size: 100% 100%;\n}}\n\
         {card}.masked .holo-character {{\n  display: block;\n  \
         -webkit-mask-image: url(\"{character_url}\");\n  \
         mask-image: url(\"{character_url}\");\n  \
         -webkit-mask-size: 100% 100%;\n  mask-size: 100% 100%;\n}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_scoped_to_one_card() {
        for css in [
            reset_rules(7),
            galaxy_cleanup_rules(7),
            galaxy_animation_rules(7),
            mask_rules(7, "data:a", "data:b"),
        ] {
            assert!(css.contains("[data-card-key=\"7\"]"));
            assert!(!css.contains("[data-card-key=\"8\"]"));
        }
    }

    #[test]
    fn mask_rules_cover_every_holo_layer() {
        let css = mask_rules(1, "data:image/png;base64,BG", "data:image/png;base64,CH");
        for layer in MASKED_LAYERS {
            assert!(css.contains(&format!("[data-card-key=\"1\"].masked {layer}")));
        }
        assert!(css.contains("mask-image: url(\"data:image/png;base64,BG\")"));
        assert!(css.contains(".holo-character"));
        assert!(css.contains("url(\"data:image/png;base64,CH\")"));
    }

    #[test]
    fn ids_are_stable() {
        assert_eq!(style_id(3, "masks"), "holocard-3-masks");
        assert_eq!(card_selector(3), "[data-card-key=\"3\"]");
    }
}
