#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod input;
mod persisted;
mod styles;

#[cfg(target_arch = "wasm32")]
mod card_view;
#[cfg(target_arch = "wasm32")]
mod deck;
#[cfg(target_arch = "wasm32")]
mod frame_loop;
#[cfg(target_arch = "wasm32")]
mod masks;
#[cfg(target_arch = "wasm32")]
mod metadata;
#[cfg(target_arch = "wasm32")]
mod style_registry;

#[cfg(target_arch = "wasm32")]
fn main() {
    wasm_bindgen_futures::spawn_local(deck::run());
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("holocard runs in the browser; build it for wasm32 (trunk serve) or use holocard-cli");
}
