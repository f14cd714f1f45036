use holocard_core::EffectType;

pub(crate) const EFFECT_PREFERENCE_KEY: &str = "holocard.effect.v1";

pub(crate) fn load_effect_preference() -> EffectType {
    EffectType::from_preference(read_local(EFFECT_PREFERENCE_KEY).as_deref())
}

pub(crate) fn save_effect_preference(effect: EffectType) {
    write_local(EFFECT_PREFERENCE_KEY, effect.as_str());
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(target_arch = "wasm32")]
fn read_local(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

#[cfg(target_arch = "wasm32")]
fn write_local(key: &str, value: &str) {
    let Some(storage) = local_storage() else {
        gloo::console::warn!("preferences: localStorage unavailable");
        return;
    };
    if storage.set_item(key, value).is_err() {
        gloo::console::warn!("preferences: failed to store", key);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_local(_key: &str) -> Option<String> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
fn write_local(_key: &str, _value: &str) {}
