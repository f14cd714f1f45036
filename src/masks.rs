use holocard_image_pipeline::{
    mask_data_url, rgba_from_raw, RgbaImage, SegmentConfig, SegmentError, Segmenter,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::metadata::js_err;

#[derive(Clone, Debug)]
pub(crate) struct CardMasks {
    pub character_url: String,
    pub background_url: String,
}

pub(crate) async fn build_masks(image_url: &str) -> Result<CardMasks, SegmentError> {
    let image = load_image(image_url).await?;
    let pixels = read_pixels(&image)?;
    let segmenter = Segmenter::new(SegmentConfig::default())?;
    let masks = segmenter.segment(&pixels)?;
    Ok(CardMasks {
        character_url: mask_data_url(&masks.character)?,
        background_url: mask_data_url(&masks.background)?,
    })
}

async fn load_image(url: &str) -> Result<HtmlImageElement, SegmentError> {
    let img = HtmlImageElement::new().map_err(|err| SegmentError::ImageLoad(js_err(err)))?;
    img.set_cross_origin(Some("anonymous"));
    let img_for_promise = img.clone();
    let url_owned = url.to_string();
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let onload = Closure::once(move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let onerror = Closure::once(move || {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("image_load_failed"));
        });
        img_for_promise.set_onload(Some(onload.as_ref().unchecked_ref()));
        img_for_promise.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        img_for_promise.set_src(&url_owned);
        onload.forget();
        onerror.forget();
    });
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|err| SegmentError::ImageLoad(format!("{url}: {}", js_err(err))))?;
    Ok(img)
}

/// Reads the image at its natural size so masks line up pixel for pixel
/// with the art they stencil.
fn read_pixels(image: &HtmlImageElement) -> Result<RgbaImage, SegmentError> {
    let load_err = |err: JsValue| SegmentError::ImageLoad(js_err(err));
    let width = image.natural_width();
    let height = image.natural_height();
    if width == 0 || height == 0 {
        return Err(SegmentError::ImageLoad("image has no pixels".into()));
    }

    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| SegmentError::ImageLoad("missing document".into()))?;
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(load_err)?
        .dyn_into()
        .map_err(|_| SegmentError::ImageLoad("canvas element".into()))?;
    canvas.set_width(width);
    canvas.set_height(height);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(load_err)?
        .ok_or_else(|| SegmentError::ImageLoad("2d context unavailable".into()))?
        .dyn_into()
        .map_err(|_| SegmentError::ImageLoad("2d context".into()))?;
    ctx.draw_image_with_html_image_element(image, 0.0, 0.0)
        .map_err(load_err)?;
    // Fails on a tainted canvas when the host sends no CORS headers.
    let data = ctx
        .get_image_data(0.0, 0.0, width as f64, height as f64)
        .map_err(load_err)?;
    rgba_from_raw(data.width(), data.height(), data.data().0)
}
