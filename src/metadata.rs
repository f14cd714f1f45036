use holocard_core::metadata::{parse_servant, servant_url};
use holocard_core::CardRecord;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

#[derive(Debug, thiserror::Error)]
pub(crate) enum MetadataError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("metadata server answered HTTP {status} for servant {id}")]
    Status { id: u32, status: u16 },
    #[error("unexpected servant payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no servants found")]
    Empty,
}

impl From<JsValue> for MetadataError {
    fn from(value: JsValue) -> Self {
        MetadataError::Request(js_err(value))
    }
}

pub(crate) fn js_err(error: JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return value;
        }
    }
    "js error".to_string()
}

async fn fetch_text(url: &str) -> Result<(u16, String), MetadataError> {
    let window = web_sys::window().ok_or_else(|| MetadataError::Request("missing window".into()))?;
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_mode(RequestMode::Cors);
    let request = Request::new_with_str_and_init(url, &init)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    let status = response.status();
    if !response.ok() {
        return Ok((status, String::new()));
    }
    let text = JsFuture::from(response.text()?).await?;
    let text = text
        .as_string()
        .ok_or_else(|| MetadataError::Request("response body is not text".into()))?;
    Ok((status, text))
}

pub(crate) async fn fetch_servant(id: u32) -> Result<CardRecord, MetadataError> {
    let (status, body) = fetch_text(&servant_url(id)).await?;
    if !(200..300).contains(&status) {
        return Err(MetadataError::Status { id, status });
    }
    Ok(parse_servant(&body)?)
}

/// Fetches every servant in order. Individual failures are logged and
/// skipped; only an empty result is an error.
pub(crate) async fn fetch_servants(ids: &[u32]) -> Result<Vec<CardRecord>, MetadataError> {
    let mut records = Vec::with_capacity(ids.len());
    let mut last_error = None;
    for &id in ids {
        match fetch_servant(id).await {
            Ok(record) => records.push(record),
            Err(err) => {
                gloo::console::error!("metadata: servant", id, err.to_string());
                last_error = Some(err);
            }
        }
    }
    if records.is_empty() {
        return Err(last_error.unwrap_or(MetadataError::Empty));
    }
    Ok(records)
}
