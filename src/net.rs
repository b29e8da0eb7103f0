//! Backend calls of the ad-counter variant.
//!
//! Both calls are fire-and-forget: no retry, failures are only logged, and
//! the game state never waits on them.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NetError {
    #[error("no window object")]
    NoWindow,
    #[error("request failed: {0}")]
    Js(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("response body is not text")]
    Body,
    #[error("malformed user info: {0}")]
    Decode(String),
}

/// Whatever `/api/user-info` tells us about the player. Unknown fields are
/// ignored and every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: Option<String>,
    pub username: Option<String>,
}

impl UserInfo {
    pub fn display_name(&self) -> Option<&str> {
        self.username.as_deref().or(self.id.as_deref())
    }
}

pub fn parse_user_info(body: &str) -> Result<UserInfo, NetError> {
    serde_json::from_str(body).map_err(|e| NetError::Decode(e.to_string()))
}

/// JSON body of the ad-count report.
pub fn ad_count_body(count: u64) -> String {
    serde_json::json!({ "adCount": count }).to_string()
}

/// Sink for `Effect::ReportAdCount`.
pub trait Reporter {
    fn report_ad_count(&self, url: &str, count: u64);
}

/// Used when the variant has no backend or on native builds.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report_ad_count(&self, _url: &str, _count: u64) {}
}

#[cfg(target_arch = "wasm32")]
pub struct FetchReporter;

#[cfg(target_arch = "wasm32")]
impl Reporter for FetchReporter {
    fn report_ad_count(&self, url: &str, count: u64) {
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            match post_json(&url, &ad_count_body(count)).await {
                Ok(_) => crate::log::info("Ad count updated"),
                Err(e) => crate::log::error(&format!("Error updating ad count: {e}")),
            }
        });
    }
}

/// GET the user info and hand it to `on_loaded`. Errors are logged and the
/// callback is never called.
#[cfg(target_arch = "wasm32")]
pub fn fetch_user_info(url: &str, on_loaded: impl FnOnce(UserInfo) + 'static) {
    let url = url.to_string();
    wasm_bindgen_futures::spawn_local(async move {
        let result = match fetch_text(&url, None).await {
            Ok(body) => parse_user_info(&body),
            Err(e) => Err(e),
        };
        match result {
            Ok(info) => on_loaded(info),
            Err(e) => crate::log::error(&format!("Error fetching user info: {e}")),
        }
    });
}

#[cfg(target_arch = "wasm32")]
fn js_err(e: wasm_bindgen::JsValue) -> NetError {
    NetError::Js(format!("{e:?}"))
}

#[cfg(target_arch = "wasm32")]
async fn post_json(url: &str, body: &str) -> Result<String, NetError> {
    let headers = web_sys::Headers::new().map_err(js_err)?;
    headers
        .set("Content-Type", "application/json")
        .map_err(js_err)?;
    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&wasm_bindgen::JsValue::from_str(body));
    fetch_text(url, Some(&init)).await
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str, init: Option<&web_sys::RequestInit>) -> Result<String, NetError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or(NetError::NoWindow)?;
    let promise: js_sys::Promise = match init {
        Some(init) => window.fetch_with_str_and_init(url, init),
        None => window.fetch_with_str(url),
    };
    let response: web_sys::Response = JsFuture::from(promise)
        .await
        .map_err(js_err)?
        .dyn_into()
        .map_err(js_err)?;
    if !response.ok() {
        return Err(NetError::Status(response.status()));
    }
    let text = JsFuture::from(response.text().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    text.as_string().ok_or(NetError::Body)
}
