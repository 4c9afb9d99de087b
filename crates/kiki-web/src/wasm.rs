#![forbid(unsafe_code)]

use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use kiki_content::{Fetch, FetchError, FetchResponse};
use kiki_core::clock::SharedClock;
use kiki_core::event::{Event, KeyCode, KeyEvent, TouchEvent};
use kiki_runtime::program::Model;
use kiki_runtime::state_persistence::{
    MemoryStorage, StateStore, StorageBackend, StorageError, StorageResult,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::app::{Action, App, AppDeps, Msg, UnknownAction};
use crate::config::AppConfig;
use crate::kiki::Kiki;
use crate::step_program::StepProgram;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// `window.localStorage` as a storage backend.
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// `None` when the page has no window or storage is blocked.
    #[must_use]
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

fn storage_error(err: &JsValue) -> StorageError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(e) if e.name() == "QuotaExceededError" => StorageError::QuotaExceeded(e.message()),
        Some(e) => StorageError::Unavailable(format!("{}: {}", e.name(), e.message())),
        None => StorageError::Unavailable(format!("{err:?}")),
    }
}

impl StorageBackend for LocalStorage {
    fn name(&self) -> &str {
        "LocalStorage"
    }

    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage.get_item(key).map_err(|e| storage_error(&e))
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| storage_error(&e))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.storage.remove_item(key).map_err(|e| storage_error(&e))
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Content fetches through `window.fetch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserFetch;

fn fetch_error(path: &str, err: &JsValue) -> FetchError {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .unwrap_or_else(|| format!("{err:?}"));
    FetchError::new(path, message)
}

impl Fetch for BrowserFetch {
    fn fetch(&self, path: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        let path = path.to_owned();
        async move {
            let window = web_sys::window().ok_or_else(|| FetchError::new(&path, "no window"))?;
            let response = JsFuture::from(window.fetch_with_str(&path))
                .await
                .map_err(|e| fetch_error(&path, &e))?;
            let response: web_sys::Response =
                response.dyn_into().map_err(|e| fetch_error(&path, &e))?;
            let status = response.status();
            let text = response.text().map_err(|e| fetch_error(&path, &e))?;
            let body = JsFuture::from(text)
                .await
                .map_err(|e| fetch_error(&path, &e))?
                .as_string()
                .unwrap_or_default();
            Ok(FetchResponse { status, body })
        }
        .boxed_local()
    }
}

// ---------------------------------------------------------------------------
// App surface
// ---------------------------------------------------------------------------

/// The app as a page script sees it.
///
/// The script forwards DOM notifications, calls `step` from a
/// `requestAnimationFrame` loop after `advanceTime`, and redraws from the
/// JSON returned by `page` whenever `step` reports a render.
#[wasm_bindgen]
pub struct KikiApp {
    program: StepProgram<App>,
    store: Rc<StateStore>,
    destroyed: bool,
}

fn parse_options(options: &JsValue) -> Result<AppConfig, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(AppConfig::default());
    }
    let raw: String = js_sys::JSON::stringify(options)?.into();
    AppConfig::from_json(&raw).map_err(|e| JsValue::from_str(&format!("invalid options: {e}")))
}

fn open_storage() -> Box<dyn StorageBackend> {
    match LocalStorage::open() {
        Some(local) if local.is_available() => Box::new(local),
        _ => {
            tracing::warn!("localStorage unavailable; progress lasts for this page only");
            Box::new(MemoryStorage::new())
        }
    }
}

fn mount_exists(selector: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector(selector).ok().flatten())
        .is_some()
}

fn initial_fragment() -> String {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

#[wasm_bindgen]
impl KikiApp {
    /// Build the app from an optional options object and dispatch the
    /// current fragment.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<KikiApp, JsValue> {
        let config = parse_options(&options)?;
        let store = Rc::new(StateStore::load(open_storage(), config.storage_key.clone()));
        let clock = SharedClock::new();
        let kiki = Rc::new(Kiki::new(clock.clone()));
        let deps = AppDeps::new(Rc::clone(&store), Rc::new(BrowserFetch))
            .with_kiki(kiki)
            .with_mounted(mount_exists(&config.mount_selector));
        let saver = Rc::clone(&store);
        let mut program = StepProgram::with_clock(App::new(config, deps), clock)
            .with_save_hook(move || {
                saver.save();
            });
        program.init(&initial_fragment());
        Ok(Self {
            program,
            store,
            destroyed: false,
        })
    }

    /// `hashchange`. Fragments the app assigned itself are already applied.
    #[wasm_bindgen(js_name = hashChange)]
    pub fn hash_change(&mut self, fragment: String) {
        if self.destroyed || fragment == self.program.location().fragment() {
            return;
        }
        self.program.push_event(Event::hash_change(fragment));
    }

    /// `keydown`, with the DOM `KeyboardEvent.key` value.
    pub fn key(&mut self, key: &str) {
        if !self.destroyed {
            let code = KeyCode::from_dom_key(key);
            self.program.push_event(Event::Key(KeyEvent::new(code)));
        }
    }

    #[wasm_bindgen(js_name = touchStart)]
    pub fn touch_start(&mut self, screen_x: f64) {
        if !self.destroyed {
            self.program.push_event(Event::Touch(TouchEvent::start(screen_x)));
        }
    }

    #[wasm_bindgen(js_name = touchEnd)]
    pub fn touch_end(&mut self, screen_x: f64) {
        if !self.destroyed {
            self.program.push_event(Event::Touch(TouchEvent::end(screen_x)));
        }
    }

    /// A click on a control carrying a `data-action` value.
    pub fn click(&mut self, action: &str) -> Result<(), JsValue> {
        if self.destroyed {
            return Ok(());
        }
        let action: Action = action
            .parse()
            .map_err(|e: UnknownAction| JsValue::from_str(&e.to_string()))?;
        self.program.send(Msg::Action(action));
        Ok(())
    }

    /// `visibilitychange`; `hidden` is `document.hidden`.
    pub fn visibility(&mut self, hidden: bool) {
        if !self.destroyed {
            self.program.push_event(Event::Visibility(hidden));
        }
    }

    /// `beforeunload`. Saves synchronously.
    pub fn unload(&mut self) {
        if !self.destroyed {
            self.program.push_event(Event::Unload);
            self.program.step();
        }
    }

    /// An `error` event nobody handled.
    pub fn uncaught(&mut self, message: String) {
        if !self.destroyed {
            self.program.push_event(Event::Uncaught(message));
        }
    }

    /// Advance the app clock by `ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, ms: f64) {
        self.program.advance_time_ms(ms);
    }

    /// Run one step and apply navigations to `location.hash`. Returns whether
    /// the page changed.
    pub fn step(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let result = self.program.step();
        let navigations = self.program.take_outputs().navigations;
        if let Some(location) = web_sys::window().map(|w| w.location()) {
            for fragment in navigations {
                if let Err(err) = location.set_hash(&fragment) {
                    tracing::warn!(?err, %fragment, "could not assign location hash");
                }
            }
        }
        result.rendered
    }

    /// The current frame as JSON.
    pub fn page(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.program.model().view())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Explicit teardown for JS callers. Flushes state; later calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.store.save();
    }
}
