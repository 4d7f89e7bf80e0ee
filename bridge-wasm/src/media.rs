//! `MediaElement` over a DOM `<audio>` element.
//!
//! Element notifications are forwarded to the single installed handler. The
//! promise returned by `play()` is awaited on the browser's microtask queue
//! and its outcome reported through the settle callback; a synchronous throw
//! is reported immediately.

use crate::error::{js_message, WasmError, WasmResult};
use bridge_traits::platform::{MediaEventHandler, PlayCallback};
use bridge_traits::{BridgeError, MediaElement, MediaElementEvent, MediaErrorInfo};
use std::cell::RefCell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

struct Listener {
    event: &'static str,
    callback: Closure<dyn FnMut()>,
}

/// Browser media element adapter.
pub struct HtmlMediaElement {
    element: web_sys::HtmlMediaElement,
    listeners: RefCell<Vec<Listener>>,
}

impl HtmlMediaElement {
    /// Wrap an existing element, for example one already in the page.
    pub fn new(element: web_sys::HtmlMediaElement) -> Self {
        Self {
            element,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Create a detached `<audio>` element with `preload="auto"`.
    pub fn create_audio() -> WasmResult<Self> {
        let audio = web_sys::HtmlAudioElement::new()?;
        let element: web_sys::HtmlMediaElement = audio.unchecked_into();
        element.set_preload("auto");
        Ok(Self::new(element))
    }

    /// Underlying DOM element.
    pub fn element(&self) -> &web_sys::HtmlMediaElement {
        &self.element
    }

    fn detach_listeners(&self) {
        for listener in self.listeners.borrow_mut().drain(..) {
            if let Err(err) = self.element.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            ) {
                tracing::warn!(event = listener.event, error = %js_message(&err), "failed to remove media listener");
            }
        }
    }
}

impl MediaElement for HtmlMediaElement {
    fn set_src(&self, src: &str) {
        self.element.set_src(src);
    }

    fn src(&self) -> String {
        self.element.src()
    }

    fn remove_src(&self) {
        if let Err(err) = self.element.remove_attribute("src") {
            tracing::warn!(error = %js_message(&err), "failed to remove media source");
        }
        self.element.load();
    }

    fn load(&self) {
        self.element.load();
    }

    fn play(&self, on_settled: PlayCallback) {
        match self.element.play() {
            Ok(promise) => spawn_local(async move {
                let outcome = JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| BridgeError::PlaybackRejected(js_message(&err)));
                on_settled(outcome);
            }),
            Err(err) => on_settled(Err(BridgeError::PlaybackRejected(js_message(&err)))),
        }
    }

    fn pause(&self) {
        if let Err(err) = self.element.pause() {
            tracing::warn!(error = %js_message(&err), "media element refused to pause");
        }
    }

    fn paused(&self) -> bool {
        self.element.paused()
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.element.set_playback_rate(rate);
    }

    fn set_volume(&self, volume: f64) {
        self.element.set_volume(volume);
    }

    fn set_loop(&self, looping: bool) {
        self.element.set_loop(looping);
    }

    fn error(&self) -> Option<MediaErrorInfo> {
        self.element.error().map(|error| MediaErrorInfo {
            message: Some(error.message()).filter(|message| !message.is_empty()),
            code: Some(i32::from(error.code())),
        })
    }

    fn set_event_handler(&self, handler: MediaEventHandler) {
        self.detach_listeners();

        let mut listeners = self.listeners.borrow_mut();
        for event in MediaElementEvent::ALL {
            let handler = handler.clone();
            let callback = Closure::<dyn FnMut()>::new(move || handler(event));
            match self
                .element
                .add_event_listener_with_callback(event.dom_name(), callback.as_ref().unchecked_ref())
            {
                Ok(()) => listeners.push(Listener {
                    event: event.dom_name(),
                    callback,
                }),
                Err(err) => {
                    let err = WasmError::from(err);
                    tracing::error!(event = event.dom_name(), error = %err, "failed to attach media listener");
                }
            }
        }
    }
}

impl Drop for HtmlMediaElement {
    fn drop(&mut self) {
        self.detach_listeners();
    }
}

impl std::fmt::Debug for HtmlMediaElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlMediaElement")
            .field("src", &self.element.src())
            .field("paused", &self.element.paused())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
