use mutator_document::get_document_seed;
use mutator_editor::{
    EditSession, EditableSurface, EditorConfig, MemorySurface, MutationBatch, ReconcileOutcome,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
extern "C" {
    /// Host object with a `textContent(id)` method that reads the element
    /// keyed by `data-id` from the live editable root
    pub type TextSource;

    #[wasm_bindgen(method, js_name = textContent)]
    fn text_content(this: &TextSource, id: &str) -> Option<String>;
}

/// Surface handed to the session while reconciling. Element and caret queries
/// go to the painted mirror; text is only ever read from the live element.
struct HostSurface<'a> {
    painted: &'a mut MemorySurface,
    live: Option<&'a TextSource>,
}

impl EditableSurface for HostSurface<'_> {
    fn has_element(&self, id: &str) -> bool {
        self.painted.has_element(id)
    }

    fn text_content(&self, id: &str) -> Option<String> {
        self.live.and_then(|source| source.text_content(id))
    }

    fn place_caret(&mut self, id: &str, offset: usize) -> bool {
        self.painted.place_caret(id, offset)
    }
}

/// Edit session driven from the browser.
///
/// The host applies the patches returned by `render` to its editable element
/// and forwards every batch of mutation records to `handleMutations`. A mirror
/// of what was painted is kept here so focus is only requested for elements
/// the host has already committed. Records without a text snapshot are read
/// back through the `TextSource` given to `setTextSource`; without one they
/// stay unclassified.
#[wasm_bindgen]
pub struct WasmEditor {
    session: EditSession,
    painted: MemorySurface,
    text_source: Option<TextSource>,
}

#[wasm_bindgen]
impl WasmEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(document_json: &str, config_json: Option<String>) -> Result<WasmEditor, JsValue> {
        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json).map_err(to_js_error)?,
            None => EditorConfig::default(),
        };
        let session = EditSession::from_json(document_json, config).map_err(to_js_error)?;

        Ok(WasmEditor {
            session,
            painted: MemorySurface::new(),
            text_source: None,
        })
    }

    /// Attach the reader used for records that carry no text
    #[wasm_bindgen(js_name = setTextSource)]
    pub fn set_text_source(&mut self, source: TextSource) {
        self.text_source = Some(source);
    }

    /// Reconcile one batch of mutation records; returns the outcome as JSON
    #[wasm_bindgen(js_name = handleMutations)]
    pub fn handle_mutations(&mut self, batch_json: &str) -> Result<String, JsValue> {
        let batch = MutationBatch::from_json(batch_json).map_err(to_js_error)?;
        let surface = HostSurface {
            painted: &mut self.painted,
            live: self.text_source.as_ref(),
        };
        let outcome = self.session.handle_batch(&batch, &surface);

        // The host lost the run; keep the mirror in step until it is repainted
        if let ReconcileOutcome::RolledBack { focus_target } = &outcome {
            self.painted.delete(focus_target);
        }
        to_json(&outcome)
    }

    /// Render the document; returns `{ version, vdom, patches }` as JSON
    pub fn render(&mut self) -> Result<String, JsValue> {
        let result = self.session.render();
        self.painted.paint(&result.patches).map_err(to_js_error)?;
        to_json(&result)
    }

    /// Call once the host committed the last render. Returns the focus
    /// request as JSON, or nothing if no element needs focus yet.
    #[wasm_bindgen(js_name = afterPaint)]
    pub fn after_paint(&mut self) -> Result<Option<String>, JsValue> {
        match self.session.after_paint(&mut self.painted) {
            Some(request) => to_json(&request).map(Some),
            None => Ok(None),
        }
    }

    /// The document as persisted RichNode JSON
    pub fn save(&self) -> Result<String, JsValue> {
        self.session.to_json().map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn version(&self) -> u64 {
        self.session.version()
    }
}

/// Id seed for a named document
#[wasm_bindgen(js_name = getDocumentSeed)]
pub fn get_document_seed_js(name: &str) -> String {
    get_document_seed(name)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(to_js_error)
}

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}
