//! Error conversion utilities for WASM.

use wasm_bindgen::prelude::*;

/// Convert an error into a JavaScript `Error` carrying its message.
pub fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    js_sys::Error::new(&format!("{:#}", err)).into()
}

/// Macro to convert Rust errors to JavaScript `Error` values.
#[macro_export]
macro_rules! map_err_to_js {
    ($expr:expr) => {
        $expr.map_err($crate::to_js_error)
    };
}
