//! Content fallback rules shared by every input adapter
//!
//! The unified model only carries text and inline binary data. Anything
//! else a client sends (remote images, file references, content kinds added
//! after this gateway was written) is turned into a text part holding the
//! JSON of the original, so the model still sees it and nothing is lost.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::Value;

use crate::types::Part;

/// Text part describing content the model cannot receive natively
pub fn fallback_part<T: Serialize + ?Sized>(original: &T) -> Part {
    let text = serde_json::to_string(original).unwrap_or_else(|_| "{}".to_owned());
    Part::Text { value: text }
}

/// Binary part from base64 data, or a fallback when the data does not decode
pub fn base64_part<T: Serialize + ?Sized>(mime_type: &str, data: &str, original: &T) -> Part {
    match STANDARD.decode(data.trim()) {
        Ok(bytes) => Part::Data {
            mime_type: mime_type.to_owned(),
            bytes,
        },
        Err(e) => {
            tracing::debug!(error = %e, mime_type, "inline data is not valid base64, passing as text");
            fallback_part(original)
        }
    }
}

/// Part for an image URL: `data:` URIs become binary, remote URLs a fallback
pub fn image_url_part<T: Serialize + ?Sized>(url: &str, original: &T) -> Part {
    match parse_data_uri(url) {
        Some((mime_type, data)) => base64_part(mime_type, data, original),
        None => fallback_part(original),
    }
}

/// Split a base64 `data:` URI into media type and payload
pub fn parse_data_uri(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    let mime_type = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    Some((mime_type, data))
}

/// Encode binary data as a `data:` URI
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Tool output as carried in a `ToolResult` part
///
/// Plain strings are kept verbatim; structured output is serialized.
pub fn tool_output_text(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
