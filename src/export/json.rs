//! JSON exporter: the full structured result, pretty-printed.

use crate::result::RecognitionResult;
use tracing::warn;

pub fn to_json(result: &RecognitionResult) -> String {
    match serde_json::to_string_pretty(result) {
        Ok(mut body) => {
            body.push('\n');
            body
        }
        Err(e) => {
            warn!("JSON export failed: {}", e);
            format!("{}\n", serde_json::json!({ "error": e.to_string() }))
        }
    }
}
