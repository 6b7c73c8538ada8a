//! Encode command implementation.

use mirrorsync_codec::{from_json, to_canonical_cbor};
use std::path::Path;
use tracing::debug;

/// Runs the encode command.
pub fn run(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(input)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let bytes = to_canonical_cbor(&from_json(&json))?;
    std::fs::write(output, &bytes)?;
    debug!(input = %input.display(), output = %output.display(), bytes = bytes.len(), "encoded message");
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
