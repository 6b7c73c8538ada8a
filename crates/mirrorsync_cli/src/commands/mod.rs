//! CLI command implementations.

pub mod dump;
pub mod encode;
pub mod verify;

use mirrorsync_codec::{from_cbor, Value};
use std::path::Path;

/// Reads a file and decodes it as one canonical message.
pub fn read_message(path: &Path) -> Result<(Vec<u8>, Value), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("message file not found: {}", path.display()).into());
    }
    let bytes = std::fs::read(path)?;
    let value = from_cbor(&bytes)?;
    Ok((bytes, value))
}
