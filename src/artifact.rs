//! Persisted artifacts.
//!
//! `build` writes two files per program: `<stem>.bft`, the canonical
//! rendering as plain text, and `<stem>.bfo`, the same text compressed with
//! zstd, which is what `run` reloads. The codec is opaque to
//! the rest of the crate: only [`compress`] and [`decompress`] know about it.

use std::path::Path;

use log::debug;

use crate::chain::{reconstruct, Chain};
use crate::core::error::CompileResult;

/// Default zstd compression level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Extension of the friendly text rendering.
pub const TEXT_EXTENSION: &str = "bft";

/// Extension of the compressed canonical artifact.
pub const COMPRESSED_EXTENSION: &str = "bfo";

pub fn compress(bytes: &[u8]) -> CompileResult<Vec<u8>> {
    Ok(zstd::encode_all(bytes, DEFAULT_COMPRESSION_LEVEL)?)
}

pub fn decompress(bytes: &[u8]) -> CompileResult<Vec<u8>> {
    Ok(zstd::decode_all(bytes)?)
}

/// Compressed canonical rendering of `chain`.
pub fn encode(chain: &Chain) -> CompileResult<Vec<u8>> {
    let text = chain.to_string();
    let compressed = compress(text.as_bytes())?;
    debug!(
        "Encoded artifact: {} bytes of canonical text, {} compressed",
        text.len(),
        compressed.len()
    );
    Ok(compressed)
}

/// Inverse of [`encode`].
pub fn decode(bytes: &[u8]) -> CompileResult<Chain> {
    let text = String::from_utf8(decompress(bytes)?)?;
    reconstruct(&text)
}

/// True when `path` names a compressed artifact (extension compared case-insensitively).
pub fn is_compressed_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(COMPRESSED_EXTENSION))
}
