//! Frequency extractor
//!
//! Scans a received chunk for the literal `Freq` label and parses the
//! numeric field that follows it. The payload is unstructured HTML; the
//! label offset and window size are fixed properties of the measurement
//! page, not a general parser.

/// Literal label preceding the numeric field (case-sensitive)
pub const FREQ_LABEL: &[u8] = b"Freq";

/// Offset from the label start to the numeric window
pub const FIELD_OFFSET: usize = 11;

/// Size of the scratch window copied for parsing
pub const SCRATCH_SIZE: usize = 30;

/// Outcome of scanning one chunk
///
/// "Label not present" is an expected per-chunk outcome, not an error;
/// the caller simply tries again on the next chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtractOutcome {
    /// The label was found and a value parsed from the window
    Found(f32),
    /// The label (or a parseable value) was not in this chunk
    NotFound,
}

/// Errors from the extractor's input validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtractError {
    /// The chunk had zero length
    EmptyChunk,
}

/// Scan `chunk` for the frequency label and parse the trailing value
///
/// Only the first match in a chunk is considered. The scan bound is
/// clamped so the fixed-size window never indexes past the chunk; a chunk
/// too short to hold a full window yields `NotFound`. A label that spans
/// a chunk boundary is not detected (known limitation of per-chunk
/// scanning).
pub fn extract_frequency(chunk: &[u8]) -> Result<ExtractOutcome, ExtractError> {
    if chunk.is_empty() {
        return Err(ExtractError::EmptyChunk);
    }

    // Clamped to zero for short chunks; the unclamped subtraction could
    // wrap and walk the whole address space
    let scan_limit = chunk.len().saturating_sub(FIELD_OFFSET + SCRATCH_SIZE);

    for i in 0..scan_limit {
        if chunk[i..].starts_with(FREQ_LABEL) {
            let window = &chunk[i + FIELD_OFFSET..i + FIELD_OFFSET + SCRATCH_SIZE];
            return Ok(match parse_leading_float(window) {
                Some(value) => ExtractOutcome::Found(value),
                None => ExtractOutcome::NotFound,
            });
        }
    }

    Ok(ExtractOutcome::NotFound)
}

/// Parse the first float token in the window, skipping leading whitespace
fn parse_leading_float(window: &[u8]) -> Option<f32> {
    // The payload is ASCII in practice; on a stray multi-byte sequence we
    // keep the valid prefix
    let text = match core::str::from_utf8(window) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&window[..e.valid_up_to()]).unwrap_or(""),
    };

    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(text.len());

    text[..end].parse::<f32>().ok()
}
