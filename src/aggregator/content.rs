//! Rendering of fetched step payloads into cell text

/// Appended to content cut at the cell length limit
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Cell text when a step's inputs could not be fetched
pub const INPUTS_ERROR_MARKER: &str = "[Error fetching inputs]";

/// Cell text when a step's outputs could not be fetched
pub const OUTPUTS_ERROR_MARKER: &str = "[Error fetching outputs]";

/// Which payload of a step is being fetched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContentField {
    Inputs,
    Outputs,
}

impl ContentField {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ContentField::Inputs => "inputs",
            ContentField::Outputs => "outputs",
        }
    }

    pub(crate) fn error_marker(&self) -> &'static str {
        match self {
            ContentField::Inputs => INPUTS_ERROR_MARKER,
            ContentField::Outputs => OUTPUTS_ERROR_MARKER,
        }
    }
}

/// Serialize a payload to single-line JSON capped at `max_len` UTF-16 code units
pub fn render_content(value: &serde_json::Value, max_len: usize) -> String {
    cap_cell_text(value.to_string(), max_len)
}

/// Cap `text` at `max_len` UTF-16 code units, the unit spreadsheet cell limits use
///
/// Text that fits is returned unchanged. Longer text keeps the longest prefix of
/// at most `max_len - len(TRUNCATION_MARKER)` units followed by the marker. The
/// cut falls on a character boundary, so a surrogate pair is never split and the
/// result is `max_len` units long, or one less when a pair straddles the cut.
pub fn cap_cell_text(text: String, max_len: usize) -> String {
    if text.encode_utf16().count() <= max_len {
        return text;
    }

    let keep = max_len.saturating_sub(TRUNCATION_MARKER.encode_utf16().count());
    let mut units = 0;
    let mut cut = text.len();
    for (byte_index, c) in text.char_indices() {
        if units + c.len_utf16() > keep {
            cut = byte_index;
            break;
        }
        units += c.len_utf16();
    }

    let mut capped = String::with_capacity(cut + TRUNCATION_MARKER.len());
    capped.push_str(&text[..cut]);
    capped.push_str(TRUNCATION_MARKER);
    capped
}
