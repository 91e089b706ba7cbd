//! Sheet and file naming

use std::collections::HashSet;

/// Maximum length of a sheet name, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Name of the overview sheet; reserved before any run sheet is named
pub const SUMMARY_SHEET: &str = "Summary";

const ILLEGAL_SHEET_CHARS: [char; 7] = ['\\', '/', '?', '*', '[', ']', ':'];
const MAX_FILE_STEM_LEN: usize = 50;
const FILE_SUFFIX: &str = "_run_history.xlsx";

/// Make `candidate` a legal sheet name
///
/// Removes characters spreadsheet applications reject, trims apostrophes and
/// whitespace at both ends and truncates to [`MAX_SHEET_NAME_LEN`]. A candidate
/// with nothing left becomes `"Run {index}"`.
pub fn sanitize_sheet_name(candidate: &str, index: usize) -> String {
    let cleaned: String = candidate
        .chars()
        .filter(|c| !ILLEGAL_SHEET_CHARS.contains(c) && !c.is_control())
        .collect();
    let trimmed = trim_name(&cleaned);
    if trimmed.is_empty() {
        return format!("Run {index}");
    }
    trim_name(&truncate_chars(trimmed, MAX_SHEET_NAME_LEN)).to_string()
}

/// Assigns unique sheet names within one report
///
/// Names are compared case-insensitively. [`SUMMARY_SHEET`] is taken from the
/// start.
#[derive(Debug)]
pub struct SheetNamer {
    taken: HashSet<String>,
}

impl Default for SheetNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetNamer {
    /// Create a namer with only the Summary sheet taken
    pub fn new() -> Self {
        let mut taken = HashSet::new();
        taken.insert(SUMMARY_SHEET.to_lowercase());
        Self { taken }
    }

    /// Claim `base`, or `base (n)` for the smallest free n ≥ 2
    ///
    /// `base` must already be sanitized. The base is shortened as needed so the
    /// suffixed name stays within [`MAX_SHEET_NAME_LEN`].
    pub fn assign(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_lowercase()) {
            return base.to_string();
        }

        let mut n: usize = 2;
        loop {
            let suffix = format!(" ({n})");
            let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            let stem = truncate_chars(base, room);
            let name = format!("{}{suffix}", stem.trim_end());
            if self.taken.insert(name.to_lowercase()) {
                return name;
            }
            n += 1;
        }
    }
}

/// Sanitize and deduplicate `candidates` in order
///
/// Candidate `i` (0-based) falls back to `"Run {i + 1}"` when nothing legal is
/// left of it.
pub fn unique_sheet_names<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut namer = SheetNamer::new();
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| namer.assign(&sanitize_sheet_name(candidate.as_ref(), i + 1)))
        .collect()
}

/// Suggested artifact file name for a flow
///
/// Every character that is not an ASCII letter or digit becomes `_`; the stem
/// is capped at 50 characters and defaults to `flow`.
pub fn report_file_name(flow_name: &str) -> String {
    let stem: String = flow_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_FILE_STEM_LEN)
        .collect();
    let stem = if stem.is_empty() { "flow".to_string() } else { stem };
    format!("{stem}{FILE_SUFFIX}")
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(|c: char| c == '\'' || c.is_whitespace())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
