use crate::message::MessageRecord;

/// Appended to lines cut down to the length limit
pub const TRUNCATION_MARKER: &str = " ...";

/// Renders message records as bounded single lines for the log and the
/// transmitter.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    max_len: usize,
}

impl LineFormatter {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// `[<timestamp>] <sender>: <text>` on a single line, at most `max_len`
    /// characters long.
    pub fn format(&self, record: &MessageRecord) -> String {
        let sender = record.sender().unwrap_or_else(|| "Unknown".to_string());
        let text = record.text().unwrap_or_else(|| record.raw().to_string());
        let ts = record.timestamp().unwrap_or_default();

        let line = format!("[{}] {}: {}", ts, sender, text);
        let line = collapse_newlines(&line);
        truncate(line.trim(), self.max_len)
    }
}

fn collapse_newlines(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Cut `line` to at most `max_len` characters, preferring a word boundary,
/// and mark the cut. Lines that already fit are returned unchanged.
pub fn truncate(line: &str, max_len: usize) -> String {
    if line.chars().count() <= max_len {
        return line.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_len <= marker_len {
        return TRUNCATION_MARKER.chars().take(max_len).collect();
    }

    // Byte offset just past the last character that still leaves room for the marker
    let budget = max_len - marker_len;
    let end = line
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(line.len());

    let head = &line[..end];
    // Break at whitespace unless the cut already lands on a word boundary
    let head = if line[end..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(pos) if pos > 0 => &head[..pos],
            _ => head,
        }
    };

    format!("{}{}", head.trim_end(), TRUNCATION_MARKER)
}
