//! Response size limiting.
//!
//! Assistant output can be arbitrarily large. Oversized responses keep their
//! head, cut at a line boundary so the reader never sees half a line, and gain
//! a trailer stating the configured limit, the original size and the final
//! size. The trailer is appended once and is never itself truncated.

/// Literal prefix of every truncation notice.
pub const TRUNCATION_MARKER: &str = "[RESPONSE TRUNCATED";

const SEPARATOR: &str = "\n\n";
const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Limit `text` to roughly `max_bytes`.
///
/// If `text` fits within `max_bytes` it is returned as-is. Otherwise the
/// result is:
///
/// ```text
/// <complete leading lines totalling at most max_bytes>
///
/// [RESPONSE TRUNCATED: Output exceeded 1.0KB limit. Original: 3749 bytes, Truncated: 1107 bytes]
/// ```
///
/// Lines keep their terminator (`\n` or `\r\n`) verbatim. Only when the very
/// first line is longer than `max_bytes` are its leading bytes kept instead,
/// backed off to a character boundary if the cut would split a multi-byte
/// sequence.
///
/// The result is strictly shorter than `text` whenever `text` is longer than
/// the notice itself; the head budget shrinks below `max_bytes` when needed,
/// and may shrink to nothing. Inputs no longer than the notice still get the
/// notice, so their result is longer than the input.
pub fn apply_limit(text: &str, max_bytes: usize) -> String {
    let original = text.len();
    if original <= max_bytes {
        return text.to_owned();
    }

    // `original` as the truncated figure bounds the notice's digit count.
    let overhead = SEPARATOR.len() + notice(max_bytes, original, original).len();
    let budget = if original > overhead {
        max_bytes.min(original - overhead - 1)
    } else {
        max_bytes
    };

    let head = take_head(text, budget, max_bytes);
    with_notice(head, max_bytes, original)
}

/// Render a byte count the way the truncation notice does: `256B`, `1.0KB`, `2.0MB`.
pub fn format_size(bytes: usize) -> String {
    if bytes >= MIB {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1}KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes}B")
    }
}

/// Longest prefix of whole lines within `budget`. The first line is cut at
/// `budget` only when it alone is longer than `limit`.
fn take_head(text: &str, budget: usize, limit: usize) -> &str {
    let mut end = 0;
    for line in text.split_inclusive('\n') {
        if end + line.len() > budget {
            break;
        }
        end += line.len();
    }

    let first_line_len = text.split_inclusive('\n').next().map_or(0, str::len);
    if end == 0 && first_line_len > limit {
        end = budget.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
    }

    &text[..end]
}

/// Append the separator and a notice whose `Truncated:` figure counts itself.
fn with_notice(head: &str, limit: usize, original: usize) -> String {
    let base = head.len() + SEPARATOR.len();
    let mut total = base + notice(limit, original, 0).len();
    // Converges in at most a couple of rounds: only the digit count can move.
    loop {
        let trailer = notice(limit, original, total);
        if base + trailer.len() == total {
            return format!("{head}{SEPARATOR}{trailer}");
        }
        total = base + trailer.len();
    }
}

fn notice(limit: usize, original: usize, truncated: usize) -> String {
    format!(
        "{TRUNCATION_MARKER}: Output exceeded {} limit. Original: {original} bytes, Truncated: {truncated} bytes]",
        format_size(limit)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
