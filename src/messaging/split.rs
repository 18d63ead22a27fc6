//! Long-message splitter.
//!
//! Packs text paragraph by paragraph into chunks under a soft target. A
//! paragraph that alone exceeds the target is cut on character boundaries,
//! each cut piece except the last carrying [`CONTINUED_MARKER`].
//!
//! Lengths are counted in `char`s, never bytes, so multi-byte text is never
//! split inside a code point.

/// Suffix appended to a paragraph fragment that continues in the next chunk.
pub const CONTINUED_MARKER: &str = " [continued...]";

/// Paragraph separator used for packing.
const PARAGRAPH_BREAK: &str = "\n\n";

/// Size limits for outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLimits {
    max_len: usize,
    soft_len: usize,
}

impl SplitLimits {
    /// Telegram's limit with the same margin the bot always kept.
    pub const TELEGRAM: Self = Self {
        max_len: 4096,
        soft_len: 3900,
    };

    /// Build limits, returning `None` unless
    /// `0 < soft_len` and `soft_len + marker <= max_len`.
    pub fn new(max_len: usize, soft_len: usize) -> Option<Self> {
        let marker = CONTINUED_MARKER.chars().count();
        let fits = soft_len
            .checked_add(marker)
            .is_some_and(|needed| needed <= max_len);
        (soft_len > 0 && fits).then_some(Self { max_len, soft_len })
    }

    /// Hard per-message limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for SplitLimits {
    fn default() -> Self {
        Self::TELEGRAM
    }
}

/// Split `content` into messages that each fit within `limits.max_len()`.
///
/// Text already within the limit comes back as a single element. Empty input
/// yields no messages.
pub fn split_message(content: &str, limits: SplitLimits) -> Vec<String> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    if char_len(content) <= limits.max_len {
        return vec![content.to_owned()];
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len: usize = 0;
    let separator_len = PARAGRAPH_BREAK.len();

    for paragraph in content.split(PARAGRAPH_BREAK) {
        if paragraph.trim().is_empty() {
            continue;
        }
        let paragraph_len = char_len(paragraph);
        let projected = current_len
            .saturating_add(paragraph_len)
            .saturating_add(separator_len);

        if projected <= limits.soft_len {
            current.push_str(paragraph);
            current.push_str(PARAGRAPH_BREAK);
            current_len = projected;
            continue;
        }

        if !current.is_empty() {
            parts.push(current.trim_end().to_owned());
            current.clear();
            current_len = 0;
        }

        if paragraph_len > limits.soft_len {
            parts.extend(chunk_paragraph(paragraph, limits.soft_len));
            continue;
        }

        current.push_str(paragraph);
        current.push_str(PARAGRAPH_BREAK);
        current_len = paragraph_len.saturating_add(separator_len);
    }

    if !current.trim().is_empty() {
        parts.push(current.trim_end().to_owned());
    }

    tracing::debug!(parts = parts.len(), "split long message");
    parts
}

/// Cut one oversized paragraph into `size`-char pieces.
fn chunk_paragraph(paragraph: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let pieces: Vec<String> = chars
        .chunks(size)
        .map(|piece| piece.iter().collect())
        .collect();
    let last = pieces.len().saturating_sub(1);

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, mut piece)| {
            if i < last {
                piece.push_str(CONTINUED_MARKER);
            }
            piece
        })
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
