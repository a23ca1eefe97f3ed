//! Text measurement and wrapping for fixed-pitch cell layout.
//!
//! Widths are estimated with a character budget rather than glyph metrics:
//! a cell of width `w` at font size `s` holds `floor(w * factor / s)`
//! characters. Pagination depends on these exact numbers, so the estimate is
//! kept as is. Lengths count Unicode scalar values.

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Characters that fit `width` at `font_size`, truncated toward zero.
pub fn char_budget(width: f64, font_size: f64, width_factor: f64) -> usize {
    if !(font_size > 0.0) {
        return 0;
    }
    let budget = width * width_factor / font_size;
    if budget.is_finite() && budget > 0.0 {
        budget as usize
    } else {
        0
    }
}

/// Estimated width in points needed to show `text` on one line.
pub fn required_width(text: &str, font_size: f64, glyph_width_ratio: f64) -> f64 {
    char_len(text) as f64 * font_size * glyph_width_ratio
}

/// Greedy word wrap into lines of at most `budget` characters.
///
/// Paragraphs are separated by `\n`; words are separated by whitespace and
/// rejoined with single spaces. A word longer than the budget is cut into
/// budget-sized pieces. Empty paragraphs produce no lines.
pub fn wrap_words(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = char_len(word);

            if word_len > budget {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                }
                let mut pieces = split_chars(word, budget);
                // The tail piece stays open so following words can join it.
                let tail = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                line_len = char_len(&tail);
                line = tail;
            } else if line_len == 0 {
                line.push_str(word);
                line_len = word_len;
            } else if line_len + 1 + word_len <= budget {
                line.push(' ');
                line.push_str(word);
                line_len += 1 + word_len;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
                line_len = word_len;
            }
        }

        if line_len > 0 {
            lines.push(line);
        }
    }

    lines
}

/// Cut every `\n`-separated paragraph into consecutive pieces of `budget`
/// characters without regard for word boundaries. Empty paragraphs produce
/// no lines.
pub fn wrap_chunks(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    text.split('\n')
        .flat_map(|paragraph| split_chars(paragraph, budget))
        .collect()
}

fn split_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
