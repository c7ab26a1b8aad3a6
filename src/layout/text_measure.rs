//! Text Measurement
//!
//! Width of text in terminal cells, and its height once wrapped.
//!
//! - ASCII printable: 1 cell
//! - Control characters: 0 cells
//! - CJK, fullwidth forms and most emoji: 2 cells

/// Display width of a string in terminal cells.
pub fn string_width(s: &str) -> u16 {
    s.chars().fold(0u16, |width, c| width.saturating_add(char_width(c)))
}

fn char_width(c: char) -> u16 {
    if c.is_ascii() {
        return if c.is_ascii_control() { 0 } else { 1 };
    }
    let code = c as u32;
    let wide = (0x1100..=0x115F).contains(&code)
        || (0x2E80..=0x9FFF).contains(&code)
        || (0xAC00..=0xD7A3).contains(&code)
        || (0xF900..=0xFAFF).contains(&code)
        || (0xFE30..=0xFE6F).contains(&code)
        || (0xFF00..=0xFF60).contains(&code)
        || (0xFFE0..=0xFFE6).contains(&code)
        || (0x1F300..=0x1F9FF).contains(&code)
        || (0x20000..=0x2FFFF).contains(&code);
    if wide { 2 } else { 1 }
}

/// Lines `text` occupies when word-wrapped at `available_width` cells.
///
/// 0 for empty text; explicit newlines always break.
pub fn measure_text_height(text: &str, available_width: u16) -> u16 {
    if text.is_empty() {
        return 0;
    }
    if available_width == 0 {
        return 1;
    }

    let mut lines = 0u16;
    for line in text.split('\n') {
        let mut used = 0u16;
        let mut line_count = 1u16;
        for word in line.split(' ') {
            let word_width = string_width(word);
            let needed = if used == 0 { word_width } else { used + 1 + word_width };
            if needed <= available_width {
                used = needed;
                continue;
            }
            // Break before the word; an over-long word spills over several lines
            if used > 0 {
                line_count += 1;
            }
            line_count += word_width.saturating_sub(1) / available_width;
            used = word_width % available_width;
            if used == 0 && word_width > 0 {
                used = available_width;
            }
        }
        lines = lines.saturating_add(line_count);
    }
    lines
}
