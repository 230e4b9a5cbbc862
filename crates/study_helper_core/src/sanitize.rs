//! crates/study_helper_core/src/sanitize.rs
//!
//! Prompt cleaning applied before text is sent to the generation service.

/// Code-point ranges treated as emoji or pictographs and stripped from prompts.
pub const EMOJI_RANGES: [(u32, u32); 7] = [
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs
    (0x1F680, 0x1F6FF), // transport & map symbols
    (0x1F1E0, 0x1F1FF), // flags
    (0x2702, 0x27B0),   // dingbats
    (0x24C2, 0x1F251),  // enclosed characters
    (0x1F900, 0x1F9FF), // supplemental symbols
];

/// Section glyphs and markup with their plain-text replacements.
const MARKER_REPLACEMENTS: [(&str, &str); 9] = [
    ("\u{1F4D6}", "Overview"),
    ("\u{1F511}", "Key Points"),
    ("\u{1F4DA}", "Important Terms"),
    ("\u{1F4A1}", "Key Facts"),
    ("\u{1F310}", "Connections"),
    ("\u{1F3AF}", "Study Tips"),
    ("\u{2753}", "Review Questions"),
    ("##", "Section:"),
    ("\u{2022}", "-"),
];

pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

fn is_printable_ascii(c: char) -> bool {
    c.is_ascii_graphic() || matches!(c, ' ' | '\n' | '\t')
}

/// Cleans a prompt for transmission: replaces known markers, strips emoji,
/// folds typographic punctuation and drops anything outside printable ASCII.
pub fn clean_prompt(text: &str) -> String {
    let mut text = text.to_string();
    for (marker, replacement) in MARKER_REPLACEMENTS {
        text = text.replace(marker, replacement);
    }

    text.chars()
        .filter(|c| !is_emoji(*c))
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\r' => '\n',
            other => other,
        })
        .filter(|c| is_printable_ascii(*c))
        .collect()
}

/// The strict coercion used after an encoding failure: every character that
/// is not printable ASCII is discarded, with no substitutions.
pub fn strict_ascii(text: &str) -> String {
    text.chars().filter(|c| is_printable_ascii(*c)).collect()
}
