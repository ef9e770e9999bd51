//! Rough token estimate for outgoing prompts. Advisory only.

/// Weight of one wide-script glyph
const WIDE_WEIGHT: f64 = 2.5;
/// Weight of any other character
const NARROW_WEIGHT: f64 = 0.25;

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x11FF       // Hangul Jamo
        | 0x2E80..=0x2FDF     // CJK radicals
        | 0x3000..=0x303F     // CJK symbols and punctuation
        | 0x3040..=0x309F     // Hiragana
        | 0x30A0..=0x30FF     // Katakana
        | 0x3130..=0x318F     // Hangul compatibility Jamo
        | 0x31F0..=0x31FF     // Katakana extensions
        | 0x3400..=0x4DBF     // CJK extension A
        | 0x4E00..=0x9FFF     // CJK unified ideographs
        | 0xAC00..=0xD7AF     // Hangul syllables
        | 0xF900..=0xFAFF     // CJK compatibility ideographs
        | 0xFF00..=0xFFEF     // Half-width and full-width forms
        | 0x20000..=0x2FA1F   // CJK extensions B and later
    )
}

/// Estimate tokens: 2.5 per wide glyph, 0.25 per other char, rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    let (wide, narrow) = text.chars().fold((0u64, 0u64), |(wide, narrow), c| {
        if is_wide(c) {
            (wide + 1, narrow)
        } else {
            (wide, narrow + 1)
        }
    });
    let estimate = wide as f64 * WIDE_WEIGHT + narrow as f64 * NARROW_WEIGHT;
    estimate.ceil() as u64
}
