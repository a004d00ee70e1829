//! Greedy word-wrapping for card titles.
//!
//! The wrap algorithm is generic over a width-measure closure so it can be
//! tested without a font file; production callers measure with real glyph
//! advances via [`text_width`].

use ab_glyph::{Font, PxScale, ScaleFont};

/// Pixel width of `text` at `scale`, measured from glyph advances and
/// kerning. Characters the font lacks fall back to the font's notdef glyph,
/// which still carries an advance, so emoji and symbols keep a stable width.
#[must_use]
pub fn text_width<F: Font>(font: &F, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev = None;
    for ch in text.chars() {
        let glyph = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, glyph);
        }
        width += scaled.h_advance(glyph);
        prev = Some(glyph);
    }
    width
}

/// Greedily wraps `text` into lines no wider than `max_width` according to
/// `measure`. A single word wider than `max_width` gets its own line rather
/// than being split.
pub fn wrap_text<M>(text: &str, max_width: f32, measure: M) -> Vec<String>
where
    M: Fn(&str) -> f32,
{
    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        let trial = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{} {word}", current.join(" "))
        };
        if measure(&trial) <= max_width {
            current.push(word);
        } else {
            if !current.is_empty() {
                lines.push(current.join(" "));
            }
            current = vec![word];
        }
    }

    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

/// Up to two speaker names as a single display line: "A", "A & B", or
/// "A, B & others".
#[must_use]
pub fn speaker_names_line(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [a] => a.clone(),
        [a, b] => format!("{a} & {b}"),
        [a, b, ..] => format!("{a}, {b} & others"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Character-count measure: every char is 10px wide.
    fn char_measure(s: &str) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let chars = s.chars().count() as f32;
        chars * 10.0
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let lines = wrap_text("hello world", 200.0, char_measure);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn wraps_greedily_at_the_width_limit() {
        // 12 chars max per line at 10px/char.
        let lines = wrap_text("one two three four", 120.0, char_measure);
        assert_eq!(lines, vec!["one two", "three four"]);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let lines = wrap_text("hi incomprehensibilities yo", 100.0, char_measure);
        assert_eq!(lines, vec!["hi", "incomprehensibilities", "yo"]);
    }

    #[test]
    fn empty_text_produces_no_lines() {
        let lines = wrap_text("", 100.0, char_measure);
        assert!(lines.is_empty());
    }

    #[test]
    fn collapses_internal_whitespace() {
        let lines = wrap_text("a   b\tc", 100.0, char_measure);
        assert_eq!(lines, vec!["a b c"]);
    }

    #[test]
    fn speaker_line_formats_by_count() {
        let names = |v: &[&str]| v.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();
        assert_eq!(speaker_names_line(&names(&[])), "");
        assert_eq!(speaker_names_line(&names(&["Ada"])), "Ada");
        assert_eq!(speaker_names_line(&names(&["Ada", "Grace"])), "Ada & Grace");
        assert_eq!(
            speaker_names_line(&names(&["Ada", "Grace", "Edsger"])),
            "Ada, Grace & others"
        );
    }
}
