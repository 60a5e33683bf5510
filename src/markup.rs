//! Inline subtitle style markup: `<i>`, `<b>`, `<u>`.
//!
//! Presentation concern layered on top of cue text. Each style axis is an
//! independent boolean with last-tag-wins semantics (not a stack), so
//! unmatched or doubled tags cannot corrupt state. Unrecognized tags are
//! left in the text untouched.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"(?i)<\s*(/?)\s*([ibu])\s*>").unwrap();
}

/// A run of cue text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSegment {
    pub text: String,
    pub italic: bool,
    pub bold: bool,
    pub underline: bool,
}

/// Split cue text into styled segments. Adjacent segments with identical
/// styling are merged.
pub fn parse_segments(raw: &str) -> Vec<StyledSegment> {
    let mut segments: Vec<StyledSegment> = Vec::new();
    let mut cursor = 0;
    let mut italic = false;
    let mut bold = false;
    let mut underline = false;

    let push = |segments: &mut Vec<StyledSegment>, text: &str, italic: bool, bold: bool, underline: bool| {
        if text.is_empty() {
            return;
        }
        if let Some(last) = segments.last_mut() {
            if last.italic == italic && last.bold == bold && last.underline == underline {
                last.text.push_str(text);
                return;
            }
        }
        segments.push(StyledSegment {
            text: text.to_string(),
            italic,
            bold,
            underline,
        });
    };

    for caps in TAG_RE.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        push(&mut segments, &raw[cursor..whole.start()], italic, bold, underline);

        let enabled = caps[1].is_empty();
        match caps[2].to_ascii_lowercase().as_str() {
            "i" => italic = enabled,
            "b" => bold = enabled,
            "u" => underline = enabled,
            _ => {}
        }

        cursor = whole.end();
    }

    push(&mut segments, &raw[cursor..], italic, bold, underline);
    segments
}

/// Cue text with recognized style tags stripped.
pub fn plain_text(raw: &str) -> String {
    parse_segments(raw).iter().map(|s| s.text.as_str()).collect()
}
