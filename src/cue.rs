//! Subtitle cue engine: SRT-style parsing and active-cue lookup.
//!
//! The parser is deliberately tolerant. Input is split into blocks on
//! blank lines; each block needs one timing line (`start --> end`) and at
//! least one text line after it. Malformed blocks are skipped, never
//! fatal. Output is always sorted ascending by start time so the lookup
//! can binary-search.

use log::debug;

use crate::error::PlayerError;

/// One timestamped subtitle interval. `end > start` always holds for
/// parser output.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleCue {
    /// Inclusive on both boundaries.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Decode raw subtitle bytes and parse them.
///
/// Tries UTF-8 first, then UTF-16 little-endian, then UTF-16 big-endian
/// (BOMs are honored and stripped).
pub fn parse_bytes(data: &[u8]) -> Result<Vec<SubtitleCue>, PlayerError> {
    let text = decode(data)
        .ok_or_else(|| PlayerError::SubtitleDecode("not UTF-8 or UTF-16".to_string()))?;
    Ok(parse_str(&text))
}

/// Parse SRT-style text into a sorted cue sequence.
///
/// Input order does not matter; cues are sorted ascending by `start`.
pub fn parse_str(text: &str) -> Vec<SubtitleCue> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut cues: Vec<SubtitleCue> = Vec::new();

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let Some(timing_idx) = lines.iter().position(|l| l.contains("-->")) else {
            continue;
        };

        let mut parts = lines[timing_idx].splitn(2, "-->");
        let start = parts.next().and_then(parse_timestamp);
        let end = parts.next().and_then(parse_timestamp);

        let (Some(start), Some(end)) = (start, end) else {
            debug!("Skipping cue block with unparseable timing: {:?}", lines[timing_idx]);
            continue;
        };

        if end <= start {
            debug!("Skipping cue block with end <= start: {:?}", lines[timing_idx]);
            continue;
        }

        let text_lines = &lines[timing_idx + 1..];
        if text_lines.is_empty() {
            continue;
        }

        cues.push(SubtitleCue {
            start,
            end,
            text: text_lines.join("\n"),
        });
    }

    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    cues
}

/// Index of the cue whose `[start, end]` interval contains `time`.
///
/// O(log n) over the sorted sequence. Gaps between cues return `None`.
/// If malformed input produced overlapping cues, the earliest-starting
/// cue containing `time` wins.
pub fn active_cue_index(cues: &[SubtitleCue], time: f64) -> Option<usize> {
    let upper = cues.partition_point(|c| c.start <= time);
    if upper == 0 {
        return None;
    }

    let mut idx = upper - 1;
    if !cues[idx].contains(time) {
        return None;
    }

    // Overlap tie-break: prefer the earliest cue still covering `time`.
    while idx > 0 && cues[idx - 1].contains(time) {
        idx -= 1;
    }

    Some(idx)
}

/// Format seconds as `M:SS` or `H:MM:SS` for transport displays.
pub fn format_playback_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Parse `H:MM:SS[.,fraction]`, tolerating surrounding whitespace and
/// trailing junk after the first whitespace-separated token.
fn parse_timestamp(raw: &str) -> Option<f64> {
    let token = raw.trim().split_whitespace().next()?;
    let normalized = token.replace(',', ".");

    let segments: Vec<&str> = normalized.split(':').collect();
    if segments.len() != 3 {
        return None;
    }

    let hours: f64 = segments[0].parse().ok()?;
    let minutes: f64 = segments[1].parse().ok()?;

    let mut sec_parts = segments[2].splitn(2, '.');
    let seconds: f64 = sec_parts.next()?.parse().ok()?;
    let fraction = match sec_parts.next() {
        Some(frac) => format!("0.{frac}").parse().unwrap_or(0.0),
        None => 0.0,
    };

    Some(hours * 3600.0 + minutes * 60.0 + seconds + fraction)
}

/// Decode bytes as UTF-8, then UTF-16LE, then UTF-16BE. A UTF-16 BOM
/// pins the endianness instead of guessing.
fn decode(data: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(data) {
        return Some(text.trim_start_matches('\u{feff}').to_string());
    }

    match data {
        [0xFF, 0xFE, ..] => decode_utf16(data, true),
        [0xFE, 0xFF, ..] => decode_utf16(data, false),
        _ => decode_utf16(data, true).or_else(|| decode_utf16(data, false)),
    }
}

fn decode_utf16(data: &[u8], little_endian: bool) -> Option<String> {
    if data.len() % 2 != 0 {
        return None;
    }

    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units)
        .ok()
        .map(|s| s.trim_start_matches('\u{feff}').to_string())
}
