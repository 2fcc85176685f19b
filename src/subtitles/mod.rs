//! Subtitle cue segmentation.
//!
//! [`build_cues`] groups timestamped transcript words into on-screen cues and
//! wraps each cue into lines; [`render_at`] picks the cue to show at a given
//! time and marks the words being spoken. Both are pure and never touch the
//! assembly.

use serde::{Deserialize, Serialize};

/// Longest span a single cue may cover, in seconds.
pub const MAX_CUE_SPAN: f64 = 4.4;
/// A pause longer than this between two words starts a new cue.
pub const MAX_WORD_GAP: f64 = 0.62;
/// A cue stays on screen this long after its last word ends.
pub const CUE_END_GRACE: f64 = 0.12;
/// A word stays highlighted this long after it ends.
pub const WORD_END_GRACE: f64 = 0.05;

/// One timestamped word from a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    #[serde(default)]
    pub id: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl TranscriptWord {
    pub fn new(id: impl Into<String>, text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            start,
            end,
        }
    }
}

/// Caption style settings that drive wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleRenderProfile {
    pub font_family: String,
    pub font_size: f64,
    pub max_words_per_line: usize,
    pub max_chars_per_line: usize,
    pub max_lines: usize,
    pub emphasize_keywords: bool,
    pub uppercase: bool,
}

impl Default for SubtitleRenderProfile {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 42.0,
            max_words_per_line: 5,
            max_chars_per_line: 28,
            max_lines: 2,
            emphasize_keywords: true,
            uppercase: false,
        }
    }
}

/// Caption box size relative to the reference box (1.0 × 1.0). Width scales the
/// per-line limits, height scales the line count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueLayout {
    pub box_width: f64,
    pub box_height: f64,
}

impl Default for CueLayout {
    fn default() -> Self {
        Self {
            box_width: 1.0,
            box_height: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub lines: Vec<Vec<CueWord>>,
}

impl SubtitleCue {
    pub fn words(&self) -> impl Iterator<Item = &CueWord> {
        self.lines.iter().flatten()
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|word| word.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A cue word as shown at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWord {
    pub text: String,
    pub emphasized: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCue {
    pub start: f64,
    pub end: f64,
    pub lines: Vec<Vec<RenderedWord>>,
}

/// Largest per-line or line-count limit a layout can scale up to.
const MAX_SCALED_LIMIT: usize = 1_000;

/// Effective limits after applying a layout to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Limits {
    words_per_line: usize,
    chars_per_line: usize,
    lines: usize,
}

impl Limits {
    fn new(profile: &SubtitleRenderProfile, layout: CueLayout) -> Self {
        Self {
            words_per_line: scale(profile.max_words_per_line, layout.box_width),
            chars_per_line: scale(profile.max_chars_per_line, layout.box_width),
            lines: scale(profile.max_lines, layout.box_height),
        }
    }

    fn cue_words(&self) -> usize {
        self.words_per_line.saturating_mul(self.lines)
    }
}

fn scale(base: usize, factor: f64) -> usize {
    let factor = if factor.is_finite() && factor > 0.0 { factor } else { 1.0 };
    let scaled = (base.max(1) as f64 * factor).round();
    if scaled >= MAX_SCALED_LIMIT as f64 {
        MAX_SCALED_LIMIT
    } else {
        (scaled as usize).max(1)
    }
}

/// Where the next word goes relative to the cue being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    SameLine,
    NextLine,
    NextCue,
}

fn normalize_text(text: &str, uppercase: bool) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if uppercase {
        collapsed.to_uppercase()
    } else {
        collapsed
    }
}

/// Long words, and shorter ones mixing letters with digits, carry emphasis.
fn is_keyword(text: &str) -> bool {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    letters >= 8 || (letters >= 5 && has_digit)
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end_matches(['"', '\'', ')', '”', '’'])
        .ends_with(['.', '!', '?', '…'])
}

fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Group `words` into display cues.
///
/// Words are normalized first (whitespace collapsed, optionally uppercased);
/// words that end up empty or carry non-finite times are skipped.
pub fn build_cues(
    words: &[TranscriptWord],
    profile: &SubtitleRenderProfile,
    layout: Option<CueLayout>,
) -> Vec<SubtitleCue> {
    let limits = Limits::new(profile, layout.unwrap_or_default());

    let mut normalized: Vec<CueWord> = words
        .iter()
        .filter(|word| word.start.is_finite() && word.end.is_finite())
        .filter_map(|word| {
            let text = normalize_text(&word.text, profile.uppercase);
            if text.is_empty() {
                return None;
            }
            Some(CueWord {
                emphasized: profile.emphasize_keywords && is_keyword(&text),
                text,
                start: word.start,
                end: word.end.max(word.start),
            })
        })
        .collect();
    normalized.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut cues = Vec::new();
    let mut lines: Vec<Vec<CueWord>> = Vec::new();
    let mut line_chars = 0usize;

    for word in normalized {
        let len = text_len(&word.text);
        match placement(&lines, line_chars, &word, limits) {
            Placement::SameLine => {
                line_chars = line_chars.saturating_add(1).saturating_add(len);
                if let Some(line) = lines.last_mut() {
                    line.push(word);
                }
            }
            Placement::NextLine => {
                line_chars = len;
                lines.push(vec![word]);
            }
            Placement::NextCue => {
                if !lines.is_empty() {
                    cues.push(close_cue(std::mem::take(&mut lines)));
                }
                line_chars = len;
                lines.push(vec![word]);
            }
        }
    }
    if !lines.is_empty() {
        cues.push(close_cue(lines));
    }
    cues
}

/// Greedy placement of `word` after the lines built so far. A cue closes when
/// timing breaks it or when the word would need a line past the limit, so no
/// line ever exceeds the per-line limits except a lone word longer than a line.
fn placement(lines: &[Vec<CueWord>], line_chars: usize, word: &CueWord, limits: Limits) -> Placement {
    let (Some(first), Some(line)) = (lines.first().and_then(|l| l.first()), lines.last()) else {
        return Placement::NextCue;
    };
    let Some(previous) = line.last() else {
        return Placement::NextCue;
    };
    let count: usize = lines.iter().map(Vec::len).sum();
    let continues = word.end - first.start < MAX_CUE_SPAN
        && word.start - previous.end < MAX_WORD_GAP
        && !(ends_sentence(&previous.text) && count.saturating_mul(2) >= limits.cue_words());
    if !continues {
        return Placement::NextCue;
    }

    let fits_line = line.len() < limits.words_per_line
        && line_chars.saturating_add(1).saturating_add(text_len(&word.text)) <= limits.chars_per_line;
    if fits_line {
        Placement::SameLine
    } else if lines.len() < limits.lines {
        Placement::NextLine
    } else {
        Placement::NextCue
    }
}

fn close_cue(lines: Vec<Vec<CueWord>>) -> SubtitleCue {
    let start = lines
        .first()
        .and_then(|line| line.first())
        .map_or(0.0, |word| word.start);
    let end = lines.iter().flatten().map(|word| word.end).fold(start, f64::max);
    SubtitleCue { start, end, lines }
}

/// The cue on screen at `time`, with its spoken words marked active.
///
/// A cue stays visible [`CUE_END_GRACE`] past its end. Where that grace
/// overlaps the next cue, the later cue wins.
pub fn render_at(cues: &[SubtitleCue], time: f64) -> Option<RenderedCue> {
    if !time.is_finite() {
        return None;
    }
    let cue = cues
        .iter()
        .rev()
        .find(|cue| cue.start <= time && time <= cue.end + CUE_END_GRACE)?;
    let lines = cue
        .lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|word| RenderedWord {
                    text: word.text.clone(),
                    emphasized: word.emphasized,
                    active: word.start <= time && time <= word.end + WORD_END_GRACE,
                })
                .collect()
        })
        .collect();
    Some(RenderedCue {
        start: cue.start,
        end: cue.end,
        lines,
    })
}
