//! Markup normalization for agent utterances.
//!
//! The language model behind the agent emits inline control tags meant for
//! the speech-synthesis stage (`<emotion value="happy"/>`, `<speed ratio="1.2"/>`,
//! `<volume ratio="0.8"/>`, `[laughter]`). None of them belong in the visual
//! transcript. This module provides:
//! - `scan()`: a forward-scanning tokenizer that splits text into literal runs
//!   and recognized tags
//! - `normalize()`: the strip strategy, removing every recognized tag
//! - `normalize_with_glyphs()`: the glyph strategy, turning emotions and cues
//!   into glyph markers between text runs
//!
//! `scan()` and both strategies share one tag matcher, so they recognize
//! exactly the same tags.
//! Anything that is not a well-formed tag is left as literal text; whitespace
//! around a removed tag is never collapsed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Upper bound on an attribute value. Keeps a failed candidate from scanning
/// past a fixed window looking for its closing quote.
const MAX_ATTR_VALUE_LEN: usize = 256;

/// Upper bound on a whole tag. Longer candidates stay literal text.
const MAX_TAG_LEN: usize = MAX_ATTR_VALUE_LEN + 64;

/// Bracketed non-verbal cues the synthesis stage understands.
const NON_VERBAL_CUES: &[&str] = &["laughter"];

/// A recognized control tag. Borrowed from the scanned input and discarded
/// once normalization is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupTag<'a> {
    Emotion { value: &'a str },
    Speed { ratio: &'a str },
    Volume { ratio: &'a str },
    NonVerbal { cue: &'a str },
}

/// Output of `scan()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Tag(MarkupTag<'a>),
}

/// Which normalization strategy agent text goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeStrategy {
    /// Remove tags entirely.
    #[default]
    Strip,
    /// Replace emotions and cues with glyphs from a lookup table.
    Glyph,
}

/// One piece of glyph-mode output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Glyph(String),
}

/// Result of running a `Normalizer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Plain(String),
    Segments(Vec<Segment>),
}

/// Strategy selected once at construction, then applied to every utterance.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    strategy: NormalizeStrategy,
    glyphs: GlyphTable,
}

impl Normalizer {
    pub fn new(strategy: NormalizeStrategy) -> Self {
        Self {
            strategy,
            glyphs: GlyphTable::builtin(),
        }
    }

    /// Replaces the glyph table used by the glyph strategy.
    pub fn with_glyphs(mut self, glyphs: GlyphTable) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn strategy(&self) -> NormalizeStrategy {
        self.strategy
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        match self.strategy {
            NormalizeStrategy::Strip => Normalized::Plain(normalize(raw)),
            NormalizeStrategy::Glyph => Normalized::Segments(normalize_with_glyphs(raw, &self.glyphs)),
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Splits `input` into literal text runs and recognized tags.
///
/// Concatenating every `Token::Text` with the source of every `Token::Tag`
/// reproduces the input.
pub fn scan(input: &str) -> Scanner<'_> {
    Scanner { input, pos: 0 }
}

/// Iterator returned by `scan()`.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return None;
        }

        if let Some((tag, len)) = match_tag(rest) {
            self.pos += len;
            return Some(Token::Tag(tag));
        }

        // Literal text runs up to the next position where a tag matches.
        let mut search_from = usize::from(rest.starts_with(['<', '[']));
        let end = loop {
            match rest[search_from..].find(['<', '[']) {
                None => break rest.len(),
                Some(i) => {
                    let at = search_from + i;
                    if match_tag(&rest[at..]).is_some() {
                        break at;
                    }
                    search_from = at + 1;
                }
            }
        };

        self.pos += end;
        Some(Token::Text(&rest[..end]))
    }
}

fn match_tag(s: &str) -> Option<(MarkupTag<'_>, usize)> {
    let mut end = s.len().min(MAX_TAG_LEN);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let s = &s[..end];
    match s.as_bytes().first()? {
        b'<' => match_angle_tag(s),
        b'[' => match_cue(s),
        _ => None,
    }
}

#[derive(Clone, Copy)]
enum AngleKind {
    Emotion,
    Speed,
    Volume,
}

impl AngleKind {
    const ALL: [AngleKind; 3] = [AngleKind::Emotion, AngleKind::Speed, AngleKind::Volume];

    fn name(self) -> &'static str {
        match self {
            AngleKind::Emotion => "emotion",
            AngleKind::Speed => "speed",
            AngleKind::Volume => "volume",
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            AngleKind::Emotion => "value",
            AngleKind::Speed | AngleKind::Volume => "ratio",
        }
    }

    fn tag(self, value: &str) -> MarkupTag<'_> {
        match self {
            AngleKind::Emotion => MarkupTag::Emotion { value },
            AngleKind::Speed => MarkupTag::Speed { ratio: value },
            AngleKind::Volume => MarkupTag::Volume { ratio: value },
        }
    }
}

/// `<name attr="value">`, `<name attr='value'/>`, with optional whitespace
/// before the closing `/>` or `>`.
fn match_angle_tag(s: &str) -> Option<(MarkupTag<'_>, usize)> {
    let mut cursor = Cursor::new(s);
    if !cursor.eat_byte(b'<') {
        return None;
    }

    let kind = AngleKind::ALL
        .into_iter()
        .find(|kind| cursor.eat_keyword(kind.name()))?;

    if cursor.eat_whitespace() == 0
        || !cursor.eat_keyword(kind.attribute())
        || !cursor.eat_byte(b'=')
        || !cursor.eat_quote()
    {
        return None;
    }

    let value = cursor.take_value()?;
    if !cursor.eat_quote() {
        return None;
    }

    cursor.eat_whitespace();
    cursor.eat_byte(b'/');
    if !cursor.eat_byte(b'>') {
        return None;
    }

    Some((kind.tag(value), cursor.pos))
}

fn match_cue(s: &str) -> Option<(MarkupTag<'_>, usize)> {
    let mut cursor = Cursor::new(s);
    if !cursor.eat_byte(b'[') {
        return None;
    }

    let start = cursor.pos;
    NON_VERBAL_CUES
        .iter()
        .find(|cue| cursor.eat_keyword(cue))?;
    let cue = &s[start..cursor.pos];

    cursor
        .eat_byte(b']')
        .then_some((MarkupTag::NonVerbal { cue }, cursor.pos))
}

/// Byte cursor over a tag candidate. Every delimiter it looks for is ASCII,
/// so `pos` always lands on a char boundary.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eat_byte(&mut self, byte: u8) -> bool {
        if self.rest().as_bytes().first() == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_quote(&mut self) -> bool {
        self.eat_byte(b'"') || self.eat_byte(b'\'')
    }

    /// Consumes `keyword`, compared ASCII-case-insensitively.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest().as_bytes();
        let len = keyword.len();
        if rest.len() >= len && rest[..len].eq_ignore_ascii_case(keyword.as_bytes()) {
            self.pos += len;
            true
        } else {
            false
        }
    }

    fn eat_whitespace(&mut self) -> usize {
        let rest = self.rest();
        let consumed = rest.len() - rest.trim_start().len();
        self.pos += consumed;
        consumed
    }

    /// Takes a non-empty value up to (not including) the next quote.
    fn take_value(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let window = &rest.as_bytes()[..rest.len().min(MAX_ATTR_VALUE_LEN + 1)];
        let end = window.iter().position(|b| matches!(b, b'"' | b'\''))?;
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Removes every recognized tag from `raw`.
///
/// Removing a tag can splice the text on either side into a new tag
/// (`<emo<speed ratio="1"/>tion value="x"/>`); that tag is removed as well.
/// The result never contains tag syntax, so
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    strip_tags(raw, |_, _| {})
}

/// Splits `raw` into text runs and glyph markers.
///
/// Emotions and cues found in `glyphs` become `Segment::Glyph`; every other
/// recognized tag is dropped without a trace. The text runs, concatenated,
/// equal `normalize(raw)`. Adjacent text runs are merged.
pub fn normalize_with_glyphs(raw: &str, glyphs: &GlyphTable) -> Vec<Segment> {
    let mut marks = GlyphMarks::default();
    let text = strip_tags(raw, |tag, start| {
        marks.collapse_after(start);
        if let Some(glyph) = glyphs.glyph_for(tag) {
            marks.push(start, glyph);
        }
    });
    marks.into_segments(&text)
}

/// The single pass behind both strategies.
///
/// `out` never holds a complete tag, so a new one can only end at the byte
/// just appended, and only when that byte is `>` or `]`. Such a tag starts
/// within the last `MAX_TAG_LEN` bytes; it is reported to `on_tag` with its
/// start offset in the output and cut off. Each input byte costs a bounded
/// amount of work.
fn strip_tags(raw: &str, mut on_tag: impl FnMut(&MarkupTag<'_>, usize)) -> String {
    let mut out = String::with_capacity(raw.len());
    for piece in raw.split_inclusive(['>', ']']) {
        out.push_str(piece);
        if let Some(start) = trailing_tag(&out, &mut on_tag) {
            out.truncate(start);
        }
    }
    out
}

fn trailing_tag(out: &str, on_tag: &mut impl FnMut(&MarkupTag<'_>, usize)) -> Option<usize> {
    if !out.ends_with(['>', ']']) {
        return None;
    }

    let mut window_start = out.len().saturating_sub(MAX_TAG_LEN);
    while !out.is_char_boundary(window_start) {
        window_start += 1;
    }

    // Leftmost candidate first, as `scan()` would pick it.
    out[window_start..]
        .match_indices(['<', '['])
        .map(|(offset, _)| window_start + offset)
        .find_map(|start| {
            let (tag, len) = match_tag(&out[start..])?;
            (start + len == out.len()).then(|| {
                on_tag(&tag, start);
                start
            })
        })
}

/// Glyphs positioned at byte offsets of the stripped text.
///
/// Stored as runs: `runs[i] = (offset, end)` places `glyphs[prev_end..end]`
/// at `offset`. Offsets never decrease.
#[derive(Default)]
struct GlyphMarks<'g> {
    glyphs: Vec<&'g str>,
    runs: Vec<(usize, usize)>,
}

impl<'g> GlyphMarks<'g> {
    /// Text from `start` on was just removed; glyphs inside it move to
    /// `start` and keep their order.
    fn collapse_after(&mut self, start: usize) {
        let mut collapsed = false;
        while self.runs.last().is_some_and(|&(offset, _)| offset > start) {
            self.runs.pop();
            collapsed = true;
        }
        if collapsed {
            self.runs.push((start, self.glyphs.len()));
        }
    }

    fn push(&mut self, offset: usize, glyph: &'g str) {
        self.glyphs.push(glyph);
        match self.runs.last_mut() {
            Some((last, end)) if *last == offset => *end = self.glyphs.len(),
            _ => self.runs.push((offset, self.glyphs.len())),
        }
    }

    fn into_segments(self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut text_from = 0;
        let mut glyph_from = 0;
        for (offset, end) in self.runs {
            push_text(&mut segments, &text[text_from..offset]);
            segments.extend(
                self.glyphs[glyph_from..end]
                    .iter()
                    .map(|glyph| Segment::Glyph((*glyph).to_string())),
            );
            text_from = offset;
            glyph_from = end;
        }
        push_text(&mut segments, &text[text_from..]);
        segments
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Text(text.to_string()));
    }
}

// ============================================================================
// Glyph table
// ============================================================================

/// Emotion values the synthesis stage is known to emit, with their glyphs.
const EMOTION_GLYPHS: &[(&str, &str)] = &[
    ("happy", "😊"),
    ("excited", "🤩"),
    ("enthusiastic", "😁"),
    ("elated", "🥳"),
    ("euphoric", "✨"),
    ("triumphant", "🏆"),
    ("amazed", "😮"),
    ("surprised", "😲"),
    ("flirtatious", "😉"),
    ("joking/comedic", "🤣"),
    ("curious", "🤔"),
    ("content", "☺️"),
    ("peaceful", "😌"),
    ("serene", "🌿"),
    ("calm", "🧘"),
    ("grateful", "🙏"),
    ("affectionate", "🥰"),
    ("trust", "🤝"),
    ("sympathetic", "😔"),
    ("anticipation", "⏳"),
    ("mysterious", "🕵️"),
    ("angry", "😠"),
    ("mad", "😡"),
    ("outraged", "🤬"),
    ("frustrated", "😤"),
    ("agitated", "😖"),
    ("threatened", "⚠️"),
    ("disgusted", "🤢"),
    ("contempt", "🙄"),
    ("envious", "😒"),
    ("sarcastic", "😏"),
    ("ironic", "😼"),
    ("sad", "😢"),
    ("dejected", "😞"),
    ("melancholic", "😔"),
    ("disappointed", "😕"),
    ("hurt", "💔"),
    ("guilty", "😣"),
    ("bored", "🥱"),
    ("tired", "😴"),
    ("rejected", "🚫"),
    ("nostalgic", "📷"),
    ("wistful", "💭"),
    ("apologetic", "🙇"),
    ("hesitant", "😬"),
    ("insecure", "😳"),
    ("confused", "😵"),
    ("resigned", "😑"),
    ("anxious", "😰"),
    ("panicked", "😱"),
    ("alarmed", "🚨"),
    ("scared", "😨"),
    ("neutral", "😐"),
    ("proud", "😌"),
    ("confident", "😎"),
    ("distant", "🫥"),
    ("skeptical", "🤨"),
    ("contemplative", "🤔"),
    ("determined", "🔥"),
];

const CUE_GLYPHS: &[(&str, &str)] = &[("laughter", "😂")];

/// Case-insensitive lookup from emotion value or cue name to a glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphTable {
    glyphs: HashMap<String, String>,
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GlyphTable {
    /// A table with no entries: every emotion and cue is dropped.
    pub fn empty() -> Self {
        Self {
            glyphs: HashMap::new(),
        }
    }

    /// The built-in emotion and cue glyphs.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for &(key, glyph) in EMOTION_GLYPHS.iter().chain(CUE_GLYPHS) {
            table.insert(key, glyph);
        }
        table
    }

    pub fn insert(&mut self, key: &str, glyph: impl Into<String>) {
        self.glyphs.insert(key.to_lowercase(), glyph.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.glyphs.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Speed and volume tags never map to a glyph.
    pub fn glyph_for(&self, tag: &MarkupTag<'_>) -> Option<&str> {
        match tag {
            MarkupTag::Emotion { value } => self.get(value),
            MarkupTag::NonVerbal { cue } => self.get(cue),
            MarkupTag::Speed { .. } | MarkupTag::Volume { .. } => None,
        }
    }
}
