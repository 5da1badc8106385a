//! Sanitized structured-text rendering for agent responses.
//!
//! This module provides:
//! - `render_markdown()`: parse normalized text into an allowlisted `RenderTree`
//! - `render_segments()`: the same for glyph-mode output, flowing text runs and
//!   glyphs on one line
//! - `RenderTree::to_html()`: escaped HTML for the hosting page
//!
//! Uses pulldown-cmark for parsing. Only paragraphs, headings 1-3, lists,
//! inline code, code blocks, links, blockquotes and tables survive. Other
//! structure is flattened to its text; raw HTML is kept as literal text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use url::Url;

use crate::markup::Segment;

/// Link schemes allowed through to the output.
const ALLOWED_LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Attributes every rendered link carries so the opened page cannot reach
/// back into the transcript page.
pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

/// How paragraphs are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Each paragraph is its own block container.
    #[default]
    Block,
    /// Paragraphs become inline spans so they can flow with glyph markers.
    Inline,
}

/// Allowlisted block-level elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    /// A paragraph rendered in inline layout.
    Span(Vec<Inline>),
    Heading {
        /// 1 to 3.
        level: u8,
        content: Vec<Inline>,
    },
    List {
        /// `None` for unordered, `Some(n)` for ordered starting at n.
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    CodeBlock {
        lang: Option<String>,
        code: String,
    },
    BlockQuote(Vec<Block>),
    Table {
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
}

/// Allowlisted inline elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Link { href: String, children: Vec<Inline> },
    Glyph(String),
}

/// Sanitized render tree for one piece of agent text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTree {
    pub layout: LayoutMode,
    pub blocks: Vec<Block>,
}

impl RenderTree {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Text content with structure removed. Glyphs are included.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            block_text(block, &mut out);
        }
        out
    }

    /// Plain-text lines for terminal display, one or more per block.
    pub fn lines(&self) -> Vec<String> {
        if self.layout == LayoutMode::Inline {
            return self.text().lines().map(str::to_string).collect();
        }
        let mut lines = Vec::new();
        for block in &self.blocks {
            block_lines(block, "", &mut lines);
        }
        lines
    }

    /// Emits escaped HTML using only allowlisted tags.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            write_block(block, &mut out);
        }
        out
    }
}

/// Renders normalized text into a sanitized tree.
///
/// Empty input yields an empty tree.
pub fn render_markdown(text: &str, layout: LayoutMode) -> RenderTree {
    if text.is_empty() {
        return RenderTree {
            layout,
            blocks: Vec::new(),
        };
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = TreeBuilder::new(layout);
    for event in Parser::new_ext(text, options) {
        builder.process_event(event);
    }
    builder.finish()
}

/// Renders glyph-mode output.
///
/// A single text run renders in block layout like stripped text. Anything
/// mixed renders in inline layout, with glyphs attached to the surrounding
/// spans.
pub fn render_segments(segments: &[Segment]) -> RenderTree {
    if let [Segment::Text(text)] = segments {
        return render_markdown(text, LayoutMode::Block);
    }

    let mut blocks = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => {
                blocks.extend(render_markdown(text, LayoutMode::Inline).blocks);
            }
            Segment::Glyph(glyph) => {
                let glyph = Inline::Glyph(glyph.clone());
                match blocks.last_mut() {
                    Some(Block::Span(inlines)) => inlines.push(glyph),
                    _ => blocks.push(Block::Span(vec![glyph])),
                }
            }
        }
    }

    RenderTree {
        layout: LayoutMode::Inline,
        blocks,
    }
}

/// Accepts absolute http(s) and mailto links only.
fn sanitize_href(dest: &str) -> Option<String> {
    let url = Url::parse(dest.trim()).ok()?;
    ALLOWED_LINK_SCHEMES
        .contains(&url.scheme())
        .then(|| url.to_string())
}

// ============================================================================
// Tree building
// ============================================================================

#[derive(Debug)]
enum InlineContainer {
    Paragraph,
    Heading(u8),
    /// Raw HTML block, kept as literal text.
    Html,
    Link(Option<String>),
    Cell,
}

#[derive(Debug)]
enum BlockContainer {
    BlockQuote,
    Item,
}

#[derive(Debug)]
enum Frame {
    Inlines {
        kind: InlineContainer,
        inlines: Vec<Inline>,
    },
    Blocks {
        kind: BlockContainer,
        blocks: Vec<Block>,
        /// Inline content not wrapped in a paragraph (tight list items).
        pending: Vec<Inline>,
    },
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Code {
        lang: Option<String>,
        code: String,
    },
    Table {
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Row(Vec<Vec<Inline>>),
}

/// Internal state for building a render tree from parser events.
struct TreeBuilder {
    layout: LayoutMode,
    /// Top-level blocks.
    blocks: Vec<Block>,
    /// Top-level inline content outside any paragraph.
    pending: Vec<Inline>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new(layout: LayoutMode) -> Self {
        Self {
            layout,
            blocks: Vec::new(),
            pending: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn paragraph(&self, inlines: Vec<Inline>) -> Block {
        match self.layout {
            LayoutMode::Block => Block::Paragraph(inlines),
            LayoutMode::Inline => Block::Span(inlines),
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self.push_inline(Inline::Code(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                // Never passed through as markup; shown literally
                self.add_text(&html);
            }
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.add_text("\n"),
            Event::FootnoteReference(label) => self.add_text(&format!("[^{label}]")),
            Event::TaskListMarker(checked) => {
                self.add_text(if checked { "[x] " } else { "[ ] " });
            }
            Event::InlineMath(math) => self.add_text(&format!("${math}$")),
            Event::DisplayMath(math) => self.add_text(&format!("$${math}$$")),
            Event::Rule => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        let frame = match tag {
            Tag::Paragraph => Frame::Inlines {
                kind: InlineContainer::Paragraph,
                inlines: Vec::new(),
            },
            Tag::Heading { level, .. } => {
                let kind = match level {
                    HeadingLevel::H1 => InlineContainer::Heading(1),
                    HeadingLevel::H2 => InlineContainer::Heading(2),
                    HeadingLevel::H3 => InlineContainer::Heading(3),
                    _ => InlineContainer::Paragraph,
                };
                Frame::Inlines {
                    kind,
                    inlines: Vec::new(),
                }
            }
            Tag::HtmlBlock => Frame::Inlines {
                kind: InlineContainer::Html,
                inlines: Vec::new(),
            },
            Tag::CodeBlock(kind) => Frame::Code {
                lang: match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                },
                code: String::new(),
            },
            Tag::BlockQuote(_) => Frame::Blocks {
                kind: BlockContainer::BlockQuote,
                blocks: Vec::new(),
                pending: Vec::new(),
            },
            Tag::List(start) => Frame::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Frame::Blocks {
                kind: BlockContainer::Item,
                blocks: Vec::new(),
                pending: Vec::new(),
            },
            Tag::Table(_) => Frame::Table {
                head: Vec::new(),
                rows: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Inlines {
                kind: InlineContainer::Cell,
                inlines: Vec::new(),
            },
            Tag::Link { dest_url, .. } => Frame::Inlines {
                kind: InlineContainer::Link(sanitize_href(&dest_url)),
                inlines: Vec::new(),
            },
            // Not allowlisted: contents flow into the enclosing container
            Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Superscript
            | Tag::Subscript
            | Tag::Image { .. }
            | Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_) => return,
        };
        self.stack.push(frame);
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::HtmlBlock
            | TagEnd::Link
            | TagEnd::TableCell => self.close_inlines(),
            TagEnd::CodeBlock => {
                if let Some(Frame::Code { lang, code }) = self.stack.pop() {
                    self.push_block(Block::CodeBlock { lang, code });
                }
            }
            TagEnd::BlockQuote(_) | TagEnd::Item => self.close_blocks(),
            TagEnd::List(_) => {
                if let Some(Frame::List { start, items }) = self.stack.pop() {
                    self.push_block(Block::List { start, items });
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                let Some(Frame::Row(cells)) = self.stack.pop() else {
                    return;
                };
                if let Some(Frame::Table { head, rows }) = self.stack.last_mut() {
                    if matches!(tag, TagEnd::TableHead) {
                        *head = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            TagEnd::Table => {
                if let Some(Frame::Table { head, rows }) = self.stack.pop() {
                    self.push_block(Block::Table { head, rows });
                }
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::Image
            | TagEnd::FootnoteDefinition
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn close_inlines(&mut self) {
        let Some(Frame::Inlines { kind, mut inlines }) = self.stack.pop() else {
            return;
        };

        match kind {
            InlineContainer::Paragraph => {
                if !inlines.is_empty() {
                    let block = self.paragraph(inlines);
                    self.push_block(block);
                }
            }
            InlineContainer::Heading(level) => {
                self.push_block(Block::Heading {
                    level,
                    content: inlines,
                });
            }
            InlineContainer::Html => {
                if let Some(Inline::Text(text)) = inlines.last_mut() {
                    text.truncate(text.trim_end_matches('\n').len());
                }
                if !inlines.is_empty() {
                    let block = self.paragraph(inlines);
                    self.push_block(block);
                }
            }
            InlineContainer::Link(Some(href)) => self.push_inline(Inline::Link {
                href,
                children: inlines,
            }),
            InlineContainer::Link(None) => {
                for inline in inlines {
                    self.push_inline(inline);
                }
            }
            InlineContainer::Cell => {
                if let Some(Frame::Row(cells)) = self.stack.last_mut() {
                    cells.push(inlines);
                }
            }
        }
    }

    fn close_blocks(&mut self) {
        let Some(Frame::Blocks {
            kind,
            mut blocks,
            pending,
        }) = self.stack.pop()
        else {
            return;
        };

        if !pending.is_empty() {
            blocks.push(self.paragraph(pending));
        }

        match kind {
            BlockContainer::BlockQuote => self.push_block(Block::BlockQuote(blocks)),
            BlockContainer::Item => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(blocks);
                }
            }
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Frame::Code { code, .. }) = self.stack.last_mut() {
            code.push_str(text);
            return;
        }
        self.push_inline(Inline::Text(text.to_string()));
    }

    fn push_inline(&mut self, inline: Inline) {
        let target = match self.stack.last_mut() {
            Some(Frame::Inlines { inlines, .. }) => inlines,
            Some(Frame::Blocks { pending, .. }) => pending,
            None => &mut self.pending,
            // Whitespace between list items or table cells
            Some(Frame::List { .. } | Frame::Table { .. } | Frame::Row(_) | Frame::Code { .. }) => {
                return;
            }
        };
        push_merged(target, inline);
    }

    fn push_block(&mut self, block: Block) {
        let paragraph_layout = self.layout;
        let (blocks, pending) = match self.stack.last_mut() {
            Some(Frame::Blocks {
                blocks, pending, ..
            }) => (blocks, pending),
            None => (&mut self.blocks, &mut self.pending),
            Some(_) => return,
        };

        if !pending.is_empty() {
            let inlines = std::mem::take(pending);
            blocks.push(match paragraph_layout {
                LayoutMode::Block => Block::Paragraph(inlines),
                LayoutMode::Inline => Block::Span(inlines),
            });
        }
        blocks.push(block);
    }

    fn finish(mut self) -> RenderTree {
        // Close anything left open by truncated input
        while let Some(frame) = self.stack.last() {
            match frame {
                Frame::Inlines { .. } => self.close_inlines(),
                Frame::Blocks { .. } => self.close_blocks(),
                Frame::List { .. } => self.end_tag(TagEnd::List(false)),
                Frame::Code { .. } => self.end_tag(TagEnd::CodeBlock),
                Frame::Table { .. } => self.end_tag(TagEnd::Table),
                Frame::Row(_) => self.end_tag(TagEnd::TableRow),
            }
        }

        if !self.pending.is_empty() {
            let inlines = std::mem::take(&mut self.pending);
            let block = self.paragraph(inlines);
            self.blocks.push(block);
        }

        RenderTree {
            layout: self.layout,
            blocks: self.blocks,
        }
    }
}

/// Appends `inline`, merging adjacent text.
fn push_merged(target: &mut Vec<Inline>, inline: Inline) {
    if let (Some(Inline::Text(last)), Inline::Text(text)) = (target.last_mut(), &inline) {
        last.push_str(text);
        return;
    }
    target.push(inline);
}

// ============================================================================
// Output
// ============================================================================

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph(inlines) => {
            out.push_str("<p>");
            write_inlines(inlines, out);
            out.push_str("</p>");
        }
        Block::Span(inlines) => {
            out.push_str("<span class=\"inline\">");
            write_inlines(inlines, out);
            out.push_str("</span>");
        }
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 3);
            out.push_str(&format!("<h{level}>"));
            write_inlines(content, out);
            out.push_str(&format!("</h{level}>"));
        }
        Block::List { start, items } => {
            let tag = match start {
                Some(1) => {
                    out.push_str("<ol>");
                    "ol"
                }
                Some(n) => {
                    out.push_str(&format!("<ol start=\"{n}\">"));
                    "ol"
                }
                None => {
                    out.push_str("<ul>");
                    "ul"
                }
            };
            for item in items {
                out.push_str("<li>");
                for block in item {
                    write_block(block, out);
                }
                out.push_str("</li>");
            }
            out.push_str(&format!("</{tag}>"));
        }
        Block::CodeBlock { lang, code } => {
            match lang.as_deref().filter(|l| is_safe_lang(l)) {
                Some(lang) => out.push_str(&format!("<pre><code class=\"language-{lang}\">")),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape_html(code));
            out.push_str("</code></pre>");
        }
        Block::BlockQuote(blocks) => {
            out.push_str("<blockquote>");
            for block in blocks {
                write_block(block, out);
            }
            out.push_str("</blockquote>");
        }
        Block::Table { head, rows } => {
            out.push_str("<table><thead><tr>");
            for cell in head {
                out.push_str("<th>");
                write_inlines(cell, out);
                out.push_str("</th>");
            }
            out.push_str("</tr></thead><tbody>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str("<td>");
                    write_inlines(cell, out);
                    out.push_str("</td>");
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table>");
        }
    }
}

fn write_inlines(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::Link { href, children } => {
                out.push_str(&format!(
                    "<a href=\"{}\" target=\"{LINK_TARGET}\" rel=\"{LINK_REL}\">",
                    escape_html(href)
                ));
                write_inlines(children, out);
                out.push_str("</a>");
            }
            Inline::Glyph(glyph) => {
                out.push_str("<span class=\"glyph\">");
                out.push_str(&escape_html(glyph));
                out.push_str("</span>");
            }
        }
    }
}

fn is_safe_lang(lang: &str) -> bool {
    !lang.is_empty()
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}

fn block_text(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph(inlines) | Block::Span(inlines) => inline_text(inlines, out),
        Block::Heading { content, .. } => inline_text(content, out),
        Block::List { items, .. } => {
            for block in items.iter().flatten() {
                block_text(block, out);
            }
        }
        Block::CodeBlock { code, .. } => out.push_str(code),
        Block::BlockQuote(blocks) => {
            for block in blocks {
                block_text(block, out);
            }
        }
        Block::Table { head, rows } => {
            for cell in head.iter().chain(rows.iter().flatten()) {
                inline_text(cell, out);
            }
        }
    }
}

fn block_lines(block: &Block, prefix: &str, lines: &mut Vec<String>) {
    match block {
        Block::List { start, items } => {
            for (n, item) in items.iter().enumerate() {
                let marker = match start {
                    Some(start) => format!("{prefix}{}. ", *start + n as u64),
                    None => format!("{prefix}- "),
                };
                let indent = format!("{prefix}{}", " ".repeat(marker.len() - prefix.len()));
                let mut item_lines = Vec::new();
                for block in item {
                    block_lines(block, "", &mut item_lines);
                }
                for (i, line) in item_lines.into_iter().enumerate() {
                    let lead = if i == 0 { &marker } else { &indent };
                    lines.push(format!("{lead}{line}"));
                }
            }
        }
        Block::BlockQuote(blocks) => {
            for block in blocks {
                block_lines(block, &format!("{prefix}> "), lines);
            }
        }
        _ => {
            let mut text = String::new();
            block_text(block, &mut text);
            lines.extend(text.lines().map(|line| format!("{prefix}{line}")));
        }
    }
}

fn inline_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) | Inline::Glyph(text) => out.push_str(text),
            Inline::Link { children, .. } => inline_text(children, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_paragraphs_render_as_blocks() {
        let tree = render_markdown("first\n\nsecond", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![
                Block::Paragraph(vec![text("first")]),
                Block::Paragraph(vec![text("second")])
            ]
        );
        assert_eq!(tree.to_html(), "<p>first</p><p>second</p>");
    }

    #[test]
    fn test_inline_layout_uses_spans() {
        let tree = render_markdown("hello", LayoutMode::Inline);
        assert_eq!(tree.blocks, vec![Block::Span(vec![text("hello")])]);
        assert_eq!(tree.to_html(), "<span class=\"inline\">hello</span>");
    }

    #[test]
    fn test_empty_input() {
        let tree = render_markdown("", LayoutMode::Block);
        assert!(tree.is_empty());
        assert_eq!(tree.to_html(), "");
    }

    #[test]
    fn test_headings_above_three_become_paragraphs() {
        let tree = render_markdown("# One\n\n### Three\n\n#### Four", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![text("One")]
                },
                Block::Heading {
                    level: 3,
                    content: vec![text("Three")]
                },
                Block::Paragraph(vec![text("Four")]),
            ]
        );
    }

    #[test]
    fn test_emphasis_is_flattened() {
        let tree = render_markdown("**bold** and *it* ~~gone~~", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![Block::Paragraph(vec![text("bold and it gone")])]
        );
    }

    #[test]
    fn test_lists() {
        let tree = render_markdown("- a\n- b", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![Block::List {
                start: None,
                items: vec![
                    vec![Block::Paragraph(vec![text("a")])],
                    vec![Block::Paragraph(vec![text("b")])],
                ],
            }]
        );
        assert_eq!(tree.to_html(), "<ul><li><p>a</p></li><li><p>b</p></li></ul>");

        let ordered = render_markdown("3. x\n4. y", LayoutMode::Block);
        assert!(ordered.to_html().starts_with("<ol start=\"3\"><li>"));
    }

    #[test]
    fn test_nested_list() {
        let tree = render_markdown("- outer\n  - inner", LayoutMode::Block);
        let Block::List { items, .. } = &tree.blocks[0] else {
            panic!("expected list, got {:?}", tree.blocks);
        };
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0][1], Block::List { .. }));
        assert_eq!(tree.text(), "outerinner");
    }

    #[test]
    fn test_code_block_and_inline_code() {
        let tree = render_markdown("Use `x < y`\n\n```rust\nfn main() {}\n```", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![
                Block::Paragraph(vec![text("Use "), Inline::Code("x < y".to_string())]),
                Block::CodeBlock {
                    lang: Some("rust".to_string()),
                    code: "fn main() {}\n".to_string()
                },
            ]
        );
        assert_eq!(
            tree.to_html(),
            "<p>Use <code>x &lt; y</code></p><pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_unsafe_code_lang_is_dropped() {
        let tree = render_markdown("```x\" onload=\"y\nz\n```", LayoutMode::Block);
        assert_eq!(tree.to_html(), "<pre><code>z\n</code></pre>");
    }

    #[test]
    fn test_links_carry_noopener() {
        let tree = render_markdown("[docs](https://example.com/a)", LayoutMode::Block);
        assert_eq!(
            tree.to_html(),
            "<p><a href=\"https://example.com/a\" target=\"_blank\" rel=\"noopener noreferrer\">docs</a></p>"
        );
    }

    #[test]
    fn test_script_links_degrade_to_text() {
        let tree = render_markdown("[click](javascript:alert(1)) [rel](/local)", LayoutMode::Block);
        assert_eq!(tree.blocks, vec![Block::Paragraph(vec![text("click rel")])]);
        assert!(!tree.to_html().contains("href"));
    }

    #[test]
    fn test_raw_html_is_literal() {
        let tree = render_markdown("hi <script>alert(1)</script>", LayoutMode::Block);
        let html = tree.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));

        let block = render_markdown("<div onclick=\"x\">\nhello\n</div>", LayoutMode::Block);
        let html = block.to_html();
        assert!(html.starts_with("<p>&lt;div onclick=&quot;x&quot;&gt;"));
        assert!(!html.contains("<div"));
    }

    #[test]
    fn test_blockquote() {
        let tree = render_markdown("> quoted", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![Block::BlockQuote(vec![Block::Paragraph(vec![text("quoted")])])]
        );
        assert_eq!(tree.to_html(), "<blockquote><p>quoted</p></blockquote>");
    }

    #[test]
    fn test_table() {
        let tree = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |", LayoutMode::Block);
        assert_eq!(
            tree.blocks,
            vec![Block::Table {
                head: vec![vec![text("a")], vec![text("b")]],
                rows: vec![vec![vec![text("1")], vec![text("2")]]],
            }]
        );
        assert_eq!(
            tree.to_html(),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_image_becomes_alt_text() {
        let tree = render_markdown("![a cat](https://x/cat.png)", LayoutMode::Block);
        assert_eq!(tree.blocks, vec![Block::Paragraph(vec![text("a cat")])]);
    }

    #[test]
    fn test_rule_is_dropped() {
        let tree = render_markdown("a\n\n---\n\nb", LayoutMode::Block);
        assert_eq!(tree.to_html(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_segments_single_text_uses_block_layout() {
        let tree = render_segments(&[Segment::Text("hi".to_string())]);
        assert_eq!(tree.layout, LayoutMode::Block);
        assert_eq!(tree.to_html(), "<p>hi</p>");
    }

    #[test]
    fn test_segments_mixed_flow_inline() {
        let tree = render_segments(&[
            Segment::Glyph("😊".to_string()),
            Segment::Text("Hello world".to_string()),
            Segment::Glyph("😂".to_string()),
        ]);
        assert_eq!(tree.layout, LayoutMode::Inline);
        assert_eq!(
            tree.blocks,
            vec![
                Block::Span(vec![Inline::Glyph("😊".to_string())]),
                Block::Span(vec![text("Hello world"), Inline::Glyph("😂".to_string())]),
            ]
        );
        assert_eq!(
            tree.to_html(),
            "<span class=\"inline\"><span class=\"glyph\">😊</span></span><span class=\"inline\">Hello world<span class=\"glyph\">😂</span></span>"
        );
    }

    #[test]
    fn test_segments_empty() {
        assert!(render_segments(&[]).is_empty());
    }

    #[test]
    fn test_lines_for_terminal() {
        let tree = render_markdown("Intro\n\n1. one\n2. two\n\n- a\n\n> quoted", LayoutMode::Block);
        assert_eq!(
            tree.lines(),
            vec!["Intro", "1. one", "2. two", "- a", "> quoted"]
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
