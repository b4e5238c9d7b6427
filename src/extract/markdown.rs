//! HTML to Markdown conversion
//!
//! A structural mapping only: headings, paragraphs, lists, code blocks,
//! quotes, rules and tables become their Markdown equivalents; emphasis,
//! inline code, links and images become inline syntax. Nothing is invented
//! that the source does not contain. Link and image targets are resolved to
//! absolute URLs against the page's URL.
//!
//! Text is escaped so it stays text: inline metacharacters always, and
//! block markers (`#`, `>`, `-`, `1.`) when they would open a line. Code
//! spans and code blocks are emitted verbatim.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use url::Url;

/// Elements that start a new block
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "dialog",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Elements whose content never appears in the output
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "title", "meta", "link", "button",
    "select", "input", "textarea", "svg",
];

/// Class prefixes that carry a code block's language
const LANGUAGE_PREFIXES: &[&str] = &["language-", "lang-", "highlight-"];

/// Characters that would otherwise be read as inline Markdown syntax
const INLINE_METACHARACTERS: &[char] = &['\\', '*', '_', '[', ']', '`'];

/// Fence markers, as emitted by code blocks
const FENCES: &[&str] = &["```", "~~~~"];

/// A rendered block, before blocks are joined
#[derive(Debug)]
enum Block {
    Flow(String),
    List(String),
}

impl Block {
    fn text(&self) -> &str {
        match self {
            Self::Flow(text) | Self::List(text) => text,
        }
    }
}

/// Converts content regions to Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter {
    base_url: Option<Url>,
}

impl MarkdownConverter {
    /// Resolves link and image targets against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }

    /// Keeps link and image targets exactly as written
    pub fn without_base() -> Self {
        Self::default()
    }

    /// Converts the element and everything under it
    pub fn convert(&self, region: ElementRef<'_>) -> String {
        let blocks = if is_block(region.value().name()) && !is_container(region.value().name()) {
            let mut blocks = Vec::new();
            self.block_element(*region, region.value().name(), &mut blocks);
            blocks
        } else {
            self.blocks(*region)
        };

        let joined = blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n\n");

        tidy_document(&joined)
    }

    /// Renders the children of `parent` as a sequence of blocks
    fn blocks(&self, parent: NodeRef<'_, Node>) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut inline = String::new();

        for child in parent.children() {
            match child.value() {
                Node::Text(text) => inline.push_str(&escape_text(text)),
                Node::Element(element) => {
                    let name = element.name();
                    if SKIPPED_TAGS.contains(&name) {
                        continue;
                    }
                    if is_block(name) {
                        flush_paragraph(&mut inline, &mut blocks);
                        self.block_element(child, name, &mut blocks);
                    } else {
                        inline.push_str(&self.inline_element(child, name));
                    }
                }
                _ => {}
            }
        }

        flush_paragraph(&mut inline, &mut blocks);
        blocks
    }

    fn block_element(&self, node: NodeRef<'_, Node>, name: &str, blocks: &mut Vec<Block>) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let text = single_line(&self.inline_content(node));
                if !text.is_empty() {
                    blocks.push(Block::Flow(format!("{} {}", "#".repeat(level), text)));
                }
            }
            "ul" | "ol" => {
                let list = self.list(node, name == "ol");
                if !list.is_empty() {
                    blocks.push(Block::List(list));
                }
            }
            "pre" => {
                if let Some(code) = self.code_block(node) {
                    blocks.push(Block::Flow(code));
                }
            }
            "blockquote" => {
                let inner = join_blocks(&self.blocks(node));
                if !inner.is_empty() {
                    let quoted = inner
                        .lines()
                        .map(|line| {
                            if line.is_empty() {
                                ">".to_string()
                            } else {
                                format!("> {}", line)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    blocks.push(Block::Flow(quoted));
                }
            }
            "hr" => blocks.push(Block::Flow("---".to_string())),
            "table" => {
                if let Some(table) = self.table(node) {
                    blocks.push(Block::Flow(table));
                }
            }
            _ => blocks.extend(self.blocks(node)),
        }
    }

    /// Renders an element in inline context
    fn inline_element(&self, node: NodeRef<'_, Node>, name: &str) -> String {
        match name {
            "br" => "\\\n".to_string(),
            "a" => self.link(node),
            "img" => self.image(node),
            "strong" | "b" => wrap_inline(&self.inline_content(node), "**", "**"),
            "em" | "i" => wrap_inline(&self.inline_content(node), "*", "*"),
            "del" | "s" | "strike" => wrap_inline(&self.inline_content(node), "~~", "~~"),
            "code" | "kbd" | "samp" | "tt" => inline_code(&raw_text(node)),
            _ if SKIPPED_TAGS.contains(&name) => String::new(),
            _ => self.inline_content(node),
        }
    }

    /// Flattens all children into inline text
    fn inline_content(&self, node: NodeRef<'_, Node>) -> String {
        let mut out = String::new();
        for child in node.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_text(text)),
                Node::Element(element) => {
                    let name = element.name();
                    let rendered = self.inline_element(child, name);
                    if is_block(name) && !rendered.is_empty() {
                        out.push(' ');
                        out.push_str(&rendered);
                        out.push(' ');
                    } else {
                        out.push_str(&rendered);
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn link(&self, node: NodeRef<'_, Node>) -> String {
        let content = self.inline_content(node);
        let href = ElementRef::wrap(node).and_then(|e| e.value().attr("href"));

        match href.and_then(|href| self.resolve(href)) {
            Some(target) => wrap_inline(&content, "[", &format!("]({})", target)),
            None => content,
        }
    }

    fn image(&self, node: NodeRef<'_, Node>) -> String {
        let Some(element) = ElementRef::wrap(node) else {
            return String::new();
        };
        let Some(src) = element.value().attr("src").and_then(|src| self.resolve(src)) else {
            return String::new();
        };
        let alt = escape_text(&single_line(element.value().attr("alt").unwrap_or("")));
        format!("![{}]({})", alt, src)
    }

    /// Resolves an href to an absolute target, if it is navigable
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }

        match &self.base_url {
            Some(base) => base.join(href).ok().map(|url| url.to_string()),
            None => Some(href.to_string()),
        }
    }

    fn list(&self, node: NodeRef<'_, Node>, ordered: bool) -> String {
        let mut index = if ordered {
            ElementRef::wrap(node)
                .and_then(|e| e.value().attr("start"))
                .and_then(|start| start.trim().parse::<usize>().ok())
                .unwrap_or(1)
        } else {
            1
        };

        let mut items: Vec<String> = Vec::new();

        for child in node.children() {
            let Some(element) = ElementRef::wrap(child) else {
                continue;
            };

            match element.value().name() {
                "li" => {
                    let marker = if ordered {
                        format!("{}. ", index)
                    } else {
                        "- ".to_string()
                    };
                    index += 1;

                    let item_blocks = self.blocks(child);
                    if item_blocks.is_empty() {
                        continue;
                    }

                    let indent = " ".repeat(marker.len());
                    let mut item = String::new();
                    for (i, block) in item_blocks.iter().enumerate() {
                        if i == 0 {
                            item.push_str(&marker);
                            item.push_str(&indent_continuation(block.text(), &indent));
                        } else {
                            item.push_str(match block {
                                Block::List(_) => "\n",
                                Block::Flow(_) => "\n\n",
                            });
                            item.push_str(&indent_all(block.text(), &indent));
                        }
                    }
                    items.push(item);
                }
                // Lists nested directly in lists belong to the previous item
                name @ ("ul" | "ol") => {
                    let nested = self.list(child, name == "ol");
                    if nested.is_empty() {
                        continue;
                    }
                    match items.last_mut() {
                        Some(last) => {
                            last.push('\n');
                            last.push_str(&indent_all(&nested, "  "));
                        }
                        None => items.push(nested),
                    }
                }
                _ => {}
            }
        }

        items.join("\n")
    }

    fn code_block(&self, pre: NodeRef<'_, Node>) -> Option<String> {
        let element = ElementRef::wrap(pre)?;
        let text: String = element.text().collect();
        let code = text.trim_matches('\n').trim_end();
        if code.trim().is_empty() {
            return None;
        }

        let language = element
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "code")
            .and_then(language_hint)
            .or_else(|| language_hint(element))
            .or_else(|| {
                element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .take(2)
                    .find_map(language_hint)
            })
            .unwrap_or_default();

        let fence = if code.contains("```") { "~~~~" } else { "```" };
        Some(format!("{}{}\n{}\n{}", fence, language, code, fence))
    }

    fn table(&self, table: NodeRef<'_, Node>) -> Option<String> {
        let table_id = table.id();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for row in table.descendants().filter_map(ElementRef::wrap) {
            if row.value().name() != "tr" {
                continue;
            }
            let owner = row
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "table");
            if owner.map(|e| e.id()) != Some(table_id) {
                continue;
            }

            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| single_line(&self.inline_content(*cell)).replace('|', "\\|"))
                .collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        let columns = rows.iter().map(Vec::len).max()?;
        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (i, row) in rows.iter().enumerate() {
            let mut cells = row.clone();
            cells.resize(columns, String::new());
            lines.push(format!("| {} |", cells.join(" | ")));
            if i == 0 {
                lines.push(format!("|{}", " --- |".repeat(columns)));
            }
        }

        Some(lines.join("\n"))
    }
}

/// Converts `region` to Markdown, resolving links against `base_url`
pub fn to_markdown(region: ElementRef<'_>, base_url: &Url) -> String {
    MarkdownConverter::new(base_url.clone()).convert(region)
}

fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Blocks that are rendered by rendering their children
fn is_container(name: &str) -> bool {
    !matches!(
        name,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "pre" | "blockquote" | "hr" | "table"
    )
}

fn language_hint(element: ElementRef<'_>) -> Option<String> {
    if let Some(lang) = element.value().attr("data-lang") {
        let lang = lang.trim();
        if !lang.is_empty() {
            return Some(lang.to_string());
        }
    }

    element.value().classes().find_map(|class| {
        LANGUAGE_PREFIXES.iter().find_map(|prefix| {
            class
                .strip_prefix(prefix)
                .filter(|lang| !lang.is_empty() && *lang != "default" && *lang != "none")
                .map(str::to_string)
        })
    })
}

fn raw_text(node: NodeRef<'_, Node>) -> String {
    ElementRef::wrap(node)
        .map(|e| e.text().collect())
        .unwrap_or_default()
}

fn inline_code(text: &str) -> String {
    let code = collapse_whitespace(text);
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }
    if code.contains('`') {
        format!("`` {} ``", code)
    } else {
        format!("`{}`", code)
    }
}

/// Wraps the trimmed content in markers, keeping outer spacing outside them
fn wrap_inline(content: &str, open: &str, close: &str) -> String {
    let core = content.trim();
    if core.is_empty() {
        return if content.is_empty() { String::new() } else { " ".to_string() };
    }

    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{}{}{}{}{}", lead, open, core, close, trail)
}

/// Replaces every whitespace run with a single space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Collapses whitespace and escapes inline syntax in a text node
fn escape_text(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let mut out = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if INLINE_METACHARACTERS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes the start of a paragraph line that would otherwise open a block
fn escape_line_start(line: &str) -> String {
    let Some(first) = line.chars().next() else {
        return String::new();
    };
    let rest = &line[first.len_utf8()..];

    let opens_block = match first {
        '#' | '>' => true,
        // List items, thematic breaks and setext underlines
        '-' | '+' => rest.starts_with(' ') || rest.chars().all(|c| c == first),
        '=' => rest.chars().all(|c| c == '='),
        '~' => rest.starts_with("~~"),
        _ => false,
    };
    if opens_block {
        return format!("\\{}", line);
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if (1..=9).contains(&digits) {
        let after = &line[digits..];
        let delimited = after.starts_with('.') || after.starts_with(')');
        if delimited && (after.len() == 1 || after[1..].starts_with(' ')) {
            return format!("{}\\{}", &line[..digits], after);
        }
    }

    line.to_string()
}

/// Number of backslashes ending `text`
fn trailing_backslashes(text: &str) -> usize {
    text.len() - text.trim_end_matches('\\').len()
}

fn single_line(text: &str) -> String {
    text.replace("\\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns accumulated inline text into a paragraph block
fn flush_paragraph(inline: &mut String, blocks: &mut Vec<Block>) {
    let lines: Vec<String> = inline
        .split('\n')
        .map(|line| {
            line.split(' ')
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .map(|line| escape_line_start(&line))
        .collect();
    inline.clear();

    let mut paragraph = lines
        .into_iter()
        .skip_while(|line| line.is_empty() || line == "\\")
        .collect::<Vec<_>>()
        .join("\n");

    // A hard break with nothing after it is dropped; escaped backslashes pair up
    loop {
        let trimmed = paragraph.trim_end();
        if trailing_backslashes(trimmed) % 2 == 1 {
            paragraph = trimmed[..trimmed.len() - 1].to_string();
        } else {
            paragraph = trimmed.to_string();
            break;
        }
    }

    if !paragraph.is_empty() {
        blocks.push(Block::Flow(paragraph));
    }
}

fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn indent_continuation(text: &str, indent: &str) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out
}

fn indent_all(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips indentation and blockquote markers from a line
fn strip_quotes(line: &str) -> &str {
    let mut rest = line.trim_start();
    while let Some(inner) = rest.strip_prefix('>') {
        rest = inner.trim_start();
    }
    rest
}

/// The fence a line opens, looking past its quote and list markers
fn opening_fence(line: &str) -> Option<&'static str> {
    let mut rest = strip_quotes(line);
    if let Some(item) = rest.strip_prefix("- ") {
        rest = item;
    } else {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if let Some(item) = rest[digits..].strip_prefix(". ").filter(|_| digits > 0) {
            rest = item;
        }
    }
    let rest = rest.trim_start();
    FENCES.iter().copied().find(|fence| rest.starts_with(fence))
}

/// Trims line ends and collapses blank-line runs, leaving fenced code alone
fn tidy_document(markdown: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;

    for line in markdown.lines() {
        match fence {
            Some(marker) => {
                out.push(line);
                if strip_quotes(line).trim_end() == marker {
                    fence = None;
                }
            }
            None => {
                fence = opening_fence(line);
                let line = line.trim_end();
                if line.is_empty() && out.last().map_or(true, |last| last.trim().is_empty()) {
                    continue;
                }
                out.push(line);
            }
        }
    }

    while out.last().map_or(false, |last| last.trim().is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        return String::new();
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}
