//! Narrow markdown scanning: headings outside code fences, section bodies,
//! list and checklist items, fenced code blocks and placeholder detection.
//!
//! A fence opened with N backticks (or tildes) is only closed by a bare fence
//! of the same character at least N long, so a ```` ```` ```` block can quote a
//! ```` ``` ```` block without confusing the scanner.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: u8,
    pub title: String,
    /// Lines after the heading up to the next heading of the same or higher
    /// level. Nested subsections are included.
    pub body: String,
}

impl Section {
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info string after the opening fence, lowercased (`gherkin`, `rust`, ...).
    pub info: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    ch: char,
    len: usize,
}

fn parse_fence(line: &str) -> Option<(Fence, &str)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    Some((Fence { ch, len }, trimmed[len..].trim()))
}

fn closes(open: Fence, line: &str) -> bool {
    matches!(parse_fence(line), Some((f, rest)) if f.ch == open.ch && f.len >= open.len && rest.is_empty())
}

/// A line of the document annotated with whether it sits inside a fence.
/// Fence delimiter lines themselves count as fenced.
fn annotate(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut open: Option<Fence> = None;
    for line in text.lines() {
        match open {
            Some(fence) => {
                if closes(fence, line) {
                    open = None;
                }
                out.push((line, true));
            }
            None => {
                if let Some((fence, _)) = parse_fence(line) {
                    open = Some(fence);
                    out.push((line, true));
                } else {
                    out.push((line, false));
                }
            }
        }
    }
    out
}

fn heading(line: &str) -> Option<(u8, String)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level as u8, rest.trim().trim_end_matches('#').trim().to_string()))
}

/// All sections in document order.
pub fn sections(text: &str) -> Vec<Section> {
    let lines = annotate(text);
    let headings: Vec<(usize, u8, String)> = lines
        .iter()
        .enumerate()
        .filter(|(_, (_, fenced))| !fenced)
        .filter_map(|(i, (line, _))| heading(line).map(|(lvl, title)| (i, lvl, title)))
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(h, (start, level, title))| {
            let end = headings[h + 1..]
                .iter()
                .find(|(_, lvl, _)| lvl <= level)
                .map(|(i, _, _)| *i)
                .unwrap_or(lines.len());
            let body = lines[start + 1..end]
                .iter()
                .map(|(l, _)| *l)
                .collect::<Vec<_>>()
                .join("\n");
            Section {
                level: *level,
                title: title.clone(),
                body,
            }
        })
        .collect()
}

/// Lowercased words of a title with punctuation and a leading section number
/// (`2.`, `3)`, `1.2`) dropped.
fn normalize(s: &str) -> String {
    let cleaned = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut words = cleaned.split_whitespace().peekable();
    while words
        .peek()
        .is_some_and(|w| w.chars().all(|c| c.is_ascii_digit()))
    {
        words.next();
    }
    words.collect::<Vec<_>>().join(" ")
}

/// First section below the document title whose title equals `name`, ignoring
/// case, punctuation and numbering, so `## 2. User Persona` matches
/// `"User Persona"`. Level-1 headings are the document title and never match.
pub fn section(text: &str, name: &str) -> Option<Section> {
    let needle = normalize(name);
    sections(text)
        .into_iter()
        .find(|s| s.level > 1 && normalize(&s.title) == needle)
}

/// Top-level fenced code blocks. Fences nested inside a longer fence are
/// part of the outer block's content.
pub fn code_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(Fence, String, Vec<&str>)> = None;
    for line in text.lines() {
        match current.take() {
            Some((fence, info, mut content)) => {
                if closes(fence, line) {
                    blocks.push(CodeBlock {
                        info,
                        content: content.join("\n"),
                    });
                } else {
                    content.push(line);
                    current = Some((fence, info, content));
                }
            }
            None => {
                if let Some((fence, info)) = parse_fence(line) {
                    let info = info
                        .split_whitespace()
                        .next()
                        .unwrap_or("")
                        .to_lowercase();
                    current = Some((fence, info, Vec::new()));
                }
            }
        }
    }
    // An unclosed fence runs to the end of the document.
    if let Some((_, info, content)) = current {
        blocks.push(CodeBlock {
            info,
            content: content.join("\n"),
        });
    }
    blocks
}

static LIST_RE: OnceLock<Regex> = OnceLock::new();

fn list_re() -> &'static Regex {
    LIST_RE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.*)$").unwrap())
}

static CHECK_RE: OnceLock<Regex> = OnceLock::new();

fn check_re() -> &'static Regex {
    CHECK_RE.get_or_init(|| Regex::new(r"^\s*[-*+]\s+\[([ xX])\]\s*(.*)$").unwrap())
}

/// Bullet or numbered list items outside fences, checkbox markers stripped.
pub fn list_items(body: &str) -> Vec<String> {
    annotate(body)
        .into_iter()
        .filter(|(_, fenced)| !fenced)
        .filter_map(|(line, _)| {
            if let Some(c) = check_re().captures(line) {
                return Some(c[2].trim().to_string());
            }
            list_re().captures(line).map(|c| c[1].trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// `- [ ] item` / `- [x] item` entries outside fences as `(checked, text)`.
pub fn checklist(body: &str) -> Vec<(bool, String)> {
    annotate(body)
        .into_iter()
        .filter(|(_, fenced)| !fenced)
        .filter_map(|(line, _)| {
            check_re()
                .captures(line)
                .map(|c| (&c[1] != " ", c[2].trim().to_string()))
        })
        .collect()
}

/// Prose lines of a section: outside fences, not headings, not blank.
pub fn prose_lines(body: &str) -> Vec<&str> {
    annotate(body)
        .into_iter()
        .filter(|(line, fenced)| !fenced && heading(line).is_none() && !line.trim().is_empty())
        .map(|(line, _)| line)
        .collect()
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

static BRACKET_RE: OnceLock<Regex> = OnceLock::new();

fn bracket_re() -> &'static Regex {
    BRACKET_RE.get_or_init(|| Regex::new(r"\[([^\[\]\n]+)\]").unwrap())
}

static MUSTACHE_RE: OnceLock<Regex> = OnceLock::new();

fn mustache_re() -> &'static Regex {
    MUSTACHE_RE.get_or_init(|| Regex::new(r"\{\{[^{}\n]*\}\}").unwrap())
}

/// Unfilled template prompts in `text`, deduplicated in order of appearance.
///
/// Recognized: bracket prompts such as `[Describe the problem]` (links,
/// reference links, footnotes and checkboxes excluded), `{{mustache}}`
/// markers, and any of `tokens` appearing as a whole word.
pub fn find_placeholders(text: &str, tokens: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        if !found.iter().any(|f| f == s) {
            found.push(s.to_string());
        }
    };

    for m in bracket_re().captures_iter(text) {
        let whole = m.get(0).map(|g| g.as_str()).unwrap_or_default();
        let inner = &m[1];
        let end = m.get(0).map(|g| g.end()).unwrap_or(0);
        let follows = text[end..].chars().next();
        let is_link = matches!(follows, Some('(') | Some('[') | Some(':'));
        let is_checkbox = matches!(inner, " " | "x" | "X");
        let is_footnote = inner.starts_with('^');
        if is_link || is_checkbox || is_footnote || !inner.chars().any(char::is_alphabetic) {
            continue;
        }
        push(whole);
    }

    for m in mustache_re().find_iter(text) {
        push(m.as_str());
    }

    for token in tokens.iter().filter(|t| !t.trim().is_empty()) {
        let pattern = format!(r"\b{}\b", regex::escape(token));
        if let Ok(re) = Regex::new(&pattern) {
            if re.is_match(text) {
                push(token);
            }
        }
    }

    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
