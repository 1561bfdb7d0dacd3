//! Minimal stylesheet event stream.
//!
//! This is not a CSS parser: it only splits text into declarations, block ends and
//! everything else, so the rewrite pass can replace single declarations while
//! printing every untouched byte back unchanged.

use crate::config::{MappingMode, SpritemapConfig};
use crate::paths::normalize;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// A `property: value` declaration inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Raw text without the terminating `;`.
    pub text: String,
    /// 1-based line of the first character, for diagnostics.
    pub line: usize,
    /// Whether the source terminated the declaration with `;`.
    pub terminated: bool,
}

impl Declaration {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
            terminated: true,
        }
    }

    /// Lowercased property name and trimmed value.
    pub fn split(&self) -> Option<(String, &str)> {
        split_declaration(&self.text)
    }

    pub fn property(&self) -> Option<String> {
        self.split().map(|(prop, _)| prop)
    }

    /// Whether the value ends with `!important` (`! important` too).
    pub fn is_important(&self) -> bool {
        self.text
            .trim_end()
            .to_ascii_lowercase()
            .strip_suffix("important")
            .is_some_and(|rest| rest.trim_end().ends_with('!'))
    }
}

/// Splits `property: value` into a lowercased property and the trimmed value.
pub fn split_declaration(text: &str) -> Option<(String, &str)> {
    let (prop, value) = text.split_once(':')?;
    let prop = prop.trim();
    if prop.is_empty() {
        return None;
    }
    Some((prop.to_ascii_lowercase(), value.trim()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssEvent {
    Declaration(Declaration),
    /// A closing `}`.
    BlockEnd,
    /// Selectors, block openings, comments, whitespace and at-rules, verbatim.
    Other(String),
}

impl CssEvent {
    pub fn to_css(&self) -> Cow<'_, str> {
        match self {
            CssEvent::Declaration(d) if d.terminated => Cow::Owned(format!("{};", d.text)),
            CssEvent::Declaration(d) => Cow::Borrowed(&d.text),
            CssEvent::BlockEnd => Cow::Borrowed("}"),
            CssEvent::Other(s) => Cow::Borrowed(s),
        }
    }
}

/// Splits stylesheet text into events.
pub fn parse_stylesheet(text: &str) -> Vec<CssEvent> {
    let mut lexer = Lexer {
        src: text,
        events: Vec::new(),
        depth: 0,
        seg_start: 0,
        line: 1,
        line_pos: 0,
    };
    lexer.run();
    lexer.events
}

struct Lexer<'a> {
    src: &'a str,
    events: Vec<CssEvent>,
    depth: usize,
    seg_start: usize,
    line: usize,
    line_pos: usize,
}

impl Lexer<'_> {
    fn run(&mut self) {
        let bytes = self.src.as_bytes();
        let mut parens = 0usize;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let end = self.src[i + 2..]
                        .find("*/")
                        .map(|p| i + 2 + p + 2)
                        .unwrap_or(bytes.len());
                    if self.src[self.seg_start..i].trim().is_empty() {
                        self.push_other(self.seg_start, i);
                        self.push_other(i, end);
                        self.seg_start = end;
                    }
                    i = end;
                    continue;
                }
                q @ (b'"' | b'\'') => {
                    let mut j = i + 1;
                    while j < bytes.len() && bytes[j] != q {
                        if bytes[j] == b'\\' {
                            j += 1;
                        }
                        j += 1;
                    }
                    i = j.min(bytes.len());
                }
                b'(' => parens += 1,
                b')' => parens = parens.saturating_sub(1),
                b';' if parens == 0 => {
                    self.segment(i, true);
                    self.seg_start = i + 1;
                }
                b'{' if parens == 0 => {
                    self.push_other(self.seg_start, i + 1);
                    self.seg_start = i + 1;
                    self.depth += 1;
                }
                b'}' if parens == 0 => {
                    self.segment(i, false);
                    self.events.push(CssEvent::BlockEnd);
                    self.seg_start = i + 1;
                    self.depth = self.depth.saturating_sub(1);
                }
                _ => {}
            }
            i += 1;
        }
        self.push_other(self.seg_start, bytes.len());
    }

    /// Emits `src[seg_start..end]`, split into leading whitespace and a body.
    fn segment(&mut self, end: usize, terminated: bool) {
        let seg = &self.src[self.seg_start..end];
        let body = seg.trim_start();
        let body_start = end - body.len();
        self.push_other(self.seg_start, body_start);
        if body.is_empty() {
            if terminated {
                self.events.push(CssEvent::Other(";".into()));
            }
            return;
        }
        if self.depth > 0 && body.contains(':') && !body.starts_with('@') {
            let line = self.line_of(body_start);
            self.events.push(CssEvent::Declaration(Declaration {
                text: body.to_string(),
                line,
                terminated,
            }));
        } else {
            let mut raw = body.to_string();
            if terminated {
                raw.push(';');
            }
            self.events.push(CssEvent::Other(raw));
        }
    }

    fn push_other(&mut self, start: usize, end: usize) {
        if start < end {
            self.events
                .push(CssEvent::Other(self.src[start..end].to_string()));
        }
    }

    fn line_of(&mut self, offset: usize) -> usize {
        self.line += self.src[self.line_pos..offset].matches('\n').count();
        self.line_pos = offset;
        self.line
    }
}

/// Writes events back as stylesheet text.
pub fn print_css<W: Write>(events: &[CssEvent], out: &mut W) -> std::io::Result<()> {
    for ev in events {
        out.write_all(ev.to_css().as_bytes())?;
    }
    Ok(())
}

pub fn to_css_string(events: &[CssEvent]) -> String {
    events.iter().map(|e| e.to_css()).collect()
}

/// `spritemapper.<key> = <value>` lines from the comments heading a stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub entries: Vec<(String, String)>,
}

impl Directives {
    /// Reads comments that appear before the first rule.
    pub fn from_events(events: &[CssEvent]) -> Self {
        let mut entries = Vec::new();
        for ev in events {
            let CssEvent::Other(text) = ev else { break };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with("/*") {
                break;
            }
            let body = trimmed.trim_start_matches("/*").trim_end_matches("*/");
            for line in body.lines() {
                let line = line.trim().trim_start_matches('*').trim();
                let Some(rest) = line.strip_prefix("spritemapper.") else {
                    continue;
                };
                if let Some((key, value)) = rest.split_once('=') {
                    entries.push((key.trim().to_string(), value.trim().to_string()));
                }
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `base` with the stylesheet-level overrides applied. A relative
    /// `output_image` is taken relative to `css_dir`.
    pub fn apply_to(&self, base: &SpritemapConfig, css_dir: &Path) -> SpritemapConfig {
        let mut cfg = base.clone();
        for (key, value) in &self.entries {
            match key.as_str() {
                "output_image" => {
                    cfg.output_image = Some(normalize(&css_dir.join(value)));
                    cfg.mapping = MappingMode::Fixed;
                }
                "base_url" => cfg.base_url = Some(value.clone()),
                "css_suffix" => cfg.css_suffix = value.clone(),
                other => warn!(key = other, "ignoring unknown stylesheet directive"),
            }
        }
        cfg
    }
}
