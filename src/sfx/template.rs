//! Line-oriented template parameterization
//!
//! Templates carry one `define NAME <default>` line per build option (ca65
//! spells it `.define`) and one `sfxStartAddress = <value>` assignment. The
//! rewrite replaces only the value token of recognized lines; everything else,
//! line endings included, is copied through unchanged.

use super::constants::START_ADDRESS_SYMBOL;
use crate::exceptions::{Result, SfxError};
use log::trace;

const DEFINE_KEYWORD: &str = "define";

/// A named template value with its expected default and its replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: &'static str,
    pub default: &'static str,
    pub value: String,
}

impl Placeholder {
    pub fn new(name: &'static str, default: &'static str, value: impl Into<String>) -> Self {
        Placeholder {
            name,
            default,
            value: value.into(),
        }
    }
}

/// How often a placeholder was seen during a rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMatch {
    /// Lines rewritten (default value found)
    pub replaced: usize,
    /// Lines naming the placeholder with some other value, as (line number, value)
    pub unexpected: Vec<(usize, String)>,
}

/// Result of a rewrite pass
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub text: String,
    /// One entry per placeholder, in table order
    pub matches: Vec<(&'static str, PlaceholderMatch)>,
    /// Number of start address assignments rewritten
    pub start_address_lines: usize,
}

impl Rewrite {
    /// Fail unless every placeholder and the start address matched exactly once
    pub fn check(&self) -> Result<()> {
        let mut problems = Vec::new();

        for (name, m) in &self.matches {
            match (m.replaced, m.unexpected.first()) {
                (1, None) => {}
                (0, Some((line, value))) => problems.push(format!(
                    "{name} has value '{value}' on line {line} instead of its template default"
                )),
                (0, None) => problems.push(format!("{name} not found")),
                (n, _) => problems.push(format!(
                    "{name} matched {} times",
                    n + m.unexpected.len()
                )),
            }
        }

        match self.start_address_lines {
            1 => {}
            0 => problems.push(format!("{START_ADDRESS_SYMBOL} assignment not found")),
            n => problems.push(format!("{START_ADDRESS_SYMBOL} assigned {n} times")),
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SfxError::TemplateMismatch(problems.join("; ")))
        }
    }
}

/// Rewrite a template and report what matched, without judging the result
pub fn rewrite(template: &str, placeholders: &[Placeholder], start_address: u16) -> Rewrite {
    let mut text = String::with_capacity(template.len() + 16);
    let mut matches: Vec<(&'static str, PlaceholderMatch)> = placeholders
        .iter()
        .map(|p| (p.name, PlaceholderMatch::default()))
        .collect();
    let mut start_address_lines = 0;

    for (line_no, line) in template.split_inclusive('\n').enumerate() {
        let (body, ending) = split_line_ending(line);

        if let Some(site) = find_define(body) {
            let position = placeholders.iter().position(|p| p.name == site.name);
            if let Some(i) = position {
                let placeholder = &placeholders[i];
                if site.value == placeholder.default {
                    trace!(
                        "✏️ line {}: {} {} -> {}",
                        line_no + 1,
                        placeholder.name,
                        placeholder.default,
                        placeholder.value
                    );
                    text.push_str(&body[..site.value_start]);
                    text.push_str(&placeholder.value);
                    text.push_str(&body[site.value_start + site.value.len()..]);
                    text.push_str(ending);
                    matches[i].1.replaced += 1;
                    continue;
                }
                matches[i]
                    .1
                    .unexpected
                    .push((line_no + 1, site.value.to_string()));
            }
        } else if let Some(start) = find_start_address(body) {
            trace!("✏️ line {}: {START_ADDRESS_SYMBOL} = {start_address}", line_no + 1);
            text.push_str(&body[..start]);
            text.push_str(&format!("{START_ADDRESS_SYMBOL} = {start_address}"));
            text.push_str(ending);
            start_address_lines += 1;
            continue;
        }

        text.push_str(line);
    }

    Rewrite {
        text,
        matches,
        start_address_lines,
    }
}

/// Produce variant source text; every placeholder must match exactly once
pub fn parameterize(
    template: &str,
    placeholders: &[Placeholder],
    start_address: u16,
) -> Result<String> {
    let rewrite = rewrite(template, placeholders, start_address);
    rewrite.check()?;
    Ok(rewrite.text)
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, &line[body.len()..])
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, &line[body.len()..])
    } else {
        (line, "")
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Index just past a run of blanks starting at `from`, if the run is non-empty
fn skip_blanks(bytes: &[u8], from: usize) -> Option<usize> {
    let end = bytes[from..]
        .iter()
        .position(|&b| !is_blank(b))
        .map_or(bytes.len(), |n| from + n);
    (end > from).then_some(end)
}

/// Start of `word` in `body` as a whole word (not preceded by an identifier byte)
fn find_word(body: &str, word: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut from = 0;
    while let Some(found) = body[from..].find(word) {
        let start = from + found;
        let end = start + word.len();
        let clean_left = start == 0 || !is_ident_byte(bytes[start - 1]);
        let clean_right = end == bytes.len() || !is_ident_byte(bytes[end]);
        if clean_left && clean_right {
            return Some(start);
        }
        from = end;
    }
    None
}

#[derive(Debug)]
struct DefineSite<'a> {
    name: &'a str,
    value: &'a str,
    value_start: usize,
}

fn find_define(body: &str) -> Option<DefineSite<'_>> {
    let bytes = body.as_bytes();
    let keyword = find_word(body, DEFINE_KEYWORD)?;

    let name_start = skip_blanks(bytes, keyword + DEFINE_KEYWORD.len())?;
    let name_len = bytes[name_start..]
        .iter()
        .take_while(|&&b| is_ident_byte(b))
        .count();
    if name_len == 0 {
        return None;
    }
    let name_end = name_start + name_len;

    let value_start = skip_blanks(bytes, name_end)?;
    let value_len = bytes[value_start..]
        .iter()
        .take_while(|&&b| !b.is_ascii_whitespace() && b != b';')
        .count();
    if value_len == 0 {
        return None;
    }

    Some(DefineSite {
        name: &body[name_start..name_end],
        value: &body[value_start..value_start + value_len],
        value_start,
    })
}

/// Position of `sfxStartAddress` when the line assigns it
fn find_start_address(body: &str) -> Option<usize> {
    let start = find_word(body, START_ADDRESS_SYMBOL)?;
    let rest = body[start + START_ADDRESS_SYMBOL.len()..].trim_start_matches([' ', '\t']);
    let is_assignment = rest.starts_with('=') && !rest.starts_with("==");
    is_assignment.then_some(start)
}
