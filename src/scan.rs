//! Textual region scanning for element attributes.
//!
//! Tag boundaries are found by pattern, not by parsing: an opening tag starts
//! at `<name` and ends at the first `>` outside quotes and outside `{...}`
//! expression braces. This is enough to bound JSX/TSX and HTML opening tags
//! (including multi-line and self-closing ones) without a syntax tree. The
//! rule engine only sees [`Region`]s, so a stricter scanner can be swapped in
//! behind [`RegionScanner`].

use std::collections::VecDeque;
use std::ops::Range;

/// The attribute-bearing span of one element of a target tag kind.
///
/// Regions borrow the document text and are only valid for that exact text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<'a> {
    /// Tag kind, e.g. `button`
    pub tag: &'a str,
    /// Span of the whole opening tag, `<` through `>`
    pub tag_span: Range<usize>,
    /// Attribute name, e.g. `className`
    pub attribute: &'a str,
    /// Raw attribute value, without quotes
    pub value: &'a str,
    /// Absolute span of `value` within the document
    pub value_span: Range<usize>,
}

/// Produces the regions of a document a rule set should look at.
pub trait RegionScanner {
    fn regions<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Region<'a>> + 'a>;
}

/// Scanner that matches opening tags of the configured kinds and extracts
/// string-literal values of the configured attributes.
#[derive(Debug, Clone)]
pub struct TagScanner {
    tags: Vec<String>,
    attributes: Vec<String>,
    canonical: Vec<String>,
}

impl TagScanner {
    pub fn new<T, A>(tags: T, attributes: A) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            attributes: attributes.into_iter().map(Into::into).collect(),
            canonical: Vec::new(),
        }
    }

    /// Tag kinds that are the reference implementation of the convention
    /// and must never be scanned, even when listed as targets.
    pub fn with_canonical<C>(mut self, canonical: C) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.canonical = canonical.into_iter().map(Into::into).collect();
        self
    }

    fn is_target(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name) && !self.canonical.iter().any(|c| c == name)
    }

    fn is_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Lazily iterate the regions of `text`.
    pub fn scan<'a>(&'a self, text: &'a str) -> Regions<'a> {
        Regions {
            scanner: self,
            text,
            cursor: 0,
            pending: VecDeque::new(),
        }
    }
}

impl RegionScanner for TagScanner {
    fn regions<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Region<'a>> + 'a> {
        Box::new(self.scan(text))
    }
}

/// Iterator returned by [`TagScanner::scan`].
pub struct Regions<'a> {
    scanner: &'a TagScanner,
    text: &'a str,
    cursor: usize,
    pending: VecDeque<Region<'a>>,
}

impl<'a> Iterator for Regions<'a> {
    type Item = Region<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(region) = self.pending.pop_front() {
                return Some(region);
            }

            let open = self.cursor + self.text.get(self.cursor..)?.find('<')?;
            self.cursor = open + 1;

            let bytes = self.text.as_bytes();
            let Some(name_end) = tag_name_end(bytes, open + 1) else {
                continue;
            };
            let name = &self.text[open + 1..name_end];
            if !self.scanner.is_target(name) {
                continue;
            }

            // Unterminated tag: no region, keep scanning after the '<'
            let Some(tag_end) = opening_tag_end(bytes, name_end) else {
                continue;
            };
            self.cursor = tag_end;

            for (attr, value) in literal_attributes(bytes, name_end, tag_end - 1) {
                let attribute = &self.text[attr];
                if !self.scanner.is_attribute(attribute) {
                    continue;
                }
                self.pending.push_back(Region {
                    tag: name,
                    tag_span: open..tag_end,
                    attribute,
                    value: &self.text[value.clone()],
                    value_span: value,
                });
            }
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')
}

/// End of a tag name starting at `start`, if it is followed by a byte that
/// can legally follow a tag name. `<buttonGroup` is not `<button`.
fn tag_name_end(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start)?.is_ascii_alphabetic() {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    match bytes.get(end)? {
        b'>' | b'/' => Some(end),
        b if b.is_ascii_whitespace() => Some(end),
        _ => None,
    }
}

/// Offset one past the `>` closing the opening tag.
fn opening_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            // Backslash escapes only exist inside JS expressions
            Some(_) if b == b'\\' && depth > 0 => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(i + 1),
                _ => {}
            },
        }
        i += 1;
    }

    None
}

/// Offset one past the `}` matching the `{` at `open`.
fn braced_end(bytes: &[u8], open: usize, limit: usize) -> usize {
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = open;

    while i < limit {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    limit
}

/// If `inner` holds exactly one string literal (ignoring surrounding
/// whitespace), the span of its contents.
fn single_literal(bytes: &[u8], inner: Range<usize>) -> Option<Range<usize>> {
    let mut start = inner.start;
    let mut end = inner.end;
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    if end - start < 2 {
        return None;
    }

    let quote = bytes[start];
    if !matches!(quote, b'"' | b'\'' | b'`') || bytes[end - 1] != quote {
        return None;
    }

    // The first unescaped closing quote must be the last byte
    let mut i = start + 1;
    while i < end - 1 {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return None,
            _ => {}
        }
        i += 1;
    }

    Some(start + 1..end - 1)
}

/// Attribute name spans paired with string-literal value spans within the
/// opening tag body `[from, to)`. Non-literal values are skipped.
fn literal_attributes(bytes: &[u8], from: usize, to: usize) -> Vec<(Range<usize>, Range<usize>)> {
    let mut found = Vec::new();
    let mut i = from;

    while i < to {
        let b = bytes[i];
        if b.is_ascii_whitespace() || b == b'/' {
            i += 1;
            continue;
        }
        // Spread props: {...rest}
        if b == b'{' {
            i = braced_end(bytes, i, to);
            continue;
        }
        if !(b.is_ascii_alphabetic() || matches!(b, b'_' | b'@' | b':')) {
            i += 1;
            continue;
        }

        let name_start = i;
        while i < to && (is_name_byte(bytes[i]) || bytes[i] == b'@') {
            i += 1;
        }
        let name = name_start..i;

        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= to || bytes[i] != b'=' {
            // Boolean attribute
            continue;
        }
        i += 1;
        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= to {
            break;
        }

        match bytes[i] {
            q @ (b'"' | b'\'') => {
                let value_start = i + 1;
                let mut close = value_start;
                while close < to && bytes[close] != q {
                    close += 1;
                }
                if close >= to {
                    break;
                }
                found.push((name, value_start..close));
                i = close + 1;
            }
            b'{' => {
                let end = braced_end(bytes, i, to);
                if end > i + 1 {
                    if let Some(value) = single_literal(bytes, i + 1..end - 1) {
                        found.push((name, value));
                    }
                }
                i = end;
            }
            _ => {
                while i < to && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
            }
        }
    }

    found
}
