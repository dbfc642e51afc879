//! Lexical stripper
//!
//! Splits SQL text into code spans and literal/comment spans without parsing
//! it. Only the code spans are ever looked at by the classifier, so a keyword
//! sitting inside a string, a quoted identifier, a comment or a dollar-quoted
//! body can neither trigger nor hide a policy decision.
//!
//! All delimiters are ASCII, so scanning works on bytes and every span
//! boundary falls on a UTF-8 character boundary. Dollar-quote tags are the
//! exception and are read as chars: any non-ASCII character may appear in a
//! tag, as it may in an identifier.

/// Character emitted in place of every non-code span
pub const SEPARATOR: char = ' ';

/// Lexical class of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Plain SQL text
    Code,
    /// `-- ...` up to (not including) the newline
    LineComment,
    /// `/* ... */`, not nested
    BlockComment,
    /// `'...'` with `''` escapes
    StringLiteral,
    /// `E'...'` with backslash and `''` escapes
    EscapeString,
    /// `"..."` with `""` escapes
    QuotedIdentifier,
    /// `$tag$ ... $tag$`
    DollarQuoted,
}

/// A contiguous slice of the input and its class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub kind: SpanKind,
    pub text: &'a str,
}

/// Iterator over the spans of a SQL string, left to right
///
/// Concatenating the `text` of every span reproduces the input exactly.
pub struct Spans<'a> {
    src: &'a str,
    pos: usize,
}

/// Scan `sql` into classified spans
pub fn spans(sql: &str) -> Spans<'_> {
    Spans { src: sql, pos: 0 }
}

/// Produce the scrubbed copy of `sql`: code passes through untouched, every
/// comment or literal collapses to a single [`SEPARATOR`].
///
/// The result is only fit for keyword scanning. It must never be executed.
pub fn strip(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    for span in spans(sql) {
        match span.kind {
            SpanKind::Code => out.push_str(span.text),
            _ => out.push(SEPARATOR),
        }
    }
    out
}

impl<'a> Iterator for Spans<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Span<'a>> {
        let start = self.pos;
        if start >= self.src.len() {
            return None;
        }

        let (kind, end) = match self.literal_at(start) {
            Some(found) => found,
            None => (SpanKind::Code, self.code_end(start)),
        };

        self.pos = end;
        Some(Span {
            kind,
            text: &self.src[start..end],
        })
    }
}

impl<'a> Spans<'a> {
    /// End of the code span starting at `start`: the next offset where a
    /// literal or comment opens, or the end of input.
    fn code_end(&self, start: usize) -> usize {
        self.src[start..]
            .char_indices()
            .skip(1)
            .map(|(offset, _)| start + offset)
            .find(|&at| self.literal_at(at).is_some())
            .unwrap_or(self.src.len())
    }

    /// If a comment or literal opens at `at`, return its kind and end offset
    fn literal_at(&self, at: usize) -> Option<(SpanKind, usize)> {
        let bytes = self.src.as_bytes();
        let len = bytes.len();

        match bytes[at] {
            b'-' if bytes.get(at + 1) == Some(&b'-') => {
                let end = find_byte(bytes, at + 2, b'\n').unwrap_or(len);
                Some((SpanKind::LineComment, end))
            }
            b'/' if bytes.get(at + 1) == Some(&b'*') => {
                let end = self.src[at + 2..]
                    .find("*/")
                    .map(|i| at + 2 + i + 2)
                    .unwrap_or(len);
                Some((SpanKind::BlockComment, end))
            }
            b'\'' => Some((SpanKind::StringLiteral, quoted_end(bytes, at + 1, b'\''))),
            b'"' => Some((SpanKind::QuotedIdentifier, quoted_end(bytes, at + 1, b'"'))),
            b'e' | b'E' if bytes.get(at + 1) == Some(&b'\'') && !self.follows_word(at) => {
                Some((SpanKind::EscapeString, escaped_end(bytes, at + 2)))
            }
            b'$' if !self.follows_word(at) => {
                let tag_len: usize = self.src[at + 1..]
                    .chars()
                    .take_while(|&c| is_ident_char(c))
                    .map(char::len_utf8)
                    .sum();
                let marker_end = at + 1 + tag_len + 1;
                if bytes.get(marker_end - 1) != Some(&b'$') {
                    // `$1` placeholders and stray dollars are plain code
                    return None;
                }
                let marker = &self.src[at..marker_end];
                let end = self.src[marker_end..]
                    .find(marker)
                    .map(|i| marker_end + i + marker.len())
                    .unwrap_or(len);
                Some((SpanKind::DollarQuoted, end))
            }
            _ => None,
        }
    }

    /// Whether the character before `at` continues an identifier, in which
    /// case `$` and `E'` belong to that identifier rather than opening a literal
    fn follows_word(&self, at: usize) -> bool {
        self.src[..at]
            .chars()
            .next_back()
            .is_some_and(|c| is_ident_char(c) || c == '$')
    }
}

/// Letters, digits, `_` and every non-ASCII character, as PostgreSQL reads
/// identifier and dollar-tag characters
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || !c.is_ascii()
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

/// End of a quoted span whose body starts at `from`; a doubled quote is an
/// escaped quote. Unterminated spans run to end of input.
fn quoted_end(bytes: &[u8], from: usize, quote: u8) -> usize {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Like [`quoted_end`] for `'` but a backslash also escapes the next byte
fn escaped_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
