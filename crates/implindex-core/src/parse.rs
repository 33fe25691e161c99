//! Parser for rustdoc implementor index files.
//!
//! The files are JavaScript, but only one fixed shape is ever emitted:
//!
//! ```text
//! (function() {var implementors = {};
//! implementors["antidote"] = [];
//! implementors["openssl"] = ["impl <a ...>ToString</a> for ...",];
//!
//!             if (window.register_implementors) {
//!                 window.register_implementors(implementors);
//!             } else {
//!                 window.pending_implementors = implementors;
//!             }
//!
//! })()
//! ```
//!
//! The parser reads that shape token by token without evaluating anything.
//! String escapes are decoded; HTML inside fragments is left alone.

use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};
use crate::index::ImplementorIndex;

const BINDING: &str = "implementors";
const HOOK: &str = "register_implementors";
const PENDING: &str = "pending_implementors";

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Require the hook/pending dispatch trailer after the assignments.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Parse an index file with default (strict) options.
pub fn parse_index(source: &str) -> IndexResult<ImplementorIndex> {
    parse_index_with(source, ParseOptions::default())
}

/// Parse an index file.
pub fn parse_index_with(source: &str, options: ParseOptions) -> IndexResult<ImplementorIndex> {
    let mut scanner = Scanner::new(source);
    let mut index = ImplementorIndex::new();

    scanner.header()?;

    while scanner.at_assignment() {
        let start = scanner.pos;
        let (package, fragments) = scanner.assignment()?;
        if index.contains(&package) {
            let (line, _) = scanner.position_at(start);
            return Err(IndexError::DuplicatePackage { package, line });
        }
        index.insert(package, fragments)?;
    }

    scanner.trailer(options)?;

    debug!(
        packages = index.len(),
        implementors = index.implementor_count(),
        "parsed implementor index"
    );
    Ok(index)
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        // A UTF-8 BOM is not part of the file's shape.
        let pos = if src.starts_with('\u{feff}') { 3 } else { 0 };
        Self { src, pos }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// 1-based line and column of a byte offset. Only used on error paths.
    fn position_at(&self, offset: usize) -> (usize, usize) {
        let before = &self.src[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }

    fn error(&self, message: impl Into<String>) -> IndexError {
        let (line, column) = self.position_at(self.pos);
        IndexError::parse(line, column, message)
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += end;
            } else if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => {
                        self.pos = self.src.len();
                        return;
                    }
                }
            } else {
                return;
            }
        }
    }

    fn punct(&mut self, expected: char) -> IndexResult<()> {
        self.skip_trivia();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of file"))),
        }
    }

    fn eat_punct(&mut self, expected: char) -> bool {
        self.skip_trivia();
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> &'a str {
        self.skip_trivia();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !(c == '_' || c == '$' || c.is_alphanumeric()))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn keyword(&mut self, expected: &str) -> IndexResult<()> {
        let start = self.pos;
        let found = self.word();
        if found == expected {
            Ok(())
        } else {
            self.pos = start;
            self.skip_trivia();
            let shown = if found.is_empty() {
                self.peek().map(String::from).unwrap_or_else(|| "end of file".into())
            } else {
                found.to_string()
            };
            Err(self.error(format!("expected `{expected}`, found `{shown}`")))
        }
    }

    /// `(function() {var implementors = {};`
    fn header(&mut self) -> IndexResult<()> {
        self.punct('(')?;
        self.keyword("function")?;
        self.punct('(')?;
        self.punct(')')?;
        self.punct('{')?;
        self.keyword("var")?;
        self.keyword(BINDING)?;
        self.punct('=')?;
        self.punct('{')?;
        self.punct('}')?;
        self.eat_punct(';');
        Ok(())
    }

    fn at_assignment(&mut self) -> bool {
        self.skip_trivia();
        let start = self.pos;
        let is_binding = self.word() == BINDING && self.eat_punct('[');
        self.pos = start;
        is_binding
    }

    /// `implementors["pkg"] = ["...", "...",];`
    fn assignment(&mut self) -> IndexResult<(String, Vec<String>)> {
        self.keyword(BINDING)?;
        self.punct('[')?;
        let package = self.string()?;
        self.punct(']')?;
        self.punct('=')?;
        self.punct('[')?;

        let mut fragments = Vec::new();
        loop {
            if self.eat_punct(']') {
                break;
            }
            fragments.push(self.string()?);
            if !self.eat_punct(',') {
                self.punct(']')?;
                break;
            }
        }
        self.eat_punct(';');
        Ok((package, fragments))
    }

    fn trailer(&mut self, options: ParseOptions) -> IndexResult<()> {
        self.skip_trivia();
        let rest = self.rest();

        let has_dispatch = rest.contains(HOOK) && rest.contains(PENDING);
        let closed = {
            let tail = rest.trim_end().trim_end_matches(';').trim_end();
            let tail: String = tail.chars().filter(|c| !c.is_whitespace()).collect();
            tail.ends_with("})()")
        };

        if has_dispatch && closed {
            return Ok(());
        }
        if options.strict {
            if !has_dispatch {
                return Err(self.error(format!(
                    "expected `{HOOK}` / `{PENDING}` dispatch after assignments"
                )));
            }
            return Err(self.error("expected closing `})()`"));
        }

        warn!(
            has_dispatch,
            closed, "implementor index file has an incomplete trailer"
        );
        Ok(())
    }

    fn string(&mut self) -> IndexResult<String> {
        self.skip_trivia();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(self.error(format!("expected string literal, found '{c}'"))),
            None => return Err(self.error("expected string literal, found end of file")),
        };
        self.bump();

        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some('\n') => return Err(self.error("line break inside string literal")),
                Some(c) => {
                    self.bump();
                    if c == quote {
                        return Ok(out);
                    } else if c == '\\' {
                        self.escape(&mut out)?;
                    } else {
                        out.push(c);
                    }
                }
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> IndexResult<()> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape sequence"))?;
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !matches!(self.peek(), Some('0'..='9')) => out.push('\0'),
            'x' => {
                let value = self.hex_digits(2)?;
                out.push(char::from_u32(value).ok_or_else(|| self.error("invalid \\x escape"))?);
            }
            'u' => {
                let value = self.unicode_escape()?;
                out.push(value);
            }
            // Line continuation.
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            '0'..='9' => return Err(self.error("octal escapes are not supported")),
            other => out.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> IndexResult<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex digit in escape"))?;
            self.bump();
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn unicode_escape(&mut self) -> IndexResult<char> {
        if self.peek() == Some('{') {
            self.bump();
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                self.bump();
                value = value.saturating_mul(16).saturating_add(digit);
                digits += 1;
            }
            if digits == 0 || self.bump() != Some('}') {
                return Err(self.error("malformed \\u{...} escape"));
            }
            return char::from_u32(value).ok_or_else(|| self.error("invalid code point"));
        }

        let high = self.hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high) {
            if !self.rest().starts_with("\\u") {
                return Err(self.error("unpaired surrogate in \\u escape"));
            }
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error("unpaired surrogate in \\u escape"));
            }
            let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(combined).ok_or_else(|| self.error("invalid code point"));
        }
        char::from_u32(high).ok_or_else(|| self.error("unpaired surrogate in \\u escape"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAILER: &str = "
            if (window.register_implementors) {
                window.register_implementors(implementors);
            } else {
                window.pending_implementors = implementors;
            }

})()
";

    fn file(body: &str) -> String {
        format!("(function() {{var implementors = {{}};\n{body}{TRAILER}")
    }

    #[test]
    fn test_parse_empty_and_non_empty_lists() {
        let src = file("implementors[\"a\"] = [];\nimplementors[\"b\"] = [\"<impl X>\",];\n");
        let index = parse_index(&src).unwrap();

        let names: Vec<_> = index.packages().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(index.get("a"), Some(&[][..]));
        assert_eq!(index.get("b").unwrap(), &["<impl X>".to_string()]);
    }

    #[test]
    fn test_parse_decodes_escapes_only() {
        let src = file(
            r#"implementors["p"] = ["<a class=\"trait\" href=\"x\">T</a>&lt;'a&gt;","tab\there","\u00e9\u{1F600}\ud83d\ude00\/",];
"#,
        );
        let index = parse_index(&src).unwrap();
        let fragments = index.get("p").unwrap();
        assert_eq!(fragments[0], r#"<a class="trait" href="x">T</a>&lt;'a&gt;"#);
        assert_eq!(fragments[1], "tab\there");
        assert_eq!(fragments[2], "é😀😀/");
    }

    #[test]
    fn test_parse_single_quotes_and_no_trailing_comma() {
        let src = file("implementors['p'] = ['x', \"y\"]\n");
        let index = parse_index(&src).unwrap();
        assert_eq!(index.get("p").unwrap(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_parse_no_assignments() {
        let index = parse_index(&file("")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_package_reports_line() {
        let src = file("implementors[\"a\"] = [];\nimplementors[\"a\"] = [\"x\",];\n");
        let err = parse_index(&src).unwrap_err();
        assert!(
            matches!(err, IndexError::DuplicatePackage { ref package, line: 3 } if package == "a"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_unterminated_string_position() {
        let src = "(function() {var implementors = {};\nimplementors[\"a\"] = [\"oops];\n";
        let err = parse_index(src).unwrap_err();
        match err {
            IndexError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_header() {
        let err = parse_index("var implementors = {};").unwrap_err();
        match err {
            IndexError::Parse { line, column, .. } => assert_eq!((line, column), (1, 1)),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_trailer_strict_vs_lenient() {
        let src = "(function() {var implementors = {};\nimplementors[\"a\"] = [];\n";
        assert!(matches!(parse_index(src), Err(IndexError::Parse { .. })));

        let lenient = parse_index_with(src, ParseOptions { strict: false }).unwrap();
        assert!(lenient.contains("a"));
    }

    #[test]
    fn test_missing_close_is_strict_error() {
        let src = "(function() {var implementors = {};\n\
                   if (window.register_implementors) { window.register_implementors(implementors); }\
                   else { window.pending_implementors = implementors; }\n";
        let err = parse_index(src).unwrap_err();
        assert!(err.to_string().contains("})()"));
    }

    #[test]
    fn test_compact_single_line_file() {
        let src = "(function(){var implementors={};implementors[\"a\"]=[\"x\"];\
                   if(window.register_implementors){window.register_implementors(implementors);}\
                   else{window.pending_implementors=implementors;}})();";
        let index = parse_index(src).unwrap();
        assert_eq!(index.get("a").unwrap(), &["x".to_string()]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = file("// generated\nimplementors[\"a\"] = [/* none */];\n");
        assert!(parse_index(&src).unwrap().contains("a"));
    }

    #[test]
    fn test_large_index_parses_in_linear_time() {
        let mut index = ImplementorIndex::new();
        for i in 0..20_000 {
            index
                .insert(format!("pkg_{i}"), vec![format!("<a href=\"p{i}\">impl</a>")])
                .unwrap();
        }
        let src = crate::render::render_index(&index);

        let started = std::time::Instant::now();
        let parsed = parse_index(&src).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(parsed, index);
        assert!(elapsed.as_secs() < 5, "parsing {} bytes took {elapsed:?}", src.len());
    }

    #[test]
    fn test_octal_escape_rejected() {
        let src = file("implementors[\"a\"] = [\"\\1\"];\n");
        assert!(matches!(parse_index(&src), Err(IndexError::Parse { .. })));
    }
}
