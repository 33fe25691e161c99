//! Read-only inspection of implementor HTML fragments.
//!
//! Fragments are stored verbatim; these helpers derive plain text and link
//! data from them for display.

use serde::Serialize;

/// A hyperlink inside a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// `class` attribute (`trait`, `struct`, `enum`, `primitive`, ...).
    pub class: Option<String>,
    pub href: Option<String>,
    pub title: Option<String>,
    /// Decoded link text.
    pub text: String,
}

/// The parts of an `impl` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplSummary {
    /// Generic parameters including angle brackets, e.g. `<'a>`.
    pub generics: Option<String>,
    /// `true` for `impl !Trait for T`.
    pub negative: bool,
    /// Trait with its arguments, e.g. `Shl<usize>`.
    pub trait_ref: String,
    /// Implementing type, e.g. `&'a BigUint`.
    pub self_ty: String,
    pub where_clause: Option<String>,
}

impl ImplSummary {
    /// Split a fragment's plain text into its impl header parts.
    ///
    /// Returns `None` when the text is not an `impl ... for ...` header.
    ///
    /// ```
    /// use implindex_core::fragment::ImplSummary;
    ///
    /// let html = "impl&lt;'a&gt; <a class=\"trait\" href=\"#\">Shl</a>&lt;i32&gt; for &amp;'a BigNum";
    /// let summary = ImplSummary::parse(html).unwrap();
    /// assert_eq!(summary.generics.as_deref(), Some("<'a>"));
    /// assert_eq!(summary.trait_ref, "Shl<i32>");
    /// assert_eq!(summary.self_ty, "&'a BigNum");
    /// ```
    pub fn parse(html: &str) -> Option<Self> {
        let text = to_plain_text(html);
        let rest = text.trim().strip_prefix("impl")?;

        let (generics, rest) = if rest.starts_with('<') {
            let end = matching_angle(rest)?;
            (Some(rest[..=end].to_string()), &rest[end + 1..])
        } else if rest.starts_with(char::is_whitespace) {
            (None, rest)
        } else {
            return None;
        };

        let rest = rest.trim_start();
        let split = find_top_level(rest, " for ")?;
        let mut trait_ref = rest[..split].trim();
        let after = rest[split + " for ".len()..].trim();

        let negative = trait_ref.starts_with('!');
        if negative {
            trait_ref = trait_ref[1..].trim_start();
        }

        let (self_ty, where_clause) = match find_top_level(after, " where ") {
            Some(pos) => (
                after[..pos].trim(),
                Some(after[pos + " where ".len()..].trim().to_string()),
            ),
            None => (after, None),
        };

        if trait_ref.is_empty() || self_ty.is_empty() {
            return None;
        }

        Some(Self {
            generics,
            negative,
            trait_ref: trait_ref.to_string(),
            self_ty: self_ty.to_string(),
            where_clause,
        })
    }
}

/// Strip tags and decode entities.
///
/// ```
/// use implindex_core::fragment::to_plain_text;
///
/// let html = "impl <a class=\"trait\" href=\"x\">ToString</a> for <a>Extension</a>";
/// assert_eq!(to_plain_text(html), "impl ToString for Extension");
/// ```
pub fn to_plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => {
                let end = tag_end(rest).unwrap_or(rest.len());
                rest = &rest[end..];
            }
            '&' => {
                let (decoded, used) = decode_entity(rest);
                text.push_str(&decoded);
                rest = &rest[used..];
            }
            c => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    text
}

/// Every `<a>` element in the fragment, in order.
pub fn links(html: &str) -> Vec<Link> {
    let mut found = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find("<a") {
        let candidate = &rest[start..];
        let is_anchor = candidate[2..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c.is_whitespace());
        let Some(open_end) = tag_end(candidate) else {
            break;
        };
        if !is_anchor {
            rest = &candidate[open_end..];
            continue;
        }

        let attrs = attributes(&candidate[2..open_end - 1]);
        let body = &candidate[open_end..];
        let close = body.find("</a>").unwrap_or(body.len());

        let attr = |name: &str| {
            attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        };
        found.push(Link {
            class: attr("class"),
            href: attr("href"),
            title: attr("title"),
            text: to_plain_text(&body[..close]),
        });

        rest = &body[(close + "</a>".len()).min(body.len())..];
    }
    found
}

/// Byte offset just past the `>` closing the tag at the start of `s`.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

fn attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_string();
        rest = rest[name_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(q).unwrap_or(body.len());
                    rest = &body[(end + 1).min(body.len())..];
                    to_plain_text(&body[..end])
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    to_plain_text(&after_eq[..end])
                }
            }
        } else {
            String::new()
        };

        if !name.is_empty() {
            attrs.push((name, value));
        }
        rest = rest.trim_start();
    }
    attrs
}

/// Decode the entity at the start of `s`, returning text and bytes consumed.
fn decode_entity(s: &str) -> (String, usize) {
    let Some(semi) = s[1..].find(';').map(|i| i + 1) else {
        return ("&".to_string(), 1);
    };
    // Entities are short; a distant `;` belongs to something else.
    if semi > 10 {
        return ("&".to_string(), 1);
    }

    let name = &s[1..semi];
    let decoded = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }),
    };

    match decoded {
        Some(c) => (c.to_string(), semi + 1),
        None => ("&".to_string(), 1),
    }
}

fn matching_angle(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Position of `needle` outside any `<>`, `()` or `[]` nesting.
fn find_top_level(s: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            _ if depth == 0 && s[i..].starts_with(needle) => return Some(i),
            _ => {}
        }
    }
    None
}
