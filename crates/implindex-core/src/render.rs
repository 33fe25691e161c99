//! Render an index back to rustdoc's implementor file layout.
//!
//! Output matches the generator byte for byte, so rendering a parsed
//! generator file reproduces the file.

use std::fmt::Write as _;

use crate::index::ImplementorIndex;

const HEADER: &str = "(function() {var implementors = {};\n";

const TRAILER: &str = concat!(
    "\n",
    "            if (window.register_implementors) {\n",
    "                window.register_implementors(implementors);\n",
    "            } else {\n",
    "                window.pending_implementors = implementors;\n",
    "            }\n",
    "        \n",
    "})()\n",
);

/// Render the full file text for an index.
pub fn render_index(index: &ImplementorIndex) -> String {
    let mut out = String::with_capacity(HEADER.len() + TRAILER.len() + 64 * index.len());
    out.push_str(HEADER);
    for (package, fragments) in index.iter() {
        out.push_str("implementors[");
        push_literal(&mut out, package);
        out.push_str("] = [");
        for fragment in fragments {
            push_literal(&mut out, fragment);
            out.push(',');
        }
        out.push_str("];\n");
    }
    out.push_str(TRAILER);
    out
}

/// Quote a string as a double-quoted JavaScript literal.
pub fn js_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    push_literal(&mut out, value);
    out
}

fn push_literal(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            // Remaining C0 controls; DEL, C1 and U+2028/2029 stay raw like the generator's JSON.
            c if c < '\u{20}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
