//! Best-effort lexical scanner.
//!
//! Turns raw source text into:
//! - a normalized token stream (comments and string bodies removed, one `"\n"`
//!   token per line)
//! - the raw import references found by the language's import patterns
//! - entity declaration spans with their parent (superclass/interface) references
//!
//! Nothing in here fails: a construct that does not match cleanly is left out.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::language::{EntityBody, EntityKind, EntityRules, LanguageRules};

/// Newline marker token.
pub const NEWLINE: &str = "\n";

/// What [`strip`] blanks out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripMode {
    /// Comments and triple-quoted blocks (docstrings, text blocks). Ordinary
    /// string literals stay intact since import paths live there.
    Comments,
    /// Comments and string literal bodies. Delimiters are kept.
    CommentsAndStrings,
}

/// A named type declaration located in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySpan {
    pub name: String,
    pub kind: EntityKind,
    /// Byte offset of the declaration header.
    pub start: usize,
    /// Byte offset one past the closing delimiter.
    pub end: usize,
    /// 1-indexed
    pub start_line: usize,
    pub end_line: usize,
    /// Superclass / interface / protocol references, as written.
    pub parents: Vec<String>,
}

/// Everything the scanner extracts from one source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedSource {
    pub tokens: Vec<String>,
    pub entity_spans: Vec<EntitySpan>,
    pub imports: Vec<String>,
}

/// Scan a whole source file.
pub fn scan(source: &str, rules: &LanguageRules) -> ScannedSource {
    let code = strip(source, rules, StripMode::CommentsAndStrings);
    ScannedSource {
        tokens: tokenize(&code, rules),
        entity_spans: extract_entities(&code, rules),
        imports: extract_imports(source, rules),
    }
}

/// Blank out comments (and optionally string bodies) with spaces.
///
/// The output has exactly the byte length of the input and keeps every
/// newline, so offsets and line numbers found in it are valid for `source`.
pub fn strip(source: &str, rules: &LanguageRules, mode: StripMode) -> String {
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < source.len() {
        let rest = &source[i..];

        if rules.line_comments.iter().any(|m| rest.starts_with(*m)) {
            let len = rest.find('\n').unwrap_or(rest.len());
            blank(&mut out, &rest[..len]);
            i += len;
            continue;
        }

        if let Some((open, close)) = rules.block_comments.iter().find(|(o, _)| rest.starts_with(*o)) {
            let len = rest[open.len()..]
                .find(close)
                .map(|pos| open.len() + pos + close.len())
                .unwrap_or(rest.len());
            blank(&mut out, &rest[..len]);
            i += len;
            continue;
        }

        if let Some(delim) = rules.string_delimiters.iter().find(|d| rest.starts_with(**d)) {
            out.push_str(delim);
            i += delim.len();
            i = consume_string(source, i, delim, mode, &mut out);
            continue;
        }

        // Safe: `i` always sits on a char boundary.
        let ch = rest.chars().next().unwrap_or(' ');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Copy or blank a string body starting at `i`; returns the offset after the
/// closing delimiter. Single-character quotes (other than backticks) end at
/// a newline when unterminated. Triple-quoted bodies are always blanked.
fn consume_string(source: &str, mut i: usize, delim: &str, mode: StripMode, out: &mut String) -> usize {
    let multiline = delim.len() > 1 || delim == "`";
    let keep_body = mode == StripMode::Comments && delim.len() == 1;

    while i < source.len() {
        let rest = &source[i..];
        if rest.starts_with(delim) {
            out.push_str(delim);
            return i + delim.len();
        }

        let mut chars = rest.chars();
        let ch = chars.next().unwrap_or(' ');
        if ch == '\n' && !multiline {
            return i;
        }

        let width = if ch == '\\' {
            ch.len_utf8() + chars.next().map(char::len_utf8).unwrap_or(0)
        } else {
            ch.len_utf8()
        };

        if keep_body {
            out.push_str(&rest[..width]);
        } else {
            blank(out, &rest[..width]);
        }
        i += width;
    }

    i
}

/// Append `text` as spaces, byte for byte, keeping newlines.
fn blank(out: &mut String, text: &str) {
    for b in text.bytes() {
        out.push(if b == b'\n' { '\n' } else { ' ' });
    }
}

/// Split stripped code into tokens, padding separator characters so they
/// become standalone tokens. Every line ends with a [`NEWLINE`] token.
pub fn tokenize(code: &str, rules: &LanguageRules) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut padded = String::new();

    for line in code.lines() {
        padded.clear();
        for ch in line.chars() {
            if rules.token_separators.contains(&ch) {
                padded.push(' ');
                padded.push(ch);
                padded.push(' ');
            } else {
                padded.push(ch);
            }
        }
        tokens.extend(padded.split_whitespace().map(str::to_string));
        tokens.push(NEWLINE.to_string());
    }

    tokens
}

/// Extract raw import references in source order, without duplicates.
pub fn extract_imports(source: &str, rules: &LanguageRules) -> Vec<String> {
    let code = strip(source, rules, StripMode::Comments);
    let mut found: Vec<(usize, String)> = Vec::new();

    for pattern in &rules.import_patterns {
        for caps in pattern.captures_iter(&code) {
            let Some(path) = caps.name("path") else {
                continue;
            };
            let module = path.as_str().trim();
            let offset = path.start();

            // `from . import a, b` refers to sibling modules `a` and `b`
            if let Some(names) = caps.name("names") {
                if !module.is_empty() && module.chars().all(|c| c == '.') {
                    for name in split_import_list(names.as_str()) {
                        if name != "*" {
                            found.push((offset, format!("{}{}", module, name)));
                        }
                    }
                    continue;
                }
            }

            for item in split_import_list(module) {
                found.push((offset, item.to_string()));
            }
        }
    }

    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|(_, reference)| seen.insert(reference.clone()).then_some(reference))
        .collect()
}

/// `a, b as c, (d)` -> `a`, `b`, `d`
fn split_import_list(list: &str) -> Vec<&str> {
    list.split(',')
        .filter_map(|item| {
            item.trim_matches(|c: char| c.is_whitespace() || c == '(' || c == ')')
                .split_whitespace()
                .next()
        })
        .collect()
}

/// Locate entity declarations in fully stripped code.
pub fn extract_entities(code: &str, rules: &LanguageRules) -> Vec<EntitySpan> {
    let Some(entities) = rules.entities.as_ref() else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    for caps in entities.pattern.captures_iter(code) {
        let (Some(whole), Some(kind), Some(name)) = (caps.get(0), caps.name("kind"), caps.name("name"))
        else {
            continue;
        };
        let Some(kind) = EntityKind::from_keyword(kind.as_str()) else {
            continue;
        };
        let name = name.as_str();
        if matches!(name, "extends" | "implements") {
            continue;
        }
        let parents = caps.name("parents").map(|m| m.as_str()).unwrap_or("");
        // `enum class E : int` names an underlying type, not a parent
        let underlying_type = kind == EntityKind::Enum && parents.trim_start().starts_with(':');

        let end = match entities.body {
            EntityBody::Braces => brace_body_end(code, whole.end()),
            EntityBody::Keyword(keyword) => {
                if parents.trim_end().ends_with(';') {
                    None
                } else {
                    code[whole.end()..]
                        .find(keyword)
                        .map(|pos| whole.end() + pos + keyword.len())
                }
            }
        };

        let Some(end) = end else {
            tracing::trace!(entity = name, "declaration without a body, skipped");
            continue;
        };

        spans.push(EntitySpan {
            name: name.to_string(),
            kind,
            start: whole.start(),
            end,
            start_line: line_at(code, whole.start()),
            end_line: line_at(code, end.saturating_sub(1)),
            parents: if underlying_type {
                Vec::new()
            } else {
                parse_parents(parents, entities)
            },
        });
    }

    spans
}

/// The body must open with `{` right after the header; returns the offset
/// after the matching `}`.
fn brace_body_end(code: &str, header_end: usize) -> Option<usize> {
    let rest = &code[header_end..];
    let open = rest.len() - rest.trim_start().len();
    if !rest[open..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    for (pos, b) in rest.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(header_end + pos + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn line_at(code: &str, offset: usize) -> usize {
    code.as_bytes()[..offset.min(code.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

/// Turn a parent clause (`extends A<T> implements B, C`) into references.
fn parse_parents(clause: &str, rules: &EntityRules) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref IDENT: Regex =
            Regex::new(r"[A-Za-z_$][\w$]*(?:(?:\.|::)[A-Za-z_$][\w$]*)*").unwrap();
    }

    let mut text = remove_nested(clause, '(', ')');
    if rules.strip_generics {
        text = remove_nested(&text, '<', '>');
    }

    let mut parents: Vec<String> = Vec::new();
    for ident in IDENT.find_iter(&text) {
        let ident = ident.as_str();
        if rules.parent_keywords.contains(&ident) || parents.iter().any(|p| p == ident) {
            continue;
        }
        parents.push(ident.to_string());
    }
    parents
}

/// Drop `open ... close` groups, honoring nesting.
fn remove_nested(text: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        if ch == open {
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
        } else if depth == 0 {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    #[test]
    fn test_strip_preserves_offsets() {
        let rules = Language::Java.rules();
        let source = "int a; // note é\n/* block\n comment */ String s = \"x // y\";\n";
        let stripped = strip(source, rules, StripMode::CommentsAndStrings);

        assert_eq!(stripped.len(), source.len());
        assert_eq!(stripped.lines().count(), source.lines().count());
        assert!(!stripped.contains("note"));
        assert!(!stripped.contains("block"));
        assert!(stripped.contains("String s = \""));
        assert!(!stripped.contains("x // y"));
    }

    #[test]
    fn test_strip_comments_keeps_strings() {
        let rules = Language::C.rules();
        let source = "#include \"a.h\" // trailing\n";
        let stripped = strip(source, rules, StripMode::Comments);
        assert!(stripped.contains("\"a.h\""));
        assert!(!stripped.contains("trailing"));
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let rules = Language::JavaScript.rules();
        let source = "let s = \"a \\\" b\"; let t = 1;";
        let stripped = strip(source, rules, StripMode::CommentsAndStrings);
        assert_eq!(stripped.len(), source.len());
        assert!(stripped.contains("let t = 1;"));
    }

    #[test]
    fn test_python_hash_inside_string_is_not_comment() {
        let rules = Language::Python.rules();
        let source = "x = '#notcomment'  # comment\n";
        let stripped = strip(source, rules, StripMode::Comments);
        assert!(stripped.contains("#notcomment"));
        assert!(!stripped.contains("# comment"));
    }

    #[test]
    fn test_tokens_have_line_markers() {
        let rules = Language::Java.rules();
        let tokens = tokenize("class Foo{\n  void bar(){}\n}", rules);
        assert_eq!(
            tokens,
            vec!["class", "Foo", "{", "\n", "void", "bar", "(", ")", "{", "}", "\n", "}", "\n"]
        );
    }

    #[test]
    fn test_imports_skip_comments_and_dedupe() {
        let rules = Language::Java.rules();
        let source = "import a.B;\n// import c.D;\nimport a.B;\nimport e.F;\n";
        assert_eq!(extract_imports(source, rules), vec!["a.B", "e.F"]);
    }

    #[test]
    fn test_python_import_forms() {
        let rules = Language::Python.rules();
        let source = "import os, sys as system\nfrom . import views, models\nfrom ..core import engine\nfrom pkg.sub import thing\n";
        assert_eq!(
            extract_imports(source, rules),
            vec!["os", "sys", ".views", ".models", "..core", "pkg.sub"]
        );
    }

    #[test]
    fn test_python_docstring_imports_ignored() {
        let rules = Language::Python.rules();
        let source = "\"\"\"\nimport fake\n\"\"\"\nimport real\n'''\nfrom ghost import x\n'''\n";
        assert_eq!(extract_imports(source, rules), vec!["real"]);

        let stripped = strip(source, rules, StripMode::Comments);
        assert_eq!(stripped.len(), source.len());
        assert!(!stripped.contains("fake"));
    }

    #[test]
    fn test_js_string_imports_survive_comment_strip() {
        let rules = Language::JavaScript.rules();
        let source = "import a from './a';\nconst b = require(\"./b\");\n";
        assert_eq!(extract_imports(source, rules), vec!["./a", "./b"]);
    }

    #[test]
    fn test_cpp_enum_underlying_type_is_not_a_parent() {
        let rules = Language::Cpp.rules();
        let source = "enum class Color : int { Red, Green };\nclass Brush : public Tool { };\n";
        let code = strip(source, rules, StripMode::CommentsAndStrings);
        let spans = extract_entities(&code, rules);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "Color");
        assert!(spans[0].parents.is_empty());
        assert_eq!(spans[1].parents, vec!["Tool"]);
    }

    #[test]
    fn test_java_enum_keeps_interfaces() {
        let rules = Language::Java.rules();
        let code = strip("enum Mode implements Named { A, B }\n", rules, StripMode::CommentsAndStrings);
        let spans = extract_entities(&code, rules);
        assert_eq!(spans[0].parents, vec!["Named"]);
    }

    #[test]
    fn test_java_entity_spans() {
        let rules = Language::Java.rules();
        let source = "class Foo {\n  class Inner {}\n}\nclass Qux extends Foo implements Runnable, Comparable<Qux> {}\n";
        let code = strip(source, rules, StripMode::CommentsAndStrings);
        let spans = extract_entities(&code, rules);

        let names: Vec<_> = spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "Inner", "Qux"]);
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].end_line, 3);
        assert_eq!(&source[spans[1].start..spans[1].end], "class Inner {}");
        assert_eq!(spans[2].parents, vec!["Foo", "Runnable", "Comparable"]);
    }

    #[test]
    fn test_unbalanced_body_is_omitted() {
        let rules = Language::Java.rules();
        let code = "class Broken {\n void a() {\n";
        assert!(extract_entities(code, rules).is_empty());
    }

    #[test]
    fn test_cpp_forward_declarations_omitted() {
        let rules = Language::Cpp.rules();
        let source = "class Fwd;\ntemplate <class T> struct Box : public Base<T> { T v; };\nstruct stat buf;\n";
        let code = strip(source, rules, StripMode::CommentsAndStrings);
        let spans = extract_entities(&code, rules);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "Box");
        assert_eq!(spans[0].parents, vec!["Base"]);
    }

    #[test]
    fn test_objc_keyword_bodies() {
        let rules = Language::ObjC.rules();
        let source = "@protocol Drawable;\n@interface Shape : NSObject <Drawable>\n- (void)draw;\n@end\n@implementation Shape\n- (void)draw {}\n@end\n";
        let code = strip(source, rules, StripMode::CommentsAndStrings);
        let spans = extract_entities(&code, rules);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].kind, EntityKind::Interface);
        assert_eq!(spans[0].parents, vec!["NSObject", "Drawable"]);
        assert_eq!(spans[1].kind, EntityKind::Implementation);
        assert!(spans[1].parents.is_empty());
    }

    #[test]
    fn test_brace_in_string_does_not_break_body() {
        let rules = Language::Java.rules();
        let source = "class A { String s = \"}\"; }\nclass B {}\n";
        let scanned = scan(source, rules);
        let names: Vec<_> = scanned.entity_spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_script_has_no_entities() {
        let scanned = scan("print('hi')\nx = 1\n", Language::Python.rules());
        assert!(scanned.entity_spans.is_empty());
        assert_eq!(scanned.tokens.iter().filter(|t| *t == NEWLINE).count(), 2);
    }
}
