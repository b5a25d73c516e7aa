//! JavaScript lexical rules.

use super::{compile, EntityBody, EntityRules, LanguageRules, DEFAULT_SEPARATORS};

/// ES module imports, re-exports and CommonJS `require`. Shared with TypeScript.
pub(super) const IMPORT_PATTERNS: &[&str] = &[
    r#"\bimport\s+(?:[\w$*{}\s,]+?\s+from\s+)?['"](?P<path>[^'"\n]+)['"]"#,
    r#"\bexport\s+(?:\*|\*\s+as\s+[\w$]+|\{[^}]*\})\s+from\s+['"](?P<path>[^'"\n]+)['"]"#,
    r#"\brequire\s*\(\s*['"](?P<path>[^'"\n]+)['"]\s*\)"#,
];

const ENTITY_PATTERN: &str = r"\b(?P<kind>class)\s+(?P<name>[A-Za-z_$][\w$]*)(?P<parents>[^{};]*)";

/// Named functions and method shorthand. The optional `function` keyword is
/// consumed so `function foo() {` yields `foo`.
const METHOD_PATTERN: &str =
    r#"(?:\bfunction\s*\*?\s*)?\b(?P<name>[A-Za-z_$][\w$]*)\s*\([\w$\s,.=\[\]:?'"]*\)\s*\{"#;

pub(super) const METHOD_EXCLUSIONS: &[&str] =
    &["if", "for", "while", "switch", "catch", "with", "function", "return"];

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["//"],
        block_comments: &[("/*", "*/")],
        string_delimiters: &["`", "\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: IMPORT_PATTERNS.iter().map(|p| compile(p)).collect(),
        module_separator: None,
        entities: Some(EntityRules {
            pattern: compile(ENTITY_PATTERN),
            body: EntityBody::Braces,
            parent_keywords: &["extends"],
            strip_generics: true,
        }),
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: METHOD_EXCLUSIONS,
    }
}
