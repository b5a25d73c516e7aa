//! Java lexical rules.

use super::{compile, EntityBody, EntityRules, LanguageRules, DEFAULT_SEPARATORS};

/// `import a.b.C;`, `import static a.b.C.m;` and wildcard imports.
const IMPORT_PATTERNS: &[&str] =
    &[r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?(?P<path>[\w$.]+(?:\.\*)?)[ \t]*;"];

/// Type declarations. `parents` runs up to the opening brace and holds
/// generics, record components and `extends`/`implements` clauses.
const ENTITY_PATTERN: &str =
    r"\b(?P<kind>class|interface|enum|record)\s+(?P<name>[A-Za-z_$][\w$]*)(?P<parents>[^{};]*)";

/// Method declarations matched against the space-joined token stream.
const METHOD_PATTERN: &str = r"\b(?P<name>[A-Za-z_$][\w$]*)\s*\([\w$\s,<>?*.\[\]@]*\)\s*(?:throws\s+[\w$.,\s]+?)?\{";

const METHOD_EXCLUSIONS: &[&str] = &["if", "for", "while", "switch", "catch", "synchronized", "return"];

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["//"],
        block_comments: &[("/*", "*/")],
        string_delimiters: &["\"\"\"", "\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: IMPORT_PATTERNS.iter().map(|p| compile(p)).collect(),
        module_separator: Some('.'),
        entities: Some(EntityRules {
            pattern: compile(ENTITY_PATTERN),
            body: EntityBody::Braces,
            parent_keywords: &["extends", "implements", "permits", "sealed", "final"],
            strip_generics: true,
        }),
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: METHOD_EXCLUSIONS,
    }
}
