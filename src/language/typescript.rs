//! TypeScript lexical rules. Imports are shared with JavaScript.

use super::{compile, javascript, EntityBody, EntityRules, LanguageRules, DEFAULT_SEPARATORS};

const ENTITY_PATTERN: &str =
    r"\b(?P<kind>class|interface|enum)\s+(?P<name>[A-Za-z_$][\w$]*)(?P<parents>[^{};]*)";

/// Like JavaScript, plus type parameters and a return type annotation.
const METHOD_PATTERN: &str = r#"(?:\bfunction\s*\*?\s*)?\b(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>]*>\s*)?\([\w$\s,.=\[\]:?'"<>|&]*\)\s*(?::\s*[\w$\s<>\[\].,|&]+?)?\s*\{"#;

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["//"],
        block_comments: &[("/*", "*/")],
        string_delimiters: &["`", "\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: javascript::IMPORT_PATTERNS.iter().map(|p| compile(p)).collect(),
        module_separator: None,
        entities: Some(EntityRules {
            pattern: compile(ENTITY_PATTERN),
            body: EntityBody::Braces,
            parent_keywords: &["extends", "implements", "abstract"],
            strip_generics: true,
        }),
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: javascript::METHOD_EXCLUSIONS,
    }
}
