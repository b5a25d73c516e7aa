//! C++ lexical rules.

use super::{c, compile, EntityBody, EntityRules, LanguageRules, DEFAULT_SEPARATORS};

/// Class-like declarations. An optional all-caps export macro may precede
/// the name. Forward declarations and template parameters are rejected later
/// because no `{` follows the header.
const ENTITY_PATTERN: &str = r"\b(?P<kind>class|struct|union|enum)\s+(?:(?:class|struct)\s+)?(?:[A-Z_][A-Z0-9_]*\s+)?(?P<name>[A-Za-z_]\w*)(?P<parents>\s*(?:final\s*)?(?::[^{};]*)?)";

const METHOD_PATTERN: &str = r"\b(?P<name>[A-Za-z_~]\w*)\s*\([\w\s,*&\[\].:<>=]*\)\s*(?:const\s*)?(?:noexcept\s*)?(?:override\s*)?(?:final\s*)?\{";

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["//"],
        block_comments: &[("/*", "*/")],
        string_delimiters: &["\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: vec![compile(c::INCLUDE_PATTERN)],
        module_separator: None,
        entities: Some(EntityRules {
            pattern: compile(ENTITY_PATTERN),
            body: EntityBody::Braces,
            parent_keywords: &["public", "private", "protected", "virtual", "final"],
            strip_generics: true,
        }),
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: &["if", "for", "while", "switch", "catch", "return", "sizeof"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_pattern_with_bases() {
        let rules = rules();
        let entities = rules.entities.as_ref().unwrap();
        let caps = entities
            .pattern
            .captures("class Widget : public Base<int>, private Mixin {")
            .unwrap();
        assert_eq!(&caps["kind"], "class");
        assert_eq!(&caps["name"], "Widget");
        assert!(caps["parents"].contains("public Base<int>"));
    }

    #[test]
    fn test_entity_pattern_export_macro() {
        let rules = rules();
        let entities = rules.entities.as_ref().unwrap();
        let caps = entities.pattern.captures("class API_EXPORT Engine {").unwrap();
        assert_eq!(&caps["name"], "Engine");
    }

    #[test]
    fn test_const_method() {
        let rules = rules();
        let joined = "int size ( ) const { return n ; } Foo : : ~Foo ( ) { }";
        let names: Vec<_> = rules
            .method_pattern
            .captures_iter(joined)
            .map(|c| c["name"].to_string())
            .collect();
        assert_eq!(names, vec!["size", "Foo"]);
    }
}
