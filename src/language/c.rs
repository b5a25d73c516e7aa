//! C lexical rules. C has no entity concept.

use super::{compile, LanguageRules, DEFAULT_SEPARATORS};

pub(super) const INCLUDE_PATTERN: &str = r#"(?m)^[ \t]*#[ \t]*include[ \t]*[<"](?P<path>[^>"\n]+)[>"]"#;

const METHOD_PATTERN: &str = r"\b(?P<name>[A-Za-z_]\w*)\s*\([\w\s,*\[\].]*\)\s*\{";

pub(super) const METHOD_EXCLUSIONS: &[&str] = &["if", "for", "while", "switch", "return", "sizeof"];

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["//"],
        block_comments: &[("/*", "*/")],
        string_delimiters: &["\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: vec![compile(INCLUDE_PATTERN)],
        module_separator: None,
        entities: None,
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: METHOD_EXCLUSIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_pattern() {
        let rules = rules();
        let source = "#include <stdio.h>\n  # include \"util/list.h\"\nint x;\n";
        let paths: Vec<_> = rules.import_patterns[0]
            .captures_iter(source)
            .map(|c| c["path"].to_string())
            .collect();
        assert_eq!(paths, vec!["stdio.h", "util/list.h"]);
    }

    #[test]
    fn test_no_entities() {
        assert!(rules().entities.is_none());
    }

    #[test]
    fn test_function_pattern() {
        let rules = rules();
        let joined = "static int add ( int a , int b ) { while ( a ) { } return a ; } void noop ( void ) { }";
        let names: Vec<_> = rules
            .method_pattern
            .captures_iter(joined)
            .map(|c| c["name"].to_string())
            .filter(|n| !rules.method_exclusions.contains(&n.as_str()))
            .collect();
        assert_eq!(names, vec!["add", "noop"]);
    }
}
