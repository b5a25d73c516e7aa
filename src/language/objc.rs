//! Objective-C lexical rules.

use super::{c, compile, EntityBody, EntityRules, LanguageRules, DEFAULT_SEPARATORS};

const IMPORT_PATTERNS: &[&str] = &[
    r#"(?m)^[ \t]*#[ \t]*(?:import|include)[ \t]*[<"](?P<path>[^>"\n]+)[>"]"#,
    r"@import\s+(?P<path>[\w.]+)\s*;",
];

/// `@interface`, `@implementation` and `@protocol` blocks closed by `@end`.
/// The parent clause stops at the end of the header line or an ivar block.
const ENTITY_PATTERN: &str =
    r"@(?P<kind>interface|implementation|protocol)\s+(?P<name>[A-Za-z_]\w*)(?P<parents>[^\n{]*)";

/// `- (void)foo:(int)x {` and class methods with `+`.
const METHOD_PATTERN: &str = r"[-+]\s*\(\s*[\w\s*<>,]+\)\s*(?P<name>[A-Za-z_]\w*)[\w\s:()*<>,]*?\{";

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["//"],
        block_comments: &[("/*", "*/")],
        string_delimiters: &["\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: IMPORT_PATTERNS.iter().map(|p| compile(p)).collect(),
        module_separator: None,
        entities: Some(EntityRules {
            pattern: compile(ENTITY_PATTERN),
            body: EntityBody::Keyword("@end"),
            parent_keywords: &[],
            strip_generics: false,
        }),
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: c::METHOD_EXCLUSIONS,
    }
}
