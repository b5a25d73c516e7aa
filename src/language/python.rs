//! Python lexical rules. Python files produce no entity results.

use super::{compile, LanguageRules, DEFAULT_SEPARATORS};

/// `import a.b, c as d` and `from x import y`. Relative `from . import a`
/// is expanded by the scanner using the `names` capture.
const IMPORT_PATTERNS: &[&str] = &[
    r"(?m)^[ \t]*import[ \t]+(?P<path>[\w.]+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[\w.]+(?:[ \t]+as[ \t]+\w+)?)*)",
    r"(?m)^[ \t]*from[ \t]+(?P<path>\.+[\w.]*|[\w.]+)[ \t]+import[ \t]+\(?(?P<names>[\w \t,*]+)",
];

const METHOD_PATTERN: &str = r"\bdef\s+(?P<name>[A-Za-z_]\w*)\s*\(";

pub(super) fn rules() -> LanguageRules {
    LanguageRules {
        line_comments: &["#"],
        block_comments: &[],
        string_delimiters: &["\"\"\"", "'''", "\"", "'"],
        token_separators: DEFAULT_SEPARATORS,
        import_patterns: IMPORT_PATTERNS.iter().map(|p| compile(p)).collect(),
        module_separator: Some('.'),
        entities: None,
        method_pattern: compile(METHOD_PATTERN),
        method_exclusions: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_import() {
        let rules = rules();
        let caps = rules.import_patterns[0]
            .captures("import os.path, numpy as np\n")
            .unwrap();
        assert_eq!(&caps["path"], "os.path, numpy as np");
    }

    #[test]
    fn test_from_import() {
        let rules = rules();
        let caps = rules.import_patterns[1]
            .captures("from . import views, models\n")
            .unwrap();
        assert_eq!(&caps["path"], ".");
        assert_eq!(caps["names"].trim(), "views, models");

        let caps = rules.import_patterns[1]
            .captures("from pkg.sub import thing\n")
            .unwrap();
        assert_eq!(&caps["path"], "pkg.sub");
    }

    #[test]
    fn test_def_pattern() {
        let rules = rules();
        let joined = "def run ( self ) : \n return 1 \n async def fetch ( ) :";
        let count = rules.method_pattern.find_iter(joined).count();
        assert_eq!(count, 2);
    }
}
