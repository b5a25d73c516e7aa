//! Language descriptors: extension lookup and lexical rule tables.
//!
//! Each supported language is a variant of [`Language`] bound to a set of
//! file extensions and one [`LanguageRules`] table. The rule tables live in
//! the per-language submodules and are compiled once on first use.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

mod c;
mod cpp;
mod java;
mod javascript;
mod objc;
mod python;
mod typescript;

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    C,
    Cpp,
    JavaScript,
    TypeScript,
    ObjC,
    Python,
}

/// Extension to language lookup. `h` is deliberately absent, see [`Language::for_extension`].
static EXTENSIONS: phf::Map<&'static str, Language> = phf::phf_map! {
    "java" => Language::Java,
    "c" => Language::C,
    "cpp" => Language::Cpp,
    "cc" => Language::Cpp,
    "cxx" => Language::Cpp,
    "hpp" => Language::Cpp,
    "hh" => Language::Cpp,
    "hxx" => Language::Cpp,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "ts" => Language::TypeScript,
    "tsx" => Language::TypeScript,
    "m" => Language::ObjC,
    "mm" => Language::ObjC,
    "py" => Language::Python,
};

/// Languages that may own a shared `.h` header, in priority order.
const HEADER_PRIORITY: [Language; 3] = [Language::C, Language::Cpp, Language::ObjC];

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::JavaScript,
        Language::TypeScript,
        Language::ObjC,
        Language::Python,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::ObjC => "objc",
            Language::Python => "python",
        }
    }

    /// Resolve a file extension (without the dot) to a language.
    ///
    /// `permitted` is the "only permit languages" hint; an empty slice permits
    /// every language. Headers (`h`) go to the first permitted language in
    /// C, C++, Objective-C order.
    pub fn for_extension(ext: &str, permitted: &[Language]) -> Option<Language> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let allowed = |lang: &Language| permitted.is_empty() || permitted.contains(lang);

        if ext == "h" {
            return HEADER_PRIORITY.iter().copied().find(|l| allowed(l));
        }

        EXTENSIONS.get(ext.as_str()).copied().filter(|l| allowed(l))
    }

    /// File extensions bound to this language (header excluded).
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<_> = EXTENSIONS
            .entries()
            .filter(|(_, lang)| *lang == self)
            .map(|(ext, _)| *ext)
            .collect();
        exts.sort_unstable();
        exts
    }

    /// The lexical rule table for this language.
    pub fn rules(&self) -> &'static LanguageRules {
        static JAVA: Lazy<LanguageRules> = Lazy::new(java::rules);
        static C: Lazy<LanguageRules> = Lazy::new(c::rules);
        static CPP: Lazy<LanguageRules> = Lazy::new(cpp::rules);
        static JAVASCRIPT: Lazy<LanguageRules> = Lazy::new(javascript::rules);
        static TYPESCRIPT: Lazy<LanguageRules> = Lazy::new(typescript::rules);
        static OBJC: Lazy<LanguageRules> = Lazy::new(objc::rules);
        static PYTHON: Lazy<LanguageRules> = Lazy::new(python::rules);

        match self {
            Language::Java => &*JAVA,
            Language::C => &*C,
            Language::Cpp => &*CPP,
            Language::JavaScript => &*JAVASCRIPT,
            Language::TypeScript => &*TYPESCRIPT,
            Language::ObjC => &*OBJC,
            Language::Python => &*PYTHON,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "objc" | "objective-c" => Ok(Language::ObjC),
            "python" | "py" => Ok(Language::Python),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

/// How the body of an entity declaration is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityBody {
    /// `{ ... }` with nesting.
    Braces,
    /// Runs until the given closing keyword (e.g. `@end`).
    Keyword(&'static str),
}

/// Kind of named type declared by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Class,
    Interface,
    Struct,
    Union,
    Enum,
    Record,
    Protocol,
    Implementation,
}

impl EntityKind {
    pub fn from_keyword(keyword: &str) -> Option<EntityKind> {
        match keyword {
            "class" => Some(EntityKind::Class),
            "interface" => Some(EntityKind::Interface),
            "struct" => Some(EntityKind::Struct),
            "union" => Some(EntityKind::Union),
            "enum" => Some(EntityKind::Enum),
            "record" => Some(EntityKind::Record),
            "protocol" => Some(EntityKind::Protocol),
            "implementation" => Some(EntityKind::Implementation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Interface => "interface",
            EntityKind::Struct => "struct",
            EntityKind::Union => "union",
            EntityKind::Enum => "enum",
            EntityKind::Record => "record",
            EntityKind::Protocol => "protocol",
            EntityKind::Implementation => "implementation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entity declaration rules for languages that have named types.
#[derive(Debug)]
pub struct EntityRules {
    /// Header pattern with `kind`, `name` and optional `parents` captures.
    pub pattern: Regex,
    pub body: EntityBody,
    /// Words in a parent clause that are not type references.
    pub parent_keywords: &'static [&'static str],
    /// Drop `<...>` contents from parent clauses (generics) instead of
    /// treating them as references (Objective-C protocols).
    pub strip_generics: bool,
}

/// Lexical rule table for one language.
#[derive(Debug)]
pub struct LanguageRules {
    pub line_comments: &'static [&'static str],
    pub block_comments: &'static [(&'static str, &'static str)],
    /// String delimiters, longest first.
    pub string_delimiters: &'static [&'static str],
    /// Characters padded into standalone tokens.
    pub token_separators: &'static [char],
    /// Import patterns with a `path` and optional `names` capture.
    pub import_patterns: Vec<Regex>,
    /// Separator used in dotted module references (`a.b.C`).
    pub module_separator: Option<char>,
    /// `None` when the language has no entity concept.
    pub entities: Option<EntityRules>,
    /// Method declaration pattern with a `name` capture.
    pub method_pattern: Regex,
    /// Names the method pattern matches that are control flow, not declarations.
    pub method_exclusions: &'static [&'static str],
}

/// Separators shared by every language.
pub(crate) const DEFAULT_SEPARATORS: &[char] =
    &[':', ';', '{', '}', '(', ')', '[', ']', '?', '!', ',', '<', '>', '"'];

/// Compile a pattern from a rule table. Patterns are constants, so failure is a
/// programming error caught by the per-language tests.
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule pattern {}: {}", pattern, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(Language::for_extension("java", &[]), Some(Language::Java));
        assert_eq!(Language::for_extension(".py", &[]), Some(Language::Python));
        assert_eq!(Language::for_extension("JSX", &[]), Some(Language::JavaScript));
        assert_eq!(Language::for_extension("rs", &[]), None);
    }

    #[test]
    fn test_header_priority() {
        assert_eq!(Language::for_extension("h", &[]), Some(Language::C));
        assert_eq!(
            Language::for_extension("h", &[Language::ObjC, Language::Cpp]),
            Some(Language::Cpp)
        );
        assert_eq!(
            Language::for_extension("h", &[Language::ObjC, Language::Java]),
            Some(Language::ObjC)
        );
        assert_eq!(Language::for_extension("h", &[Language::Java]), None);
    }

    #[test]
    fn test_permitted_filter() {
        assert_eq!(Language::for_extension("java", &[Language::Python]), None);
        assert_eq!(
            Language::for_extension("m", &[Language::ObjC]),
            Some(Language::ObjC)
        );
    }

    #[test]
    fn test_all_rules_compile() {
        for lang in Language::ALL {
            let rules = lang.rules();
            assert!(!rules.import_patterns.is_empty(), "{} has no import patterns", lang);
        }
    }

    #[test]
    fn test_language_round_trip_names() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>(), Ok(lang));
        }
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_extensions_listed() {
        assert_eq!(Language::Python.extensions(), vec!["py"]);
        assert!(Language::Cpp.extensions().contains(&"hpp"));
    }
}
