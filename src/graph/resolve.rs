//! Best-effort resolution of raw references to corpus unique names.
//!
//! A reference is normalized into path segments and compared against the
//! trailing segments of every candidate sharing its last segment. The winner
//! is chosen by a total order (score, then unique name) so the result never
//! depends on iteration order.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How much of a reference must match a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Any trailing match counts; the longest one wins.
    #[default]
    LongestSuffix,
    /// Every segment of the reference must match.
    Strict,
}

/// Files named like this also answer for their directory (`pkg/index.js` for `pkg`).
const PACKAGE_INDEX_STEMS: &[&str] = &["index", "__init__"];

/// Split a raw reference into path segments.
///
/// Returns `None` for references that cannot name a single result
/// (empty, or wildcard imports like `java.util.*`).
pub fn normalize_reference(reference: &str, module_separator: Option<char>) -> Option<Vec<String>> {
    let trimmed = reference
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '<' | '>'));
    let mut text = trimmed.replace("::", "/").replace('\\', "/");

    if let Some(sep) = module_separator {
        if !text.contains('/') {
            text = text.trim_start_matches(sep).replace(sep, "/");
        }
    }

    let segments: Vec<String> = text
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
        .collect();

    match segments.last() {
        None => None,
        Some(last) if last == "*" => None,
        Some(_) => Some(segments),
    }
}

fn stem(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(pos) if pos > 0 => &segment[..pos],
        _ => segment,
    }
}

fn has_extension(segment: &str) -> bool {
    stem(segment).len() != segment.len()
}

#[derive(Debug)]
struct Candidate {
    unique_name: String,
    segments: Vec<String>,
    /// Directory of the declaring file, for locality tie-breaks.
    dir: Vec<String>,
}

/// Ranking of one candidate; compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Score {
    matched_segments: usize,
    exact_last: bool,
    shared_dir: usize,
}

/// Resolves references against one set of results.
#[derive(Debug, Default)]
pub struct Resolver {
    policy: ResolutionPolicy,
    candidates: Vec<Candidate>,
    by_stem: HashMap<String, Vec<usize>>,
}

impl Resolver {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Add a file result by its `/`-separated unique name.
    pub fn add_file(&mut self, unique_name: &str) {
        let segments: Vec<String> = unique_name.split('/').map(str::to_string).collect();
        let dir = segments[..segments.len().saturating_sub(1)].to_vec();

        if let Some(last) = segments.last() {
            if PACKAGE_INDEX_STEMS.contains(&stem(last)) && !dir.is_empty() {
                self.push(unique_name, dir.clone(), dir.clone());
            }
        }
        self.push(unique_name, segments, dir);
    }

    /// Add an entity declared in the file `file_unique_name`.
    pub fn add_entity(&mut self, unique_name: &str, entity_name: &str, file_unique_name: &str) {
        let mut dir: Vec<String> = file_unique_name.split('/').map(str::to_string).collect();
        dir.pop();
        let mut segments = dir.clone();
        segments.push(entity_name.to_string());
        self.push(unique_name, segments, dir);
    }

    fn push(&mut self, unique_name: &str, segments: Vec<String>, dir: Vec<String>) {
        let Some(last) = segments.last() else {
            return;
        };
        let key = stem(last).to_string();
        self.by_stem.entry(key).or_default().push(self.candidates.len());
        self.candidates.push(Candidate {
            unique_name: unique_name.to_string(),
            segments,
            dir,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Resolve `reference` made from a result living in `from_dir`.
    ///
    /// `exclude` is the referencing result itself; it never resolves to itself.
    pub fn resolve(
        &self,
        reference: &str,
        module_separator: Option<char>,
        from_dir: &[String],
        exclude: &str,
    ) -> Option<&str> {
        let segments = normalize_reference(reference, module_separator)?;
        let last = segments.last()?;
        let ref_has_ext = has_extension(last);

        let mut best: Option<(Score, &str)> = None;
        for &idx in self.by_stem.get(stem(last))? {
            let candidate = &self.candidates[idx];
            if candidate.unique_name == exclude {
                continue;
            }
            let Some(score) = self.score(&segments, ref_has_ext, candidate, from_dir) else {
                continue;
            };

            let better = match &best {
                None => true,
                Some((best_score, best_name)) => match score.cmp(best_score) {
                    Ordering::Greater => true,
                    Ordering::Equal => candidate.unique_name.as_str() < *best_name,
                    Ordering::Less => false,
                },
            };
            if better {
                best = Some((score, candidate.unique_name.as_str()));
            }
        }

        best.map(|(_, name)| name)
    }

    fn score(
        &self,
        reference: &[String],
        ref_has_ext: bool,
        candidate: &Candidate,
        from_dir: &[String],
    ) -> Option<Score> {
        let (ref_last, ref_rest) = reference.split_last()?;
        let (cand_last, cand_rest) = candidate.segments.split_last()?;

        let exact_last = ref_last == cand_last;
        if !exact_last && (ref_has_ext || stem(cand_last) != ref_last) {
            return None;
        }

        let matched_segments = 1 + ref_rest
            .iter()
            .rev()
            .zip(cand_rest.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        if self.policy == ResolutionPolicy::Strict && matched_segments < reference.len() {
            return None;
        }

        let shared_dir = candidate
            .dir
            .iter()
            .zip(from_dir)
            .take_while(|(a, b)| a == b)
            .count();

        Some(Score {
            matched_segments,
            exact_last,
            shared_dir,
        })
    }
}

/// Directory segments of a `/`-separated unique name.
pub(crate) fn dir_of(unique_name: &str) -> Vec<String> {
    let mut segments: Vec<String> = unique_name.split('/').map(str::to_string).collect();
    segments.pop();
    segments
}
