//! Canonical name scoring.
//!
//! The second stage of the pipeline: propose a default canonical name for
//! the merged entity by scoring each candidate's "proper-name-ness". The
//! heuristic is locale-specific and admittedly approximate, so it sits
//! behind the narrow [`NameScorer`] seam: swap it per locale or replace
//! it with a model-backed scorer without touching the plan builder.
//!
//! The result is a pre-selected default only. The user can always
//! override it before the plan is finalized, and no error is raised for
//! ambiguous or low-confidence scores.

use crate::candidate::CandidateName;

/// Scores a name string for suitability as the merged entity's canonical
/// name. Higher is better; scores may be negative.
pub trait NameScorer {
    /// Returns the heuristic score for `name`.
    fn score(&self, name: &str) -> i32;
}

/// Spanish definite/indefinite articles. A name-initial article is a
/// strong signal the string is a descriptive phrase, not a proper name.
const ARTICLES: [&str; 8] = ["el", "la", "los", "las", "un", "una", "unos", "unas"];

/// Descriptive adjectives (colors, ages, builds) that mark a phrase like
/// "la mujer morena" rather than a name.
const DESCRIPTIVE_WORDS: [&str; 16] = [
    "morena", "moreno", "rubia", "rubio", "vieja", "viejo", "joven", "rojo", "roja", "alta",
    "alto", "gorda", "gordo", "delgada", "delgado", "anciana",
];

const SHORT_NAME_BONUS: i32 = 20;
const VERY_SHORT_NAME_BONUS: i32 = 10;
const UPPERCASE_INITIAL_BONUS: i32 = 30;
const ARTICLE_PENALTY: i32 = -50;
const DESCRIPTIVE_PENALTY: i32 = -30;
const FULL_NAME_BONUS: i32 = 40;

/// Proper-name heuristic for Spanish-language narrative text.
///
/// In Spanish prose common nouns are lower-case, so an upper-case initial
/// and a first-name + surname shape are treated as strong name signals,
/// while a leading article or a descriptive adjective marks the string as
/// a phrase the extraction pipeline picked up ("la mujer morena").
///
/// # Examples
///
/// ```
/// use narrafuse::{NameScorer, SpanishNameScorer};
///
/// let scorer = SpanishNameScorer;
/// assert_eq!(scorer.score("Juan Pérez"), 100);
/// assert_eq!(scorer.score("la mujer morena"), -60);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanishNameScorer;

impl NameScorer for SpanishNameScorer {
    fn score(&self, name: &str) -> i32 {
        let mut score = 0;
        let words: Vec<&str> = name.split_whitespace().collect();

        if words.len() <= 3 {
            score += SHORT_NAME_BONUS;
        }
        if words.len() == 1 || words.len() == 2 {
            score += VERY_SHORT_NAME_BONUS;
        }

        if name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() && c.is_uppercase())
        {
            score += UPPERCASE_INITIAL_BONUS;
        }

        if words
            .first()
            .is_some_and(|w| ARTICLES.contains(&w.to_lowercase().as_str()))
        {
            score += ARTICLE_PENALTY;
        }

        let lowered = name.to_lowercase();
        if DESCRIPTIVE_WORDS.iter().any(|w| lowered.contains(w)) {
            score += DESCRIPTIVE_PENALTY;
        }

        if words.len() == 2
            && words.iter().all(|w| {
                w.chars()
                    .next()
                    .is_some_and(|c| c.is_alphabetic() && c.is_uppercase())
            })
        {
            score += FULL_NAME_BONUS;
        }

        score
    }
}

/// Picks the default canonical name from the candidate pool.
///
/// Only canonical candidates are scored; aliases are never proposed as
/// defaults. Ties keep the collector's pre-existing order, which places
/// longer names first. An empty pool yields `None` and the caller must
/// not auto-advance without a user-provided primary name.
#[must_use]
pub fn select_default<'a>(
    candidates: &'a [CandidateName],
    scorer: &dyn NameScorer,
) -> Option<&'a CandidateName> {
    let mut best: Option<(&CandidateName, i32)> = None;
    for candidate in candidates.iter().filter(|c| c.is_canonical) {
        let score = scorer.score(&candidate.value);
        match best {
            // Strict comparison: earlier candidates win ties.
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}
