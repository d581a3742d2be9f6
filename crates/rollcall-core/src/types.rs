use crate::encodings::EncodingSet;
use serde::{Deserialize, Serialize};

/// Euclidean distance at or below which two embeddings are the same person.
///
/// Fixed for the L2-normalised ArcFace embeddings (roughly a cosine
/// similarity of 0.40). Not configurable.
pub const MATCH_TOLERANCE: f32 = 1.1;

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// Face embedding vector (512-dimensional for ArcFace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Euclidean distance between two embeddings of the same dimension.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Compare a probe against every known embedding.
///
/// Returns one flag per known embedding, in order: `true` when the
/// distance is within `tolerance`. Empty embeddings and embeddings whose
/// dimension differs from the probe never match.
pub fn compare_faces(known: &[Embedding], probe: &Embedding, tolerance: f32) -> Vec<bool> {
    known
        .iter()
        .map(|k| {
            k.dim() != 0 && k.dim() == probe.dim() && k.euclidean_distance(probe) <= tolerance
        })
        .collect()
}

/// Result of matching a probe embedding against the known set.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Index into the known set of the accepted match.
    pub index: Option<usize>,
    /// Label of the accepted match.
    pub label: Option<String>,
    /// Distance to the accepted match.
    pub distance: Option<f32>,
}

impl MatchResult {
    pub const UNKNOWN_LABEL: &'static str = "Unknown";

    pub fn no_match() -> Self {
        Self { index: None, label: None, distance: None }
    }

    pub fn is_match(&self) -> bool {
        self.label.is_some()
    }

    /// The matched label, or `"Unknown"`.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(Self::UNKNOWN_LABEL)
    }
}

/// Strategy for comparing a probe embedding against the known faces.
pub trait Matcher {
    fn compare(&self, probe: &Embedding, known: &EncodingSet) -> MatchResult;
}

/// Accepts the first known embedding within [`MATCH_TOLERANCE`].
///
/// Later entries are never consulted once one matches, even when they are
/// closer to the probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatchMatcher;

impl Matcher for FirstMatchMatcher {
    fn compare(&self, probe: &Embedding, known: &EncodingSet) -> MatchResult {
        let matches = compare_faces(known.embeddings(), probe, MATCH_TOLERANCE);

        match matches.iter().position(|&m| m) {
            Some(idx) => MatchResult {
                index: Some(idx),
                label: known.labels().get(idx).cloned(),
                distance: Some(known.embeddings()[idx].euclidean_distance(probe)),
            },
            None => MatchResult::no_match(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    fn known(entries: &[(&str, &[f32])]) -> EncodingSet {
        let mut set = EncodingSet::default();
        for (label, values) in entries {
            set.push(emb(values), *label);
        }
        set
    }

    #[test]
    fn test_euclidean_distance() {
        let d = emb(&[0.0, 0.0]).euclidean_distance(&emb(&[3.0, 4.0]));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_compare_faces_flags_each_entry() {
        let known = vec![emb(&[1.0, 0.0]), emb(&[0.0, 1.0]), emb(&[0.9, 0.1])];
        let flags = compare_faces(&known, &emb(&[1.0, 0.0]), 0.5);
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_compare_faces_rejects_dimension_mismatch() {
        let known = vec![emb(&[]), emb(&[5.0]), emb(&[5.0, -9.0, 9.0])];
        let flags = compare_faces(&known, &emb(&[5.0, -9.0, 9.0]), MATCH_TOLERANCE);
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_matcher_skips_empty_known_embedding() {
        let set = known(&[("A", &[]), ("B", &[0.0, 1.0, 0.0])]);
        let result = FirstMatchMatcher.compare(&emb(&[0.0, 1.0, 0.0]), &set);
        assert_eq!(result.label.as_deref(), Some("B"));
        assert_eq!(result.index, Some(1));
    }

    #[test]
    fn test_matcher_resolves_only_matching_label() {
        let set = known(&[("A", &[1.0, 0.0, 0.0]), ("B", &[0.0, 1.0, 0.0])]);
        let result = FirstMatchMatcher.compare(&emb(&[0.95, 0.1, 0.0]), &set);
        assert!(result.is_match());
        assert_eq!(result.label.as_deref(), Some("A"));
        assert_eq!(result.index, Some(0));
    }

    #[test]
    fn test_matcher_unknown_when_nothing_within_tolerance() {
        let set = known(&[("A", &[1.0, 0.0, 0.0]), ("B", &[0.0, 1.0, 0.0])]);
        let result = FirstMatchMatcher.compare(&emb(&[0.0, 0.0, 1.0]), &set);
        assert!(!result.is_match());
        assert_eq!(result.display_label(), "Unknown");
    }

    #[test]
    fn test_matcher_first_index_wins_over_closer_match() {
        // Both within tolerance; the second is an exact hit but the first wins.
        let set = known(&[("first", &[0.8, 0.6, 0.0]), ("exact", &[1.0, 0.0, 0.0])]);
        let result = FirstMatchMatcher.compare(&emb(&[1.0, 0.0, 0.0]), &set);
        assert_eq!(result.label.as_deref(), Some("first"));
        assert_eq!(result.index, Some(0));
        assert!(result.distance.unwrap() > 0.0);
    }

    #[test]
    fn test_matcher_empty_set() {
        let result = FirstMatchMatcher.compare(&emb(&[1.0, 0.0]), &EncodingSet::default());
        assert_eq!(result, MatchResult::no_match());
    }
}
