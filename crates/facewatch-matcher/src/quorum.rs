// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quorum matching of detected faces against reference photos.
//!
//! An identity matches an image when at least `min_matching_faces` of its
//! reference photos are within `threshold` (Euclidean distance, inclusive)
//! of some detected face. A reference photo counts once no matter how many
//! detected faces it is close to.

use std::path::PathBuf;

use facewatch_core::FaceEmbedding;

/// Embeddings computed from one reference photo.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePhoto {
    pub source: PathBuf,
    pub embeddings: Vec<FaceEmbedding>,
}

/// A person of interest and where to notify when they appear.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Reference directory name and configuration key.
    pub key: String,
    /// Display name, used as the notification caption.
    pub name: String,
    pub destination: String,
    pub references: Vec<ReferencePhoto>,
}

/// Deployment-wide matching parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Maximum distance for a reference photo to count; lower is stricter.
    pub threshold: f32,
    /// Reference photos that must agree before an identity matches.
    pub min_matching_faces: usize,
}

/// An identity that reached quorum for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityMatch {
    pub key: String,
    pub matched_references: usize,
    pub total_references: usize,
    /// Smallest distance over all counted reference photos.
    pub best_distance: f32,
}

/// Euclidean distance. Embeddings of different dimension never match.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Closest distance between any detected face and any embedding of `photo`.
fn photo_distance(faces: &[FaceEmbedding], photo: &ReferencePhoto) -> f32 {
    faces
        .iter()
        .flat_map(|face| {
            photo
                .embeddings
                .iter()
                .map(move |r| l2_distance(face.as_slice(), r.as_slice()))
        })
        .fold(f32::INFINITY, f32::min)
}

/// Evaluates one identity. Returns `None` below quorum.
pub fn evaluate_identity(
    faces: &[FaceEmbedding],
    identity: &Identity,
    policy: MatchPolicy,
) -> Option<IdentityMatch> {
    let counted: Vec<f32> = identity
        .references
        .iter()
        .map(|photo| photo_distance(faces, photo))
        .filter(|d| *d <= policy.threshold)
        .collect();

    if counted.is_empty() || counted.len() < policy.min_matching_faces {
        return None;
    }
    Some(IdentityMatch {
        key: identity.key.clone(),
        matched_references: counted.len(),
        total_references: identity.references.len(),
        best_distance: counted.iter().copied().fold(f32::INFINITY, f32::min),
    })
}

/// Evaluates every identity. Matches are ordered by best distance.
pub fn evaluate(
    faces: &[FaceEmbedding],
    identities: &[Identity],
    policy: MatchPolicy,
) -> Vec<IdentityMatch> {
    let mut matches: Vec<IdentityMatch> = identities
        .iter()
        .filter_map(|identity| evaluate_identity(faces, identity, policy))
        .collect();
    matches.sort_by(|a, b| a.best_distance.total_cmp(&b.best_distance));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use facewatch_test_utils::fixtures::{embedding_at_distance, face_at_origin};
    use proptest::prelude::*;

    fn identity(key: &str, distances: &[f32]) -> Identity {
        Identity {
            key: key.to_string(),
            name: key.to_uppercase(),
            destination: format!("{key}@g.us"),
            references: distances
                .iter()
                .enumerate()
                .map(|(i, d)| ReferencePhoto {
                    source: PathBuf::from(format!("ref_{i}.png")),
                    embeddings: vec![embedding_at_distance(*d, i)],
                })
                .collect(),
        }
    }

    const POLICY: MatchPolicy = MatchPolicy {
        threshold: 0.5,
        min_matching_faces: 2,
    };

    #[test]
    fn l2_distance_basics() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(l2_distance(&[1.0], &[1.0]), 0.0);
        assert!(l2_distance(&[1.0], &[1.0, 2.0]).is_infinite());
    }

    #[test]
    fn two_of_three_references_reach_quorum() {
        let ann = identity("ann", &[0.3, 0.45, 0.7]);
        let m = evaluate_identity(&[face_at_origin()], &ann, POLICY).unwrap();
        assert_eq!(m.matched_references, 2);
        assert_eq!(m.total_references, 3);
        assert!((m.best_distance - 0.3).abs() < 1e-6);
    }

    #[test]
    fn one_of_three_references_is_no_match() {
        let ann = identity("ann", &[0.3, 0.6, 0.7]);
        assert!(evaluate_identity(&[face_at_origin()], &ann, POLICY).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let ann = identity("ann", &[0.5, 0.5]);
        assert!(evaluate_identity(&[face_at_origin()], &ann, POLICY).is_some());
    }

    #[test]
    fn a_reference_photo_counts_once_for_many_faces() {
        // Two detected faces, both close to the same single reference.
        let ann = identity("ann", &[0.1, 0.9]);
        let faces = vec![face_at_origin(), embedding_at_distance(0.05, 0)];
        assert!(evaluate_identity(&faces, &ann, POLICY).is_none());
    }

    #[test]
    fn different_faces_can_satisfy_different_references() {
        let ann = Identity {
            references: vec![
                ReferencePhoto {
                    source: "a.png".into(),
                    embeddings: vec![FaceEmbedding(vec![0.0, 0.0])],
                },
                ReferencePhoto {
                    source: "b.png".into(),
                    embeddings: vec![FaceEmbedding(vec![10.0, 10.0])],
                },
            ],
            ..identity("ann", &[])
        };
        let faces = vec![
            FaceEmbedding(vec![0.1, 0.0]),
            FaceEmbedding(vec![10.0, 10.2]),
        ];
        let m = evaluate_identity(&faces, &ann, POLICY).unwrap();
        assert_eq!(m.matched_references, 2);
    }

    #[test]
    fn no_faces_or_no_references_never_match() {
        let ann = identity("ann", &[0.1, 0.1]);
        assert!(evaluate_identity(&[], &ann, POLICY).is_none());
        let empty = identity("empty", &[]);
        let lenient = MatchPolicy {
            threshold: 1.0,
            min_matching_faces: 0,
        };
        assert!(evaluate_identity(&[face_at_origin()], &empty, lenient).is_none());
    }

    #[test]
    fn evaluate_returns_every_identity_at_quorum_sorted() {
        let identities = vec![
            identity("ann", &[0.3, 0.45, 0.7]),
            identity("ben", &[0.2, 0.25, 0.9]),
            identity("cat", &[0.8, 0.9, 0.95]),
        ];
        let matches = evaluate(&[face_at_origin()], &identities, POLICY);
        let keys: Vec<&str> = matches.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["ben", "ann"]);
    }

    proptest! {
        #[test]
        fn matched_count_is_bounded_and_monotonic_in_threshold(
            distances in proptest::collection::vec(0.0f32..2.0, 1..8),
            threshold in 0.0f32..2.0,
            extra in 0.0f32..1.0,
        ) {
            let ann = identity("ann", &distances);
            let faces = [face_at_origin()];
            let strict = MatchPolicy { threshold, min_matching_faces: 1 };
            let loose = MatchPolicy { threshold: threshold + extra, min_matching_faces: 1 };

            let strict_count = evaluate_identity(&faces, &ann, strict)
                .map_or(0, |m| m.matched_references);
            let loose_count = evaluate_identity(&faces, &ann, loose)
                .map_or(0, |m| m.matched_references);

            prop_assert!(strict_count <= distances.len());
            prop_assert!(strict_count <= loose_count);
        }
    }
}
