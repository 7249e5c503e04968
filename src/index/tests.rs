use super::*;

fn segment(id: usize, text: &str) -> Segment {
    Segment {
        id,
        text: text.to_string(),
        start: id * 10,
        end: id * 10 + text.chars().count(),
        source: "test.json".to_string(),
    }
}

fn three_segment_index() -> VectorIndex {
    let segments = vec![
        segment(0, "alpha"),
        segment(1, "beta"),
        segment(2, "gamma"),
    ];
    let vectors = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.7, 0.7, 0.0],
    ];
    VectorIndex::build(segments, vectors).expect("build should succeed")
}

#[test]
fn search_orders_by_descending_similarity() {
    let index = three_segment_index();
    let results = index.search(&[1.0, 0.0, 0.0], 3).expect("search should succeed");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].segment.text, "alpha");
    assert_eq!(results[1].segment.text, "gamma");
    assert_eq!(results[2].segment.text, "beta");

    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn search_returns_at_most_k_results() {
    let index = three_segment_index();
    let results = index.search(&[0.5, 0.5, 0.0], 2).expect("search should succeed");
    assert_eq!(results.len(), 2);
}

#[test]
fn k_larger_than_index_is_clamped() {
    let index = three_segment_index();
    let results = index.search(&[0.5, 0.5, 0.0], 50).expect("search should succeed");
    assert_eq!(results.len(), 3);
}

#[test]
fn empty_index_search_fails() {
    let index = VectorIndex::build(Vec::new(), Vec::new()).expect("empty build is fine");
    let result = index.search(&[1.0], 3);
    assert!(matches!(result, Err(crate::QaError::EmptyIndex)));
}

#[test]
fn mismatched_pair_counts_are_rejected() {
    let result = VectorIndex::build(vec![segment(0, "alpha")], Vec::new());
    assert!(matches!(
        result,
        Err(crate::QaError::InvalidConfiguration(_))
    ));
}

#[test]
fn mixed_dimensions_are_rejected() {
    let result = VectorIndex::build(
        vec![segment(0, "alpha"), segment(1, "beta")],
        vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
    );
    assert!(matches!(
        result,
        Err(crate::QaError::InvalidConfiguration(_))
    ));
}

#[test]
fn query_dimension_must_match() {
    let index = three_segment_index();
    let result = index.search(&[1.0, 0.0], 1);
    assert!(matches!(
        result,
        Err(crate::QaError::InvalidConfiguration(_))
    ));
}

#[test]
fn cosine_similarity_basics() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
}

#[test]
fn zero_norm_vectors_score_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
}

#[test]
fn identical_builds_give_identical_results() {
    let first = three_segment_index();
    let second = three_segment_index();

    let query = [0.3, 0.9, 0.1];
    let a = first.search(&query, 3).expect("search should succeed");
    let b = second.search(&query, 3).expect("search should succeed");
    assert_eq!(a, b);
}

#[test]
fn segments_carry_source_metadata() {
    let index = three_segment_index();
    let results = index.search(&[1.0, 0.0, 0.0], 1).expect("search should succeed");
    assert_eq!(results[0].segment.source, "test.json");
}
