//! Similarity scoring and ranking over the chunk table.
//!
//! Two scorers:
//! - cosine similarity between a query embedding and chunk embeddings
//! - keyword overlap for indexes built without an embedding model

use std::cmp::Ordering;

use folio_core::retriever::Passage;

use crate::indexer::Chunk;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]. Returns 0.0 for empty, zero-norm, or
/// mismatched-length inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |acc, (x, y)| {
        let (x, y) = (f64::from(*x), f64::from(*y));
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Lowercased alphanumeric terms of at least three characters.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '%')
        .filter(|t| t.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

/// Keyword relevance of `content` for `query`.
///
/// Counts occurrences of each query term in the content, normalized by
/// content length in hundreds of characters (minimum 1). Zero when no term
/// matches.
pub fn keyword_score(content: &str, query: &str) -> f32 {
    let query_terms = terms(query);
    if query_terms.is_empty() {
        return 0.0;
    }

    let content_lower = content.to_lowercase();
    let occurrences: usize = query_terms
        .iter()
        .map(|t| content_lower.matches(t.as_str()).count())
        .sum();

    occurrences as f32 / (content.len() as f32 / 100.0).max(1.0)
}

/// Rank chunks by cosine similarity to `query_embedding`.
///
/// Chunks without an embedding are skipped.
pub fn rank_by_embedding(
    chunks: &[Chunk],
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<Passage> {
    let scored = chunks.iter().filter_map(|chunk| {
        let emb = chunk.embedding.as_ref()?;
        Some((chunk, cosine_similarity(emb, query_embedding)))
    });
    top_passages(scored, limit, |score| score >= min_score)
}

/// Rank chunks by keyword overlap with `query`. Non-matching chunks are
/// never returned.
pub fn rank_by_keywords(chunks: &[Chunk], query: &str, limit: usize, min_score: f32) -> Vec<Passage> {
    let scored = chunks
        .iter()
        .map(|chunk| (chunk, keyword_score(&chunk.text, query)));
    top_passages(scored, limit, |score| score > 0.0 && score >= min_score)
}

fn top_passages<'a>(
    scored: impl Iterator<Item = (&'a Chunk, f32)>,
    limit: usize,
    keep: impl Fn(f32) -> bool,
) -> Vec<Passage> {
    let mut kept: Vec<(&Chunk, f32)> = scored.filter(|(_, s)| keep(*s)).collect();

    // Stable sort: ties keep document order.
    kept.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    kept.truncate(limit);

    kept.into_iter()
        .map(|(chunk, score)| Passage::new(chunk.text.clone(), chunk.source.clone(), score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str, embedding: Option<Vec<f32>>) -> Chunk {
        Chunk {
            id: id.into(),
            source: format!("{id}.txt"),
            index: 0,
            text: text.into(),
            embedding,
        }
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // 1 / sqrt(2)
        assert!((cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]) - 0.7071).abs() < 0.001);
    }

    #[test]
    fn embedding_rank_orders_and_limits() {
        let chunks = vec![
            chunk("a", "orthogonal", Some(vec![0.0, 1.0, 0.0])),
            chunk("b", "identical", Some(vec![1.0, 0.0, 0.0])),
            chunk("c", "partial", Some(vec![0.5, 0.5, 0.0])),
            chunk("d", "unembedded", None),
        ];

        let ranked = rank_by_embedding(&chunks, &[1.0, 0.0, 0.0], 10, 0.0);
        let texts: Vec<&str> = ranked.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["identical", "partial", "orthogonal"]);

        let top = rank_by_embedding(&chunks, &[1.0, 0.0, 0.0], 1, 0.0);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].source, "b.txt");
    }

    #[test]
    fn embedding_rank_respects_min_score() {
        let chunks = vec![
            chunk("a", "match", Some(vec![1.0, 0.0])),
            chunk("b", "miss", Some(vec![0.0, 1.0])),
        ];
        let ranked = rank_by_embedding(&chunks, &[1.0, 0.0], 10, 0.5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].text, "match");
    }

    #[test]
    fn keyword_score_counts_terms() {
        assert_eq!(keyword_score("Bonds and equities", "weather today"), 0.0);
        assert!(keyword_score("Bonds: 20%. More bonds.", "bonds allocation") >= 2.0);
    }

    #[test]
    fn keyword_rank_drops_non_matching() {
        let chunks = vec![
            chunk("a", "Equities make up 80% of the portfolio.", None),
            chunk("b", "Bonds make up 20% of the portfolio. Bonds are government issued.", None),
            chunk("c", "Unrelated meeting notes.", None),
        ];
        let ranked = rank_by_keywords(&chunks, "What is my bond allocation? bonds", 3, 0.0);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].source, "b.txt");
    }
}
