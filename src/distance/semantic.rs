//! Semantic coupling: TF-IDF cosine similarity over identifier corpora.
//!
//! Each entity's corpus is the list of identifiers appearing in its source,
//! split on underscore and camel-case boundaries, lower-cased and stemmed.
//! The provider returns a *similarity* matrix with diagonal 1; the `1 - s`
//! inversion belongs to the clustering adapter.

use super::{CouplingStrategy, DistanceProvider, MatrixKind, PairwiseMatrix};
use anyhow::Result;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("static regex"))
}

/// Entity -> preprocessed token list.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<(String, Vec<String>)>,
}

impl Corpus {
    /// Reads every snapshot file under `root` and extracts its token list.
    /// Unreadable files are skipped with a debug log, not errors.
    pub fn extract(root: &Path, files: &[String]) -> Self {
        let mut entries = Vec::new();
        for file in files {
            match std::fs::read_to_string(root.join(file)) {
                Ok(source) => {
                    let tokens = tokenize(&source);
                    entries.push((file.clone(), tokens));
                }
                Err(e) => {
                    log::debug!("Skipping {file} from corpus: {e}");
                }
            }
        }
        Self { entries }
    }

    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn entities(&self) -> Vec<String> {
        self.entries.iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vocabulary (set union of all tokens) in deterministic order.
    fn vocabulary(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .entries
            .iter()
            .flat_map(|(_, tokens)| tokens.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// One TF-IDF vector per entity, aligned to `entries` order.
    pub fn tf_idf_vectors(&self) -> Vec<Vec<f64>> {
        let vocabulary = self.vocabulary();
        let token_index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let tf: Vec<Vec<f64>> = self
            .entries
            .iter()
            .map(|(_, tokens)| term_frequencies(tokens, &token_index, vocabulary.len()))
            .collect();

        let idf = inverse_document_frequencies(&tf, self.entries.len());

        tf.into_iter()
            .map(|row| row.iter().zip(&idf).map(|(t, i)| t * i).collect())
            .collect()
    }
}

fn term_frequencies(
    tokens: &[String],
    token_index: &HashMap<&str, usize>,
    vocabulary_size: usize,
) -> Vec<f64> {
    let mut counts = vec![0.0; vocabulary_size];
    for token in tokens {
        if let Some(&i) = token_index.get(token.as_str()) {
            counts[i] += 1.0;
        }
    }
    if !tokens.is_empty() {
        let total = tokens.len() as f64;
        for value in &mut counts {
            *value /= total;
        }
    }
    counts
}

/// `ln(N / df)` per vocabulary token. A token in every document gets
/// `ln(1) = 0`; a zero document frequency cannot occur over a realized
/// vocabulary but is guarded as idf 0 rather than a division fault.
fn inverse_document_frequencies(tf: &[Vec<f64>], document_count: usize) -> Vec<f64> {
    let Some(first) = tf.first() else {
        return Vec::new();
    };
    (0..first.len())
        .map(|token| {
            let df = tf.iter().filter(|row| row[token] > 0.0).count();
            if df == 0 || document_count == 0 {
                0.0
            } else {
                (document_count as f64 / df as f64).ln()
            }
        })
        .collect()
}

/// Extracts identifiers and preprocesses them: split on `_` and camel-case
/// boundaries, lower-case, stem.
pub fn tokenize(source: &str) -> Vec<String> {
    identifier_regex()
        .find_iter(source)
        .flat_map(|m| split_identifier(m.as_str()))
        .map(|word| stem(&word.to_lowercase()))
        .filter(|word| !word.is_empty())
        .collect()
}

/// Splits a snake_case or camelCase identifier into its composing words.
/// `HTTPServer` splits as `HTTP` + `Server`.
pub fn split_identifier(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in identifier.split('_').filter(|p| !p.is_empty()) {
        let chars: Vec<char> = part.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let boundary = (chars[i - 1].is_lowercase() && chars[i].is_uppercase())
                || (i + 1 < chars.len()
                    && chars[i - 1].is_uppercase()
                    && chars[i].is_uppercase()
                    && chars[i + 1].is_lowercase());
            if boundary {
                words.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        words.push(chars[start..].iter().collect());
    }
    words
}

/// Compact suffix-stripping stemmer. Deliberately lighter than a full
/// Porter stemmer: enough to conflate `rename`/`renamed`/`renames` and
/// similar morphological variants in identifier text.
pub fn stem(word: &str) -> String {
    const RULES: &[(&str, &str)] = &[
        ("sses", "ss"),
        ("ies", "i"),
        ("tion", "t"),
        ("ment", ""),
        ("ing", ""),
        ("ed", ""),
        ("es", ""),
        ("s", ""),
    ];
    for (suffix, replacement) in RULES {
        if let Some(stripped) = word.strip_suffix(suffix) {
            // Keep short words intact; "ss" endings are not plurals.
            if stripped.len() >= 3 && !(*suffix == "s" && stripped.ends_with('s')) {
                return format!("{stripped}{replacement}");
            }
        }
    }
    word.to_string()
}

pub struct SemanticDistanceProvider {
    corpus: Corpus,
}

impl SemanticDistanceProvider {
    pub fn new(corpus: Corpus) -> Self {
        Self { corpus }
    }
}

impl DistanceProvider for SemanticDistanceProvider {
    fn strategy(&self) -> CouplingStrategy {
        CouplingStrategy::Semantic
    }

    fn get_distance_matrix(&self) -> Result<PairwiseMatrix> {
        let vectors = self.corpus.tf_idf_vectors();
        let n = vectors.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            // Diagonal is self-similarity, not distance.
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let s = cosine_similarity(&vectors[i], &vectors[j]);
                values[i][j] = s;
                values[j][i] = s;
            }
        }
        Ok(PairwiseMatrix::new(
            self.corpus.entities(),
            values,
            MatrixKind::Similarity,
        ))
    }
}

/// Cosine similarity, 0 when either vector has zero norm.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_snake_and_camel_case() {
        assert_eq!(split_identifier("commit_graph"), vec!["commit", "graph"]);
        assert_eq!(split_identifier("mergeNodes"), vec!["merge", "Nodes"]);
        assert_eq!(
            split_identifier("HTTPServerError"),
            vec!["HTTP", "Server", "Error"]
        );
        assert_eq!(split_identifier("__dunder__"), vec!["dunder"]);
    }

    #[test]
    fn stemming_conflates_variants() {
        assert_eq!(stem("renames"), stem("renamed"));
        assert_eq!(stem("merging"), "merg");
        // Short words stay intact.
        assert_eq!(stem("as"), "as");
        assert_eq!(stem("class"), "class");
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        let tokens = tokenize("fn mergeNodes(commit_graph: &Graph) {}");
        assert!(tokens.contains(&"merg".to_string()));
        assert!(tokens.contains(&"commit".to_string()));
        assert!(tokens.contains(&"graph".to_string()));
    }

    fn corpus(entries: &[(&str, &[&str])]) -> Corpus {
        Corpus::from_entries(
            entries
                .iter()
                .map(|(e, tokens)| {
                    (
                        e.to_string(),
                        tokens.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn shared_vocabulary_token_has_zero_idf() {
        let c = corpus(&[
            ("a.rs", &["graph", "merge"]),
            ("b.rs", &["graph", "cluster"]),
        ]);
        let vectors = c.tf_idf_vectors();
        // Vocabulary order is sorted: cluster, graph, merge.
        assert_eq!(vectors[0][1], 0.0);
        assert_eq!(vectors[1][1], 0.0);
        assert!(vectors[0][2] > 0.0);
    }

    #[test]
    fn similarity_matrix_has_unit_diagonal_and_symmetry() {
        let c = corpus(&[
            ("a.rs", &["graph", "merge", "node"]),
            ("b.rs", &["graph", "merge", "edge"]),
            ("c.rs", &["parser", "token"]),
        ]);
        let matrix = SemanticDistanceProvider::new(c)
            .get_distance_matrix()
            .unwrap();
        assert_eq!(matrix.kind(), MatrixKind::Similarity);
        for i in 0..matrix.len() {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..matrix.len() {
                assert!((matrix.get(i, j) - matrix.get(j, i)).abs() < 1e-12);
            }
        }
        // Disjoint vocabularies share nothing.
        assert_eq!(matrix.get(0, 2), 0.0);
    }

    #[test]
    fn entity_with_no_tokens_is_dissimilar_not_a_fault() {
        let c = corpus(&[("a.rs", &["graph"]), ("empty.rs", &[])]);
        let matrix = SemanticDistanceProvider::new(c)
            .get_distance_matrix()
            .unwrap();
        assert_eq!(matrix.get(0, 1), 0.0);
    }

    #[test]
    fn extract_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.rs"), "fn parse_header() {}").unwrap();
        let corpus = Corpus::extract(
            dir.path(),
            &["ok.rs".to_string(), "missing.rs".to_string()],
        );
        assert_eq!(corpus.entities(), vec!["ok.rs".to_string()]);
    }
}
