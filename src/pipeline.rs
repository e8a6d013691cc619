//! End-to-end analysis pipeline.
//!
//! Wires the stages together: traverse history, build the incidence model,
//! compute pairwise distances, cluster, build the coupling graph, evaluate
//! refactoring candidates, embed to the plane, assemble visualization data.

use crate::cluster::{cluster, AgglomerativeBackend, Clustering, ClusteringBackend, DensityBackend};
use crate::config::AnalysisConfig;
use crate::distance::{
    Corpus, CouplingStrategy, DistanceProvider, LogicalDistanceProvider, PairwiseMatrix,
    SemanticDistanceProvider,
};
use crate::embed::{ClassicalMdsBackend, EmbeddingBackend};
use crate::graph::simulate::{evaluate_candidates, RefactoringCandidate};
use crate::graph::CouplingGraph;
use crate::history::{CommitRecord, GitHistoryProvider, HistoryProvider, RepoLocation};
use crate::model::{IdentityResolver, IncidenceModel, IncidenceModelBuilder};
use crate::output::VisualizationData;
use anyhow::Result;
use indicatif::ProgressBar;

pub struct AnalysisOutcome {
    pub repo_name: String,
    pub data: VisualizationData,
    pub candidates: Vec<RefactoringCandidate>,
}

/// Runs the whole analysis for an already-opened repository.
pub fn run_analysis(
    repo: &RepoLocation,
    config: &AnalysisConfig,
    strategy: CouplingStrategy,
) -> Result<AnalysisOutcome> {
    let provider = GitHistoryProvider::new(repo.root().to_path_buf())?;

    log::info!("[1/5] Traversing commit history");
    let commits = provider.traverse_commits()?;
    let snapshot = provider.snapshot_files()?;
    log::info!(
        "{} commits, {} files in the current snapshot",
        commits.len(),
        snapshot.len()
    );

    log::info!("[2/5] Building the incidence model");
    let model = build_model(&commits, snapshot.clone(), config, true);

    log::info!("[3/5] Computing {strategy} coupling distances");
    let matrix = distance_matrix(strategy, &model, &provider, &snapshot, config)?;

    log::info!("[4/5] Clustering {} entities", matrix.len());
    let backend = backend_for(strategy, config);
    let clustering = cluster(
        matrix.clone(),
        backend.as_ref(),
        config.join_clusterless_entities,
    );

    log::info!("[5/5] Evaluating clusters and laying out the map");
    let graph = graph_for(strategy, &model, &clustering);
    let sizes = |entity: &str| provider.line_count(entity);
    let candidates = evaluate_candidates(&clustering, &model, &graph, &sizes);

    let coordinates = ClassicalMdsBackend::default().fit_transform(&matrix);
    let data = VisualizationData::build(
        repo.url(),
        &provider.active_branch()?,
        strategy,
        &clustering,
        &model,
        &coordinates,
        &sizes,
    );

    Ok(AnalysisOutcome {
        repo_name: repo.name().to_string(),
        data,
        candidates,
    })
}

/// Builds the incidence model from an ordered commit stream: renames feed
/// the identity resolver, then each commit folds into the matrix.
pub fn build_model(
    commits: &[CommitRecord],
    snapshot: Vec<String>,
    config: &AnalysisConfig,
    show_progress: bool,
) -> IncidenceModel {
    let mut resolver = IdentityResolver::new(snapshot, config.rename_hop_bound);
    for commit in commits {
        for modification in &commit.modifications {
            if let (Some(old), Some(new)) = (
                modification.old_path.as_deref(),
                modification.new_path.as_deref(),
            ) {
                if old != new {
                    resolver.record_rename(old, new);
                }
            }
        }
    }

    let excluded = |path: &str| config.is_excluded_path(path);
    let mut builder =
        IncidenceModelBuilder::new(&resolver, &excluded, config.bulk_commit_threshold);
    let bar = if show_progress {
        ProgressBar::new(commits.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_message("commits");
    for commit in commits {
        builder.add_commit(commit);
        bar.inc(1);
    }
    bar.finish_and_clear();
    builder.finish()
}

fn distance_matrix(
    strategy: CouplingStrategy,
    model: &IncidenceModel,
    provider: &GitHistoryProvider,
    snapshot: &[String],
    config: &AnalysisConfig,
) -> Result<PairwiseMatrix> {
    match strategy {
        CouplingStrategy::Logical => LogicalDistanceProvider::new(model).get_distance_matrix(),
        CouplingStrategy::Semantic => {
            let files: Vec<String> = snapshot
                .iter()
                .filter(|f| !config.is_excluded_path(f))
                .cloned()
                .collect();
            let corpus = Corpus::extract(provider.root(), &files);
            SemanticDistanceProvider::new(corpus).get_distance_matrix()
        }
    }
}

/// Logical coupling clusters with the agglomerative backend, semantic with
/// the density backend.
fn backend_for(strategy: CouplingStrategy, config: &AnalysisConfig) -> Box<dyn ClusteringBackend> {
    match strategy {
        CouplingStrategy::Logical => Box::new(AgglomerativeBackend::new(
            config.clustering_distance_threshold,
        )),
        CouplingStrategy::Semantic => Box::new(DensityBackend::default()),
    }
}

/// The coupling graph always reflects co-change history, but for semantic
/// coupling the clustered entities come from the corpus, so the graph is
/// restricted to entities the clustering knows about.
fn graph_for(
    strategy: CouplingStrategy,
    model: &IncidenceModel,
    clustering: &Clustering,
) -> CouplingGraph {
    match strategy {
        CouplingStrategy::Logical => CouplingGraph::from_model(model),
        CouplingStrategy::Semantic => {
            let mut graph = CouplingGraph::new();
            for hash in model.commit_hashes() {
                if let Some(entities) = model.entities_in_commit(hash) {
                    let known: Vec<String> = entities
                        .iter()
                        .filter(|e| clustering.entities.contains(e))
                        .cloned()
                        .collect();
                    graph.record_commit(&known);
                }
            }
            graph
        }
    }
}
