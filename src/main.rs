use anyhow::{bail, Result};
use couplemap::cli;
use couplemap::config::AnalysisConfig;
use couplemap::history::{GitHistoryProvider, HistoryProvider, RepoLocation};
use couplemap::output::{load_artifact, save_artifact, write_artifact};
use couplemap::related::{find_related_lines, LineQuery};
use couplemap::{run_analysis, AnalysisOutcome};
use std::path::Path;

fn main() -> Result<()> {
    let cli = cli::parse_args();
    init_logging(cli.debug);

    if let Some(saved) = &cli.load {
        load_artifact(saved, &cli.out_dir)?;
        return Ok(());
    }

    let Some(url) = cli.url.as_deref() else {
        bail!("A repository url or path is required unless --load is given");
    };

    let mut config = AnalysisConfig::load(Path::new("."))?;
    if cli.remove_bulk.is_some() {
        config.bulk_commit_threshold = cli.remove_bulk;
    }

    let repo = RepoLocation::open(url)?;
    let outcome = run_analysis(&repo, &config, cli.couplings)?;
    report_candidates(&outcome);

    if let Some(range) = &cli.related {
        run_related_query(&repo, &config, range)?;
    }

    let artifact = write_artifact(&outcome.data, &cli.out_dir)?;
    if cli.save {
        save_artifact(&artifact, cli.couplings, &outcome.repo_name, Path::new("."))?;
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn report_candidates(outcome: &AnalysisOutcome) {
    if outcome.candidates.is_empty() {
        println!("No clusters qualify as refactoring candidates.");
        return;
    }
    println!(
        "{} refactoring candidate(s), baseline entropy {}:",
        outcome.candidates.len(),
        outcome.candidates[0].baseline_entropy
    );
    for candidate in &outcome.candidates {
        println!(
            "  cluster {}: {} members, {} common commits, entropy delta {}",
            candidate.label,
            candidate.members.len(),
            candidate.common_commits,
            candidate.entropy_delta
        );
        for (file, lines) in &candidate.file_lines {
            if lines.is_empty() {
                println!("    {file}");
            } else {
                let spans: Vec<String> = lines
                    .sorted()
                    .into_iter()
                    .map(|(a, b)| format!("{a}-{b}"))
                    .collect();
                println!("    {file}: {}", spans.join(", "));
            }
        }
    }
}

fn run_related_query(repo: &RepoLocation, config: &AnalysisConfig, range: &str) -> Result<()> {
    let Some((path, start, end)) = cli::parse_line_range(range) else {
        bail!("Bad --related argument {range:?}, expected FILE:START-END");
    };

    // The related-lines query needs its own traversal-backed model.
    let provider = GitHistoryProvider::new(repo.root().to_path_buf())?;
    let commits = provider.traverse_commits()?;
    let snapshot = provider.snapshot_files()?;
    let model = couplemap::pipeline::build_model(&commits, snapshot, config, false);

    let report = find_related_lines(
        &provider,
        &model,
        LineQuery {
            path: path.clone(),
            start_line: start,
            end_line: end,
        },
        config.max_query_workers,
    )?;

    println!(
        "{} commit(s) touched {path}:{start}-{end}",
        report.touching_commits.len()
    );
    for (file, spans) in &report.related {
        for span in spans {
            println!(
                "  {file}:{}-{} shares {} commit(s)",
                span.lines.0, span.lines.1, span.shared_commits
            );
        }
    }
    if report.failed_queries > 0 {
        println!("  ({} line probe(s) failed and were excluded)", report.failed_queries);
    }
    Ok(())
}
