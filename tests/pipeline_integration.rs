//! End-to-end tests over scripted git repositories.

use couplemap::config::AnalysisConfig;
use couplemap::distance::CouplingStrategy;
use couplemap::history::{GitHistoryProvider, HistoryProvider, RepoLocation};
use couplemap::pipeline::{build_model, run_analysis};
use couplemap::related::{find_related_lines, LineQuery};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(repo: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path();
    git(path, &["init", "-b", "main"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test"]);
    dir
}

fn commit_files(repo: &Path, message: &str, files: &[(&str, &str)]) {
    for (name, contents) in files {
        std::fs::write(repo.join(name), contents).expect("write file");
        git(repo, &["add", name]);
    }
    git(repo, &["commit", "-m", message]);
}

fn head_hashes(repo: &Path) -> Vec<String> {
    let output = Command::new("git")
        .args(["log", "--reverse", "--format=%H"])
        .current_dir(repo)
        .output()
        .expect("git log");
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Two files co-changing three times, one loner changing twice.
fn coupled_pair_repo() -> TempDir {
    let dir = init_repo();
    let path = dir.path();
    commit_files(
        path,
        "add pair",
        &[("a.rs", "fn a() {}\n"), ("b.rs", "fn b() {}\n")],
    );
    commit_files(
        path,
        "grow pair",
        &[("a.rs", "fn a() { a2(); }\n"), ("b.rs", "fn b() { b2(); }\n")],
    );
    commit_files(
        path,
        "grow pair again",
        &[
            ("a.rs", "fn a() { a2(); a3(); }\n"),
            ("b.rs", "fn b() { b2(); b3(); }\n"),
        ],
    );
    commit_files(path, "add loner", &[("c.rs", "fn c() {}\n")]);
    commit_files(path, "touch loner", &[("c.rs", "fn c() { c2(); }\n")]);
    dir
}

#[test]
fn traversal_builds_expected_incidence_rows() {
    let repo = coupled_pair_repo();
    let provider = GitHistoryProvider::new(repo.path().to_path_buf()).unwrap();

    let commits = provider.traverse_commits().unwrap();
    assert_eq!(commits.len(), 5);
    // Chronological order.
    assert_eq!(
        commits.iter().map(|c| c.hash.clone()).collect::<Vec<_>>(),
        head_hashes(repo.path())
    );

    let snapshot = provider.snapshot_files().unwrap();
    let model = build_model(&commits, snapshot, &AnalysisConfig::default(), false);

    assert_eq!(model.row("a.rs").unwrap(), &[1, 1, 1, 0, 0]);
    assert_eq!(model.row("b.rs").unwrap(), &[1, 1, 1, 0, 0]);
    assert_eq!(model.row("c.rs").unwrap(), &[0, 0, 0, 1, 1]);
}

#[test]
fn renamed_file_keeps_its_history() {
    let dir = init_repo();
    let path = dir.path();
    commit_files(path, "add", &[("old_name.rs", "fn stable_content() {}\n")]);
    commit_files(
        path,
        "tweak",
        &[("old_name.rs", "fn stable_content() { x(); }\n")],
    );
    git(path, &["mv", "old_name.rs", "new_name.rs"]);
    git(path, &["commit", "-m", "rename"]);

    let provider = GitHistoryProvider::new(path.to_path_buf()).unwrap();
    let commits = provider.traverse_commits().unwrap();
    let snapshot = provider.snapshot_files().unwrap();
    let model = build_model(&commits, snapshot, &AnalysisConfig::default(), false);

    assert_eq!(model.entities(), &["new_name.rs".to_string()]);
    assert_eq!(model.row("new_name.rs").unwrap(), &[1, 1, 1]);
}

#[test]
fn logical_analysis_finds_the_coupled_pair() {
    let repo = coupled_pair_repo();
    let location = RepoLocation::open(repo.path().to_str().unwrap()).unwrap();
    let config = AnalysisConfig::default();

    let outcome = run_analysis(&location, &config, CouplingStrategy::Logical).unwrap();

    // a.rs and b.rs are identically coupled and land in one cluster; c.rs
    // stands alone.
    let pair_city = outcome
        .data
        .cities
        .iter()
        .find(|c| c.buildings.len() == 2)
        .expect("expected a two-building city");
    let mut names: Vec<&str> = pair_city
        .buildings
        .iter()
        .map(|b| b.entity.as_str())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.rs", "b.rs"]);

    assert_eq!(outcome.candidates.len(), 1);
    let candidate = &outcome.candidates[0];
    assert_eq!(candidate.common_commits, 3);
    // Merging the pair removes its mutual coupling.
    assert!(candidate.entropy_delta < 0);

    assert_eq!(outcome.data.active_branch, "main");
    assert!(outcome
        .data
        .commit_to_entities
        .values()
        .any(|files| files.contains(&"c.rs".to_string())));
}

#[test]
fn semantic_analysis_runs_on_real_sources() {
    let dir = init_repo();
    let path = dir.path();
    commit_files(
        path,
        "add sources",
        &[
            ("parser.rs", "fn parse_token(token_stream: &str) {}\n"),
            ("lexer.rs", "fn lex_token(token_stream: &str) {}\n"),
            ("render.rs", "fn draw_frame(canvas_size: u32) {}\n"),
        ],
    );
    commit_files(path, "touch parser", &[("parser.rs", "fn parse_token(stream: &str) { let token_stream = stream; }\n")]);

    let location = RepoLocation::open(path.to_str().unwrap()).unwrap();
    let outcome =
        run_analysis(&location, &AnalysisConfig::default(), CouplingStrategy::Semantic).unwrap();

    // Every snapshot file appears as a building somewhere.
    let building_count: usize = outcome.data.cities.iter().map(|c| c.buildings.len()).sum();
    assert_eq!(building_count, 3);
}

#[test]
fn line_queries_and_related_lines_over_git_history() {
    let dir = init_repo();
    let path = dir.path();
    commit_files(
        path,
        "add files",
        &[
            ("alpha.rs", "line one\nline two\nline three\n"),
            ("beta.rs", "first\nsecond\n"),
        ],
    );
    // Touch alpha line 2 and beta line 1 in the same commit.
    commit_files(
        path,
        "coupled edit",
        &[
            ("alpha.rs", "line one\nline two changed\nline three\n"),
            ("beta.rs", "first changed\nsecond\n"),
        ],
    );

    let provider = GitHistoryProvider::new(path.to_path_buf()).unwrap();
    let hashes = head_hashes(path);

    let touching = provider.commits_touching_lines(2, 2, "alpha.rs").unwrap();
    assert!(touching.contains(&hashes[0]));
    assert!(touching.contains(&hashes[1]));

    let commits = provider.traverse_commits().unwrap();
    let snapshot = provider.snapshot_files().unwrap();
    let model = build_model(&commits, snapshot, &AnalysisConfig::default(), false);

    let report = find_related_lines(
        &provider,
        &model,
        LineQuery {
            path: "alpha.rs".to_string(),
            start_line: 2,
            end_line: 2,
        },
        4,
    )
    .unwrap();

    assert_eq!(report.failed_queries, 0);
    // beta.rs line 1 shares both commits with the queried line.
    let beta = report.related.get("beta.rs").expect("beta.rs related spans");
    assert!(beta.iter().any(|span| span.lines.0 <= 1 && 1 <= span.lines.1));
}

#[test]
fn bulk_commit_filter_drops_wide_commits() {
    let dir = init_repo();
    let path = dir.path();
    commit_files(
        path,
        "sweeping change",
        &[
            ("a.rs", "a\n"),
            ("b.rs", "b\n"),
            ("c.rs", "c\n"),
            ("d.rs", "d\n"),
        ],
    );
    commit_files(path, "focused change", &[("a.rs", "a2\n")]);

    let provider = GitHistoryProvider::new(path.to_path_buf()).unwrap();
    let commits = provider.traverse_commits().unwrap();
    let snapshot = provider.snapshot_files().unwrap();

    let config = AnalysisConfig {
        bulk_commit_threshold: Some(3),
        ..AnalysisConfig::default()
    };
    let model = build_model(&commits, snapshot, &config, false);

    assert_eq!(model.commit_count(), 1);
    assert_eq!(model.row("a.rs").unwrap(), &[1]);
    assert!(model.row("b.rs").is_none());
}
