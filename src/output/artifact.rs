//! Rendering and round-tripping of the visualization data file.
//!
//! The payload is emitted as a small JavaScript module of `const`
//! declarations so the static visualization can load it with a plain
//! script tag. Saving keeps a strategy-and-repo-tagged copy under
//! `saved/`; loading copies a previously saved file back into place,
//! skipping analysis entirely.

use super::view::VisualizationData;
use crate::distance::CouplingStrategy;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ARTIFACT_FILE_NAME: &str = "data.js";
pub const SAVED_DIR_NAME: &str = "saved";

/// Renders the payload as JavaScript `const` declarations.
pub fn render_js(data: &VisualizationData) -> Result<String> {
    let cities = serde_json::to_string_pretty(&data.cities)?;
    let routes = serde_json::to_string_pretty(&data.routes)?;
    let commit_to_files = serde_json::to_string_pretty(&data.commit_to_entities)?;
    let dates = serde_json::to_string_pretty(&data.modification_dates)?;
    let url = serde_json::to_string(&data.url)?;
    let branch = serde_json::to_string(&data.active_branch)?;
    let strategy = serde_json::to_string(&data.strategy)?;

    Ok(format!(
        "const citiesData = {cities};\n\
         const routesData = {routes};\n\
         const commitToFiles = {commit_to_files};\n\
         const filesModificationsDates = {dates};\n\
         const url = {url};\n\
         const activeBranch = {branch};\n\
         const couplings = {strategy};\n"
    ))
}

/// Writes the rendered payload to `out_dir/data.js`.
pub fn write_artifact(data: &VisualizationData, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(ARTIFACT_FILE_NAME);
    fs::write(&path, render_js(data)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote visualization data to {}", path.display());
    Ok(path)
}

/// Copies the current artifact to `<base>/saved/data_<strategy>_<repo>.js`.
pub fn save_artifact(
    artifact: &Path,
    strategy: CouplingStrategy,
    repo_name: &str,
    base_dir: &Path,
) -> Result<PathBuf> {
    let saved_dir = base_dir.join(SAVED_DIR_NAME);
    fs::create_dir_all(&saved_dir)
        .with_context(|| format!("Failed to create {}", saved_dir.display()))?;
    let target = saved_dir.join(format!("data_{strategy}_{repo_name}.js"));
    fs::copy(artifact, &target)
        .with_context(|| format!("Failed to save artifact to {}", target.display()))?;
    log::info!("Saved analysis to {}", target.display());
    Ok(target)
}

/// Copies a previously saved artifact into `out_dir/data.js`.
pub fn load_artifact(source: &Path, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let target = out_dir.join(ARTIFACT_FILE_NAME);
    fs::copy(source, &target)
        .with_context(|| format!("Failed to load artifact from {}", source.display()))?;
    log::info!("Loaded saved analysis from {}", source.display());
    Ok(target)
}
