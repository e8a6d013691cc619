//! Visualization data assembly and artifact I/O.

pub mod artifact;
pub mod view;

pub use artifact::{load_artifact, render_js, save_artifact, write_artifact, ARTIFACT_FILE_NAME};
pub use view::{Building, City, Route, VisualizationData};
