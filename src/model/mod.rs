//! Domain model: entity identity and the entity-by-commit incidence matrix.

pub mod incidence;
pub mod resolver;

pub use incidence::{IncidenceModel, IncidenceModelBuilder, ModificationDates};
pub use resolver::IdentityResolver;

/// Delimiter joining composite entity keys (`path:line`, merged nodes).
pub const ENTITY_DELIMITER: char = ':';
