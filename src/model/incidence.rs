//! Incidence model: entity-by-commit presence matrix plus auxiliary maps.
//!
//! Built by streaming commits through [`IncidenceModelBuilder`] and sealed
//! with [`IncidenceModelBuilder::finish`]. The finished model is immutable;
//! what-if exploration (merge simulation) clones it.

use super::resolver::IdentityResolver;
use crate::history::CommitRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// First and last commit dates of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModificationDates {
    pub creation_date: DateTime<Utc>,
    pub last_modification: DateTime<Utc>,
}

/// Accumulates incidence rows across an ordered commit stream.
pub struct IncidenceModelBuilder<'a> {
    resolver: &'a IdentityResolver,
    excluded: &'a dyn Fn(&str) -> bool,
    bulk_commit_threshold: Option<usize>,
    columns: Vec<String>,
    entities: Vec<String>,
    entity_index: HashMap<String, usize>,
    rows: Vec<Vec<u8>>,
    commit_to_entities: HashMap<String, Vec<String>>,
    dates: HashMap<String, ModificationDates>,
    skipped_bulk_commits: usize,
}

impl<'a> IncidenceModelBuilder<'a> {
    pub fn new(
        resolver: &'a IdentityResolver,
        excluded: &'a dyn Fn(&str) -> bool,
        bulk_commit_threshold: Option<usize>,
    ) -> Self {
        Self {
            resolver,
            excluded,
            bulk_commit_threshold,
            columns: Vec::new(),
            entities: Vec::new(),
            entity_index: HashMap::new(),
            rows: Vec::new(),
            commit_to_entities: HashMap::new(),
            dates: HashMap::new(),
            skipped_bulk_commits: 0,
        }
    }

    /// Folds one commit into the model. Commits above the bulk threshold are
    /// dropped entirely (no column).
    pub fn add_commit(&mut self, commit: &CommitRecord) {
        if let Some(threshold) = self.bulk_commit_threshold {
            if commit.modifications.len() > threshold {
                self.skipped_bulk_commits += 1;
                return;
            }
        }

        self.columns.push(commit.hash.clone());
        let column = self.columns.len() - 1;
        let mut modified: Vec<String> = Vec::new();

        for modification in &commit.modifications {
            let Some(new_path) = modification.new_path.as_deref() else {
                continue;
            };
            if (self.excluded)(new_path) {
                continue;
            }
            let Some(entity) = self.resolver.resolve(new_path) else {
                // Resolution failure: silently exclude from the model.
                continue;
            };
            let entity = entity.to_string();

            self.mark_present(&entity, column);
            self.update_dates(&entity, commit.timestamp);
            if !modified.contains(&entity) {
                modified.push(entity);
            }
        }

        self.commit_to_entities.insert(commit.hash.clone(), modified);
    }

    fn mark_present(&mut self, entity: &str, column: usize) {
        let row_index = match self.entity_index.get(entity) {
            Some(&i) => i,
            None => {
                let i = self.entities.len();
                self.entities.push(entity.to_string());
                self.entity_index.insert(entity.to_string(), i);
                self.rows.push(Vec::new());
                i
            }
        };
        let row = &mut self.rows[row_index];
        // Back-fill commits that predate this entity's first appearance or
        // that skipped it.
        while row.len() < column {
            row.push(0);
        }
        if row.len() == column {
            row.push(1);
        }
        // A second modification resolving to the same entity in the same
        // commit leaves the cell at 1.
    }

    fn update_dates(&mut self, entity: &str, timestamp: DateTime<Utc>) {
        self.dates
            .entry(entity.to_string())
            .and_modify(|d| d.last_modification = timestamp)
            .or_insert(ModificationDates {
                creation_date: timestamp,
                last_modification: timestamp,
            });
    }

    /// Seals the model. Every row is right-padded with 0 to the total column
    /// count, so all rows have exactly one cell per commit seen.
    pub fn finish(mut self) -> IncidenceModel {
        let width = self.columns.len();
        for row in &mut self.rows {
            while row.len() < width {
                row.push(0);
            }
        }
        if self.skipped_bulk_commits > 0 {
            log::info!(
                "Dropped {} bulk commits above the configured threshold",
                self.skipped_bulk_commits
            );
        }
        IncidenceModel {
            columns: self.columns,
            entities: self.entities,
            entity_index: self.entity_index,
            rows: self.rows,
            commit_to_entities: self.commit_to_entities,
            dates: self.dates,
        }
    }
}

/// The finished entity-by-commit presence matrix.
#[derive(Debug, Clone)]
pub struct IncidenceModel {
    columns: Vec<String>,
    entities: Vec<String>,
    entity_index: HashMap<String, usize>,
    rows: Vec<Vec<u8>>,
    commit_to_entities: HashMap<String, Vec<String>>,
    dates: HashMap<String, ModificationDates>,
}

impl IncidenceModel {
    /// Entities in first-appearance order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Commit hashes in traversal (chronological) order.
    pub fn commit_hashes(&self) -> &[String] {
        &self.columns
    }

    pub fn commit_count(&self) -> usize {
        self.columns.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn row(&self, entity: &str) -> Option<&[u8]> {
        self.entity_index
            .get(entity)
            .map(|&i| self.rows[i].as_slice())
    }

    pub fn row_by_index(&self, index: usize) -> &[u8] {
        &self.rows[index]
    }

    /// Number of commits in which the entity appears.
    pub fn modification_count(&self, entity: &str) -> usize {
        self.row(entity)
            .map(|row| row.iter().filter(|&&c| c == 1).count())
            .unwrap_or(0)
    }

    /// Entities resolved in a given commit.
    pub fn entities_in_commit(&self, hash: &str) -> Option<&[String]> {
        self.commit_to_entities.get(hash).map(Vec::as_slice)
    }

    pub fn commit_to_entities(&self) -> &HashMap<String, Vec<String>> {
        &self.commit_to_entities
    }

    pub fn dates(&self, entity: &str) -> Option<&ModificationDates> {
        self.dates.get(entity)
    }

    pub fn all_dates(&self) -> &HashMap<String, ModificationDates> {
        &self.dates
    }

    /// Number of commits touching every entity of `members` simultaneously.
    pub fn common_commit_count(&self, members: &[String]) -> usize {
        let rows: Option<Vec<&[u8]>> = members.iter().map(|m| self.row(m)).collect();
        let Some(rows) = rows else {
            return 0;
        };
        if rows.is_empty() {
            return 0;
        }
        (0..self.columns.len())
            .filter(|&c| rows.iter().all(|row| row[c] == 1))
            .count()
    }

    /// A deep copy with `a` and `b` replaced by a single composite entity
    /// whose row is the logical OR of the two source rows. Returns `None`
    /// when either entity is unknown. The original model is untouched.
    pub fn merge_entities(&self, a: &str, b: &str, composite: &str) -> Option<IncidenceModel> {
        let row_a = self.row(a)?;
        let row_b = self.row(b)?;
        let merged_row: Vec<u8> = row_a
            .iter()
            .zip(row_b)
            .map(|(&x, &y)| if x == 1 || y == 1 { 1 } else { 0 })
            .collect();

        let mut entities = Vec::with_capacity(self.entities.len() - 1);
        let mut rows = Vec::with_capacity(self.rows.len() - 1);
        for (entity, row) in self.entities.iter().zip(&self.rows) {
            if entity != a && entity != b {
                entities.push(entity.clone());
                rows.push(row.clone());
            }
        }
        entities.push(composite.to_string());
        rows.push(merged_row);

        let entity_index = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.clone(), i))
            .collect();

        Some(IncidenceModel {
            columns: self.columns.clone(),
            entities,
            entity_index,
            rows,
            commit_to_entities: self.commit_to_entities.clone(),
            dates: self.dates.clone(),
        })
    }
}
