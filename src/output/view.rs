//! Assembles the data the city-map visualization consumes.
//!
//! Each cluster becomes a city placed at the normalized centroid of its
//! members' planar coordinates; each member becomes a building whose height
//! is its modification count and whose footprint is its line count. Routes
//! connect cities whose members co-occur in commits, weighted by how many
//! commits touch both.

use crate::cluster::Clustering;
use crate::distance::CouplingStrategy;
use crate::model::{IncidenceModel, ModificationDates};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub entity: String,
    /// Commits that touched the entity.
    pub height: u32,
    /// Current line count.
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub label: i32,
    /// Normalized to `[-1, 1]` per axis across all cities.
    pub centroid: (f64, f64),
    pub buildings: Vec<Building>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub from: i32,
    pub to: i32,
    /// Commits touching members of both endpoint cities.
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationData {
    pub url: String,
    pub active_branch: String,
    pub strategy: CouplingStrategy,
    pub cities: Vec<City>,
    pub routes: Vec<Route>,
    pub commit_to_entities: BTreeMap<String, Vec<String>>,
    pub modification_dates: BTreeMap<String, ModificationDates>,
}

impl VisualizationData {
    /// Builds the full visualization payload. `coordinates` is aligned to
    /// `clustering.entities` row order.
    pub fn build(
        url: &str,
        active_branch: &str,
        strategy: CouplingStrategy,
        clustering: &Clustering,
        model: &IncidenceModel,
        coordinates: &[(f64, f64)],
        line_count: &dyn Fn(&str) -> u32,
    ) -> Self {
        let coordinate_of: HashMap<&str, (f64, f64)> = clustering
            .entities
            .iter()
            .map(String::as_str)
            .zip(coordinates.iter().copied())
            .collect();

        let mut cities: Vec<City> = clustering
            .clusters
            .iter()
            .map(|(&label, members)| {
                let buildings = members
                    .iter()
                    .map(|entity| Building {
                        entity: entity.clone(),
                        height: model.modification_count(entity) as u32,
                        size: line_count(entity),
                    })
                    .collect();
                City {
                    label,
                    centroid: centroid(members, &coordinate_of),
                    buildings,
                }
            })
            .collect();
        normalize_centroids(&mut cities);

        Self {
            url: url.to_string(),
            active_branch: active_branch.to_string(),
            strategy,
            cities,
            routes: find_routes(clustering, model),
            commit_to_entities: model
                .commit_to_entities()
                .iter()
                .map(|(hash, entities)| (hash.clone(), entities.clone()))
                .collect(),
            modification_dates: model
                .all_dates()
                .iter()
                .map(|(entity, dates)| (entity.clone(), *dates))
                .collect(),
        }
    }
}

fn centroid(members: &[String], coordinate_of: &HashMap<&str, (f64, f64)>) -> (f64, f64) {
    let points: Vec<(f64, f64)> = members
        .iter()
        .filter_map(|m| coordinate_of.get(m.as_str()).copied())
        .collect();
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    (
        points.iter().map(|p| p.0).sum::<f64>() / n,
        points.iter().map(|p| p.1).sum::<f64>() / n,
    )
}

/// Scales centroids so the farthest city per axis sits at distance 1.
fn normalize_centroids(cities: &mut [City]) {
    let max_x = cities
        .iter()
        .map(|c| c.centroid.0.abs())
        .fold(0.0, f64::max);
    let max_y = cities
        .iter()
        .map(|c| c.centroid.1.abs())
        .fold(0.0, f64::max);
    for city in cities {
        if max_x > 0.0 {
            city.centroid.0 /= max_x;
        }
        if max_y > 0.0 {
            city.centroid.1 /= max_y;
        }
    }
}

/// One route per cluster pair whose members share at least one commit.
fn find_routes(clustering: &Clustering, model: &IncidenceModel) -> Vec<Route> {
    let mut weights: BTreeMap<(i32, i32), u32> = BTreeMap::new();
    for entities in model.commit_to_entities().values() {
        let mut labels: Vec<i32> = entities
            .iter()
            .filter_map(|e| clustering.label_of(e))
            .collect();
        labels.sort_unstable();
        labels.dedup();
        for (i, &from) in labels.iter().enumerate() {
            for &to in &labels[i + 1..] {
                *weights.entry((from, to)).or_insert(0) += 1;
            }
        }
    }
    weights
        .into_iter()
        .map(|((from, to), weight)| Route { from, to, weight })
        .collect()
}
