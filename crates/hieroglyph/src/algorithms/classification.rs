use std::{cmp::Ordering, collections::BTreeMap, ops::Range};

use tracing::debug;

use crate::{
    catalog::Catalog,
    config::FeatureWeights,
    error::ClassifyError,
    traits::{Classifier, DistanceMetric},
    types::{ClassId, FeatureVector, Match},
};

/// Plain Euclidean distance
#[derive(Debug, Clone, Default)]
pub struct Euclidean;

impl DistanceMetric for Euclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}

/// Euclidean distance with a weight per feature
#[derive(Debug, Clone)]
pub struct WeightedEuclidean {
    weights: Vec<f64>,
}

impl WeightedEuclidean {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// Expand per-group weights over a descriptor layout
    pub fn from_layout(layout: &[(&'static str, Range<usize>)], weights: &FeatureWeights) -> Self {
        let dimension = layout.iter().map(|(_, range)| range.end).max().unwrap_or(0);
        let mut expanded = vec![1.0; dimension];
        for (name, range) in layout {
            let weight = weights.for_group(name);
            expanded[range.clone()].iter_mut().for_each(|w| *w = weight);
        }
        Self::new(expanded)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl DistanceMetric for WeightedEuclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(i, (x, y))| self.weights.get(i).copied().unwrap_or(1.0) * (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}

/// Closest first; equal distances go to the lower class ID
fn match_order(a: &Match, b: &Match) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.class_id.cmp(&b.class_id))
}

/// Brute-force nearest-neighbour search over every template
#[derive(Debug, Clone, Default)]
pub struct NearestNeighborClassifier<M = WeightedEuclidean> {
    pub metric: M,
}

impl<M: DistanceMetric> NearestNeighborClassifier<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    fn check(&self, vector: &FeatureVector, catalog: &Catalog) -> Result<(), ClassifyError> {
        if catalog.is_empty() {
            return Err(ClassifyError::EmptyCatalog);
        }
        if vector.len() != catalog.dimension() {
            return Err(ClassifyError::DimensionMismatch {
                expected: catalog.dimension(),
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn matches<'a>(&'a self, vector: &'a FeatureVector, catalog: &'a Catalog) -> impl Iterator<Item = Match> + 'a {
        catalog.templates().iter().map(move |template| Match {
            class_id: template.class_id,
            distance: self.metric.distance(vector.as_slice(), template.vector.as_slice()),
        })
    }
}

impl<M: DistanceMetric> Classifier for NearestNeighborClassifier<M> {
    fn classify(&self, vector: &FeatureVector, catalog: &Catalog) -> Result<ClassId, ClassifyError> {
        self.check(vector, catalog)?;
        self.matches(vector, catalog)
            .min_by(match_order)
            .map(|best| {
                debug!("Nearest class {} at distance {:.4}", best.class_id, best.distance);
                best.class_id
            })
            .ok_or(ClassifyError::EmptyCatalog)
    }

    fn rank(&self, vector: &FeatureVector, catalog: &Catalog, k: usize) -> Result<Vec<Match>, ClassifyError> {
        self.check(vector, catalog)?;

        let mut best: BTreeMap<ClassId, f64> = BTreeMap::new();
        for candidate in self.matches(vector, catalog) {
            best.entry(candidate.class_id)
                .and_modify(|d| *d = d.min(candidate.distance))
                .or_insert(candidate.distance);
        }

        let mut ranked: Vec<Match> = best
            .into_iter()
            .map(|(class_id, distance)| Match { class_id, distance })
            .collect();
        ranked.sort_by(match_order);
        ranked.truncate(k);
        Ok(ranked)
    }
}
