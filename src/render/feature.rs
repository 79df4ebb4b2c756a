use slotmap::SlotMap;

use crate::error::{RenderError, Result};
use crate::geometry::Geometry;

use super::{BuilderParams, BuiltInstructions, CurveBuilder, Style};

slotmap::new_key_type! {
    /// Unique identifier for a feature in the feature store.
    pub struct FeatureId;
}

/// A geometry together with the style it is drawn with.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry,
    pub style: Style,
}

impl Feature {
    #[must_use]
    pub fn new(geometry: impl Into<Geometry>, style: Style) -> Self {
        Self {
            geometry: geometry.into(),
            style,
        }
    }
}

/// Arena owning the features to render.
///
/// Features are drawn in insertion order; hit-detection tests them in
/// reverse.
#[derive(Debug, Default)]
pub struct FeatureStore {
    features: SlotMap<FeatureId, Feature>,
    order: Vec<FeatureId>,
}

impl FeatureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a feature and returns its ID.
    pub fn add(&mut self, feature: Feature) -> FeatureId {
        let id = self.features.insert(feature);
        self.order.push(id);
        id
    }

    /// Returns a reference to the feature, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not in the store.
    pub fn get(&self, id: FeatureId) -> Result<&Feature> {
        self.features.get(id).ok_or_else(|| RenderError::FeatureNotFound.into())
    }

    /// Returns a mutable reference to the feature, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not in the store.
    pub fn get_mut(&mut self, id: FeatureId) -> Result<&mut Feature> {
        self.features
            .get_mut(id)
            .ok_or_else(|| RenderError::FeatureNotFound.into())
    }

    /// Removes a feature and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not in the store.
    pub fn remove(&mut self, id: FeatureId) -> Result<Feature> {
        let feature = self.features.remove(id).ok_or(RenderError::FeatureNotFound)?;
        self.order.retain(|&other| other != id);
        Ok(feature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates over the features in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &Feature)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.features.get(id).map(|feature| (id, feature)))
    }
}

/// Builds the paint and hit-detection programs for every feature of `store`.
#[must_use]
pub fn build_instructions(store: &FeatureStore, params: BuilderParams) -> BuiltInstructions {
    let mut builder = CurveBuilder::new(params);
    for (id, feature) in store.iter() {
        builder.set_style(&feature.style);
        builder.draw_geometry(&feature.geometry, id);
    }
    builder.finish()
}
