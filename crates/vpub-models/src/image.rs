//! Image references and ordered image sets.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ModelError, ModelResult};

/// A locally staged image file selected for a video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ImageRef {
    /// Identifier assigned by the search step
    pub id: String,
    /// Path of the staged image on local disk
    #[serde(rename = "path", alias = "source_path")]
    pub source_path: PathBuf,
}

impl ImageRef {
    pub fn new(id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.source_path
    }
}

/// Ordered, non-empty, immutable sequence of images.
///
/// Order is on-screen order. The set can only be built through
/// [`ImageSet::new`] (or deserialized, which goes through the same check), so
/// an empty set never reaches the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ImageRef>", into = "Vec<ImageRef>")]
pub struct ImageSet {
    images: Vec<ImageRef>,
}

impl ImageSet {
    /// Build an image set, rejecting an empty list.
    pub fn new(images: Vec<ImageRef>) -> ModelResult<Self> {
        if images.is_empty() {
            return Err(ModelError::validation(
                "image set must contain at least one image",
            ));
        }
        Ok(Self { images })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageRef> {
        self.images.iter()
    }

    pub fn as_slice(&self) -> &[ImageRef] {
        &self.images
    }

    /// Seconds each image stays on screen for the given total duration.
    pub fn per_image_duration(&self, total_duration_secs: f64) -> f64 {
        total_duration_secs / self.images.len() as f64
    }
}

impl TryFrom<Vec<ImageRef>> for ImageSet {
    type Error = ModelError;

    fn try_from(images: Vec<ImageRef>) -> ModelResult<Self> {
        Self::new(images)
    }
}

impl From<ImageSet> for Vec<ImageRef> {
    fn from(set: ImageSet) -> Self {
        set.images
    }
}

impl JsonSchema for ImageSet {
    fn schema_name() -> String {
        "ImageSet".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <Vec<ImageRef>>::json_schema(gen)
    }
}

impl<'a> IntoIterator for &'a ImageSet {
    type Item = &'a ImageRef;
    type IntoIter = std::slice::Iter<'a, ImageRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}
