//! Customer map geometry.
//!
//! Projects customer coordinates into the base map's bounding box. Pixel
//! drawing is left to whatever renders the map; this module only produces
//! the marker positions.

use crate::error::{AnalyticsError, Result};
use crate::models::{CustomerLocation, MapSummary};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default base map image (Brazil).
pub const DEFAULT_BASE_IMAGE: &str =
    "https://i.pinimg.com/originals/3a/0c/e1/3a0ce18b3c842748c255bc0aa445ad41.jpg";

/// Geographic extent covered by a base map image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge (longitude).
    pub left: f64,
    /// Eastern edge (longitude).
    pub right: f64,
    /// Southern edge (latitude).
    pub bottom: f64,
    /// Northern edge (latitude).
    pub top: f64,
}

impl BoundingBox {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64) -> Result<Self> {
        let bbox = Self {
            left,
            right,
            bottom,
            top,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Extent of the Brazil base map.
    pub fn brazil() -> Self {
        Self {
            left: -73.98283055,
            right: -33.8,
            bottom: -33.75116944,
            top: 5.4,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let edges = [self.left, self.right, self.bottom, self.top];
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(AnalyticsError::InvalidBoundingBox(
                "edges must be finite".to_string(),
            ));
        }
        if self.left >= self.right {
            return Err(AnalyticsError::InvalidBoundingBox(format!(
                "left ({}) must be west of right ({})",
                self.left, self.right
            )));
        }
        if self.bottom >= self.top {
            return Err(AnalyticsError::InvalidBoundingBox(format!(
                "bottom ({}) must be south of top ({})",
                self.bottom, self.top
            )));
        }
        Ok(())
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.left..=self.right).contains(&longitude) && (self.bottom..=self.top).contains(&latitude)
    }

    /// Map a coordinate into `[0, 1]` image space, y growing southward.
    pub fn normalize(&self, latitude: f64, longitude: f64) -> Option<MapPoint> {
        if !self.contains(latitude, longitude) {
            return None;
        }
        Some(MapPoint {
            x: (longitude - self.left) / (self.right - self.left),
            y: (self.top - latitude) / (self.top - self.bottom),
        })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::brazil()
    }
}

/// Base map image and the extent it depicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMap {
    /// Image URL or path.
    pub source: String,
    pub bbox: BoundingBox,
}

impl Default for BaseMap {
    fn default() -> Self {
        Self {
            source: DEFAULT_BASE_IMAGE.to_string(),
            bbox: BoundingBox::brazil(),
        }
    }
}

/// A marker position in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    /// Pixel position on an image of the given size.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32) {
        let px = (self.x * width as f64).floor() as u32;
        let py = (self.y * height as f64).floor() as u32;
        (px.min(width.saturating_sub(1)), py.min(height.saturating_sub(1)))
    }
}

/// Markers ready for rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointSet {
    pub points: Vec<MapPoint>,
    /// Locations dropped for falling outside the bounding box.
    pub outside: usize,
}

impl PointSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Selects and projects customer locations for the map panel.
#[derive(Debug, Clone)]
pub struct GeoSampler {
    locations: Vec<CustomerLocation>,
    base_map: BaseMap,
    max_points: Option<usize>,
}

impl GeoSampler {
    /// Create a sampler over deduplicated locations.
    pub fn new(locations: Vec<CustomerLocation>, base_map: BaseMap) -> Result<Self> {
        base_map.bbox.validate()?;
        Ok(Self {
            locations,
            base_map,
            max_points: None,
        })
    }

    /// Cap the number of locations projected. `None` keeps all of them.
    pub fn with_max_points(mut self, max_points: Option<usize>) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn base_map(&self) -> &BaseMap {
        &self.base_map
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// An evenly spaced subset of at most `max` locations.
    ///
    /// Picks indices `i * len / max`, so the same table always yields the
    /// same subset and the subset keeps the table's spread.
    pub fn sample(&self, max: usize) -> Vec<&CustomerLocation> {
        let len = self.locations.len();
        if len <= max {
            return self.locations.iter().collect();
        }
        (0..max).map(|i| &self.locations[i * len / max]).collect()
    }

    /// Marker positions for every sampled location inside the map.
    ///
    /// An empty table yields an empty set; zero markers is a valid map.
    pub fn plot_points(&self) -> PointSet {
        let candidates = match self.max_points {
            Some(max) => self.sample(max),
            None => self.locations.iter().collect(),
        };

        let bbox = &self.base_map.bbox;
        let mut set = PointSet::default();
        for location in candidates {
            match bbox.normalize(location.latitude, location.longitude) {
                Some(point) => set.points.push(point),
                None => set.outside += 1,
            }
        }

        debug!(
            "Projected {} of {} locations ({} outside map)",
            set.points.len(),
            self.locations.len(),
            set.outside
        );
        set
    }

    /// Marker counts for the report.
    pub fn summarize(&self, points: &PointSet) -> MapSummary {
        MapSummary {
            base_image: self.base_map.source.clone(),
            locations: self.locations.len(),
            plotted: points.len(),
            outside: points.outside,
        }
    }
}
