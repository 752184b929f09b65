//! Renderer-facing adapter.
//!
//! Builds the three things a drawing host needs: the choropleth country
//! layer, the live arc layer, and the viewport transform to apply once
//! around both. Country geometry is cached against (dataset version, counts
//! revision, palette) since it only changes when those do; arcs are rebuilt
//! every tick because lines are time-varying.

use crate::attack::counts::{CountryCounts, ThreatBand};
use crate::attack::lines::LineStore;
use crate::attack::Severity;
use crate::colors::{self, Palette};
use crate::geo::boundaries::BoundaryStore;
use crate::geo::projection::Projection;
use crate::geo::viewport::ViewTransform;
use crossterm::style::Color;

const ARC_SEGMENTS: usize = 24;

/// One country's projected outline rings and fill color.
pub struct CountryShape {
    pub code: String,
    pub rings: Vec<Vec<(f64, f64)>>,
    pub band: ThreatBand,
    pub fill: Color,
}

/// One live attack arc, sampled, endpoints as markers. Color is resolved
/// from the severity at draw time.
pub struct ArcShape {
    pub id: String,
    pub points: Vec<(f64, f64)>,
    pub severity: Severity,
    pub markers: [(f64, f64); 2],
}

/// Everything the drawing host consumes for one frame. Coordinates are
/// projected but untransformed; `transform` is applied exactly once.
pub struct Scene<'a> {
    pub countries: &'a [CountryShape],
    pub arcs: Vec<ArcShape>,
    pub transform: ViewTransform,
}

pub struct SceneBuilder {
    countries: Vec<CountryShape>,
    cache_key: Option<(u64, u64, Palette)>,
    rebuilds: u64,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            countries: Vec::new(),
            cache_key: None,
            rebuilds: 0,
        }
    }

    /// Force a country-layer rebuild on the next frame (projection refit,
    /// terminal resize).
    pub fn invalidate(&mut self) {
        self.cache_key = None;
    }

    /// Times the country layer has been recomputed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn build<'a>(
        &'a mut self,
        boundaries: &BoundaryStore,
        counts: &CountryCounts,
        lines: &LineStore,
        projection: &Projection,
        transform: ViewTransform,
        palette: Palette,
    ) -> Scene<'a> {
        let key = (boundaries.version(), counts.revision(), palette);
        if self.cache_key != Some(key) {
            self.rebuild_countries(boundaries, counts, projection, palette);
            self.cache_key = Some(key);
            self.rebuilds += 1;
        }

        let mut arcs: Vec<ArcShape> = lines
            .active()
            .map(|line| {
                let src = projection.project(line.source.lon, line.source.lat);
                let dst = projection.project(line.destination.lon, line.destination.lat);
                ArcShape {
                    id: line.id.clone(),
                    points: super::curve::arc_points(src, dst, ARC_SEGMENTS),
                    severity: line.severity,
                    markers: [src, dst],
                }
            })
            .collect();
        // Stable draw order; the line map iterates in arbitrary order.
        arcs.sort_by(|a, b| a.id.cmp(&b.id));

        Scene {
            countries: &self.countries,
            arcs,
            transform,
        }
    }

    fn rebuild_countries(
        &mut self,
        boundaries: &BoundaryStore,
        counts: &CountryCounts,
        projection: &Projection,
        palette: Palette,
    ) {
        self.countries = boundaries
            .features()
            .iter()
            .map(|feature| {
                let band = counts.band_for(&feature.code);
                CountryShape {
                    code: feature.code.clone(),
                    rings: feature
                        .rings()
                        .iter()
                        .map(|ring| {
                            ring.iter()
                                .map(|&(lon, lat)| projection.project(lon, lat))
                                .collect()
                        })
                        .collect(),
                    band,
                    fill: colors::band_color(palette, band),
                }
            })
            .collect();
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}
