//! Parcel polygons and the regions a raster can be clipped to.
//!
//! All geometry lives in the raster's coordinate space. Buffer distances and
//! horizontal distances are only meaningful for projected rasters (linear
//! units = metres); geographic rasters must be reprojected upstream.
use geo::{
    BoundingRect, Closest, ClosestPoint, Contains, Distance, Euclidean, MultiPolygon, Point,
    Polygon, Rect,
};
use geojson::GeoJson;

use crate::error::GeometryError;

/// Something a raster can be clipped to: a bounding rectangle for the crop
/// window plus a point-membership test for cell centres.
pub trait Region {
    /// Axis-aligned bounds in world coordinates. None for empty geometry.
    fn bounds(&self) -> Option<Rect<f64>>;

    fn contains_xy(&self, x: f64, y: f64) -> bool;

    /// Short label used in diagnostics ("site", "vicinity").
    fn label(&self) -> &'static str;
}

/// Site boundary of a land parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub polygon: MultiPolygon<f64>,
}

impl Parcel {
    pub fn new(polygon: MultiPolygon<f64>) -> Self {
        Self { polygon }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon(vec![polygon]))
    }

    /// Axis-aligned rectangle parcel, handy for fixtures.
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::from_polygon(Rect::new((min_x, min_y), (max_x, max_y)).to_polygon())
    }

    /// Parse a GeoJSON value holding a Polygon or MultiPolygon, either bare,
    /// as a Feature, or as a single-feature FeatureCollection.
    pub fn from_geojson_value(value: serde_json::Value) -> Result<Self, GeometryError> {
        let geometry = match GeoJson::from_json_value(value)? {
            GeoJson::Geometry(g) => g,
            GeoJson::Feature(f) => f.geometry.ok_or(GeometryError::Missing)?,
            GeoJson::FeatureCollection(fc) => fc
                .features
                .into_iter()
                .find_map(|f| f.geometry)
                .ok_or(GeometryError::Missing)?,
        };
        let geom: geo::Geometry<f64> = geometry.try_into()?;
        match geom {
            geo::Geometry::Polygon(p) => Ok(Self::from_polygon(p)),
            geo::Geometry::MultiPolygon(mp) => Ok(Self::new(mp)),
            other => Err(GeometryError::NotPolygonal(geometry_kind(&other).to_string())),
        }
    }

    /// The parcel grown outward by `distance` map units.
    pub fn buffered(&self, distance: f64) -> Vicinity<'_> {
        Vicinity {
            parcel: self,
            distance,
        }
    }

    /// Whether `(x, y)` lies within `distance` of any ring edge of the parcel.
    fn near_boundary(&self, x: f64, y: f64, distance: f64) -> bool {
        let p = Point::new(x, y);
        self.polygon
            .iter()
            .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors()))
            .flat_map(|ring| ring.lines())
            .filter(|line| {
                x >= line.start.x.min(line.end.x) - distance
                    && x <= line.start.x.max(line.end.x) + distance
                    && y >= line.start.y.min(line.end.y) - distance
                    && y <= line.start.y.max(line.end.y) + distance
            })
            .any(|line| match line.closest_point(&p) {
                Closest::Intersection(q) | Closest::SinglePoint(q) => {
                    Euclidean.distance(p, q) <= distance
                }
                Closest::Indeterminate => false,
            })
    }
}

fn geometry_kind(g: &geo::Geometry<f64>) -> &'static str {
    match g {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        #[allow(unreachable_patterns)]
        _ => "Geometry",
    }
}

impl Region for Parcel {
    fn bounds(&self) -> Option<Rect<f64>> {
        self.polygon.bounding_rect()
    }

    fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.polygon.contains(&Point::new(x, y))
    }

    fn label(&self) -> &'static str {
        "site"
    }
}

/// Parcel buffered outward by a fixed distance (round joins): every point
/// inside the parcel or within `distance` of its boundary.
#[derive(Debug, Clone, Copy)]
pub struct Vicinity<'a> {
    parcel: &'a Parcel,
    distance: f64,
}

impl Vicinity<'_> {
    pub fn distance(&self) -> f64 {
        self.distance
    }
}

impl Region for Vicinity<'_> {
    fn bounds(&self) -> Option<Rect<f64>> {
        let r = self.parcel.bounds()?;
        let d = self.distance.max(0.0);
        Some(Rect::new(
            (r.min().x - d, r.min().y - d),
            (r.max().x + d, r.max().y + d),
        ))
    }

    fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.parcel.contains_xy(x, y)
            || (self.distance > 0.0 && self.parcel.near_boundary(x, y, self.distance))
    }

    fn label(&self) -> &'static str {
        "vicinity"
    }
}
