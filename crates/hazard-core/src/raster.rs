//! In-memory DEM window: row-major elevation grid plus the affine transform
//! that places it in world coordinates.
//! Coordinate math uses f64; elevation values use f32.
use serde::{Deserialize, Serialize};

use crate::error::RasterError;

/// Six-coefficient affine transform in GDAL order, mapping pixel (col, row)
/// to world (x, y):
///
/// ```text
///   x = top_left_x + col · pixel_width + row · rotation_x
///   y = top_left_y + col · rotation_y  + row · pixel_height
/// ```
///
/// `pixel_height` is negative for north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl AffineTransform {
    /// North-up transform from the upper-left corner and positive pixel sizes.
    pub fn from_origin(west: f64, north: f64, x_res: f64, y_res: f64) -> Self {
        Self {
            top_left_x: west,
            pixel_width: x_res,
            rotation_x: 0.0,
            top_left_y: north,
            rotation_y: 0.0,
            pixel_height: -y_res,
        }
    }

    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            top_left_x: c[0],
            pixel_width: c[1],
            rotation_x: c[2],
            top_left_y: c[3],
            rotation_y: c[4],
            pixel_height: c[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > f64::EPSILON
    }

    /// Map fractional pixel coordinates to world coordinates.
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.top_left_x + col * self.pixel_width + row * self.rotation_x,
            self.top_left_y + col * self.rotation_y + row * self.pixel_height,
        )
    }

    /// World coordinates of the centre of cell `(row, col)`.
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Inverse mapping, world (x, y) → fractional pixel (col, row).
    /// Returns None for a singular transform.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !self.is_invertible() {
            return None;
        }
        let det = self.determinant();
        let dx = x - self.top_left_x;
        let dy = y - self.top_left_y;
        let col = (self.pixel_height * dx - self.rotation_x * dy) / det;
        let row = (self.pixel_width * dy - self.rotation_y * dx) / det;
        Some((col, row))
    }

    /// Transform of a sub-window whose pixel (0, 0) is pixel
    /// `(row_off, col_off)` of this one.
    pub fn cropped(&self, row_off: usize, col_off: usize) -> Self {
        let (x, y) = self.apply(col_off as f64, row_off as f64);
        Self {
            top_left_x: x,
            top_left_y: y,
            ..*self
        }
    }

    /// Ground size of one pixel along the column and row axes.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            self.pixel_width.hypot(self.rotation_y),
            self.rotation_x.hypot(self.pixel_height),
        )
    }
}

/// A single-band DEM held in memory, row 0 = first raster row (north for
/// north-up rasters).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RasterRepr")]
pub struct RasterWindow {
    /// Row-major elevation values.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub transform: AffineTransform,
    /// Sentinel for "no measurement". NaN cells are always no-data.
    pub nodata: Option<f32>,
}

#[derive(Deserialize)]
struct RasterRepr {
    data: Vec<f32>,
    width: usize,
    height: usize,
    transform: AffineTransform,
    nodata: Option<f32>,
}

impl TryFrom<RasterRepr> for RasterWindow {
    type Error = RasterError;

    fn try_from(r: RasterRepr) -> Result<Self, Self::Error> {
        Self::from_vec(r.data, r.width, r.height, r.transform, r.nodata)
    }
}

impl RasterWindow {
    /// Create a raster filled with `fill`.
    pub fn new(
        width: usize,
        height: usize,
        transform: AffineTransform,
        nodata: Option<f32>,
        fill: f32,
    ) -> Result<Self, RasterError> {
        Self::from_vec(vec![fill; width * height], width, height, transform, nodata)
    }

    pub fn from_vec(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: AffineTransform,
        nodata: Option<f32>,
    ) -> Result<Self, RasterError> {
        if data.len() != width * height {
            return Err(RasterError::Shape {
                expected: width * height,
                actual: data.len(),
            });
        }
        if !transform.is_invertible() {
            return Err(RasterError::SingularTransform);
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
            nodata,
        })
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(
        rows: Vec<Vec<f32>>,
        transform: AffineTransform,
        nodata: Option<f32>,
    ) -> Result<Self, RasterError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(RasterError::Ragged {
                row,
                expected: width,
                actual: r.len(),
            });
        }
        let data = rows.into_iter().flatten().collect();
        Self::from_vec(data, width, height, transform, nodata)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    #[inline]
    pub fn is_nodata(&self, v: f32) -> bool {
        v.is_nan() || self.nodata.is_some_and(|nd| v == nd)
    }

    /// Elevation at `(row, col)`, or None for a no-data cell.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        let v = self.get(row, col);
        (!self.is_nodata(v)).then_some(v)
    }

    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.cell_center(row, col)
    }

    /// Pixel resolution (x, y) in map units.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.pixel_size()
    }

    /// World-space bounding box `(min_x, min_y, max_x, max_y)` of the raster.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let corners = [
            self.transform.apply(0.0, 0.0),
            self.transform.apply(self.width as f64, 0.0),
            self.transform.apply(0.0, self.height as f64),
            self.transform.apply(self.width as f64, self.height as f64),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Elevations of cells holding a real measurement, row-major.
    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied().filter(|&v| !self.is_nodata(v))
    }

    /// Number of cells holding a real measurement.
    pub fn valid_count(&self) -> usize {
        self.valid_values().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cell_center_and_inverse_agree() {
        let t = AffineTransform::from_origin(0.0, 100.0, 1.0, 1.0);
        let (x, y) = t.cell_center(65, 15);
        assert_relative_eq!(x, 15.5);
        assert_relative_eq!(y, 34.5);

        let (col, row) = t.world_to_pixel(x, y).unwrap();
        assert_relative_eq!(col, 15.5);
        assert_relative_eq!(row, 65.5);
    }

    #[test]
    fn rotated_transform_inverts() {
        let t = AffineTransform::from_gdal([500.0, 2.0, 0.5, 1000.0, 0.25, -2.0]);
        let (x, y) = t.apply(3.25, 7.75);
        let (col, row) = t.world_to_pixel(x, y).unwrap();
        assert_relative_eq!(col, 3.25, epsilon = 1e-9);
        assert_relative_eq!(row, 7.75, epsilon = 1e-9);
    }

    #[test]
    fn cropped_transform_shifts_origin() {
        let t = AffineTransform::from_origin(0.0, 100.0, 2.0, 2.0);
        let c = t.cropped(10, 5);
        assert_eq!(c.cell_center(0, 0), t.cell_center(10, 5));
        assert_eq!(c.cell_center(3, 4), t.cell_center(13, 9));
    }

    #[test]
    fn singular_transform_rejected() {
        let t = AffineTransform::from_gdal([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(t.world_to_pixel(1.0, 1.0).is_none());
        assert!(matches!(
            RasterWindow::new(2, 2, t, None, 0.0),
            Err(RasterError::SingularTransform)
        ));
    }

    #[test]
    fn ragged_rows_rejected() {
        let t = AffineTransform::from_origin(0.0, 2.0, 1.0, 1.0);
        let err = RasterWindow::from_rows(vec![vec![1.0, 2.0], vec![3.0]], t, None).unwrap_err();
        assert!(matches!(err, RasterError::Ragged { row: 1, expected: 2, actual: 1 }));
    }

    #[test]
    fn nodata_and_nan_are_masked() {
        let t = AffineTransform::from_origin(0.0, 2.0, 1.0, 1.0);
        let r = RasterWindow::from_rows(
            vec![vec![1.0, -9999.0], vec![f32::NAN, 4.0]],
            t,
            Some(-9999.0),
        )
        .unwrap();
        assert_eq!(r.value(0, 0), Some(1.0));
        assert_eq!(r.value(0, 1), None);
        assert_eq!(r.value(1, 0), None);
        assert_eq!(r.valid_count(), 2);
        assert_eq!(r.valid_values().reduce(f32::max), r.value(1, 1));
    }

    #[test]
    fn json_roundtrip_validates_shape() {
        let bad = r#"{"data":[1.0,2.0,3.0],"width":2,"height":2,
            "transform":{"top_left_x":0,"pixel_width":1,"rotation_x":0,
                         "top_left_y":2,"rotation_y":0,"pixel_height":-1},
            "nodata":null}"#;
        assert!(serde_json::from_str::<RasterWindow>(bad).is_err());
    }

    #[test]
    fn bounds_cover_full_extent() {
        let t = AffineTransform::from_origin(10.0, 50.0, 5.0, 5.0);
        let r = RasterWindow::new(4, 2, t, None, 0.0).unwrap();
        assert_eq!(r.bounds(), (10.0, 40.0, 30.0, 50.0));
        assert_eq!(r.resolution(), (5.0, 5.0));
    }
}
