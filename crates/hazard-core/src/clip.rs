//! Clip a raster to a polygonal region.
//!
//! The crop window is every raster row/column whose cells touch the region's
//! bounding rectangle, clamped to the raster extent. Inside that window a
//! cell is selected when its centre lies in the region and it holds a real
//! measurement. Indices in a [`ClippedSample`] are relative to the window;
//! [`CropWindow::transform`] turns them back into world coordinates.
use crate::geometry::Region;
use crate::raster::{AffineTransform, RasterWindow};

/// Sub-rectangle of a raster covering a region's bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    pub row_off: usize,
    pub col_off: usize,
    pub height: usize,
    pub width: usize,
    /// Maps window-relative (col, row) to world (x, y).
    pub transform: AffineTransform,
}

impl CropWindow {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.cell_center(row, col)
    }
}

/// One selected cell. `row`/`col` are window-relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedCell {
    pub row: usize,
    pub col: usize,
    pub elevation: f32,
    pub x: f64,
    pub y: f64,
}

/// Cells of a raster selected by a region, in row-major order.
#[derive(Debug, Clone)]
pub struct ClippedSample {
    pub window: CropWindow,
    pub cells: Vec<ClippedCell>,
    /// Window-sized row-major selection mask.
    mask: Vec<bool>,
}

impl ClippedSample {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether window cell `(row, col)` is inside the region and valid.
    #[inline]
    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        self.mask[row * self.window.width + col]
    }
}

/// Clip `raster` to `region`.
///
/// Never fails: a region that misses the raster, or covers only no-data
/// cells, yields an empty sample that callers report as an error result.
pub fn clip<R: Region + ?Sized>(raster: &RasterWindow, region: &R) -> ClippedSample {
    let window = crop_window(raster, region);
    let mut cells = Vec::new();
    let mut mask = vec![false; window.width * window.height];

    for r in 0..window.height {
        for c in 0..window.width {
            let Some(z) = raster.value(window.row_off + r, window.col_off + c) else {
                continue;
            };
            let (x, y) = window.cell_center(r, c);
            if region.contains_xy(x, y) {
                mask[r * window.width + c] = true;
                cells.push(ClippedCell {
                    row: r,
                    col: c,
                    elevation: z,
                    x,
                    y,
                });
            }
        }
    }

    log::debug!(
        "clip {}: window {}x{} at ({}, {}), {} cells selected",
        region.label(),
        window.height,
        window.width,
        window.row_off,
        window.col_off,
        cells.len()
    );

    ClippedSample { window, cells, mask }
}

/// Pixel window covering the region's bounding rectangle.
fn crop_window<R: Region + ?Sized>(raster: &RasterWindow, region: &R) -> CropWindow {
    let empty = CropWindow {
        row_off: 0,
        col_off: 0,
        height: 0,
        width: 0,
        transform: raster.transform,
    };

    let Some(rect) = region.bounds() else {
        return empty;
    };
    let (min, max) = (rect.min(), rect.max());
    let corners = [(min.x, min.y), (min.x, max.y), (max.x, min.y), (max.x, max.y)];

    let mut col_lo = f64::INFINITY;
    let mut col_hi = f64::NEG_INFINITY;
    let mut row_lo = f64::INFINITY;
    let mut row_hi = f64::NEG_INFINITY;
    for (x, y) in corners {
        let Some((c, r)) = raster.transform.world_to_pixel(x, y) else {
            return empty;
        };
        col_lo = col_lo.min(c);
        col_hi = col_hi.max(c);
        row_lo = row_lo.min(r);
        row_hi = row_hi.max(r);
    }

    let clamp = |v: f64, n: usize| v.clamp(0.0, n as f64) as usize;
    let c0 = clamp(col_lo.floor(), raster.width);
    let c1 = clamp(col_hi.ceil(), raster.width);
    let r0 = clamp(row_lo.floor(), raster.height);
    let r1 = clamp(row_hi.ceil(), raster.height);

    if c0 >= c1 || r0 >= r1 {
        return empty;
    }

    CropWindow {
        row_off: r0,
        col_off: c0,
        height: r1 - r0,
        width: c1 - c0,
        transform: raster.transform.cropped(r0, c0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Parcel;

    fn ramp(n: usize) -> RasterWindow {
        let t = AffineTransform::from_origin(0.0, n as f64, 1.0, 1.0);
        let mut r = RasterWindow::new(n, n, t, Some(-9999.0), 0.0).unwrap();
        for row in 0..n {
            for col in 0..n {
                r.set(row, col, (row * n + col) as f32);
            }
        }
        r
    }

    #[test]
    fn box_selects_cells_by_centre() {
        let raster = ramp(100);
        let sample = clip(&raster, &Parcel::rect(10.0, 80.0, 20.0, 90.0));

        assert_eq!(sample.window.row_off, 10);
        assert_eq!(sample.window.col_off, 10);
        assert_eq!((sample.window.height, sample.window.width), (10, 10));
        assert_eq!(sample.len(), 100);

        let first = sample.cells[0];
        assert_eq!((first.row, first.col), (0, 0));
        assert_eq!(first.elevation, raster.get(10, 10));
        assert_eq!((first.x, first.y), (10.5, 89.5));
    }

    #[test]
    fn cells_are_row_major() {
        let raster = ramp(20);
        let sample = clip(&raster, &Parcel::rect(2.0, 2.0, 8.0, 8.0));
        let order: Vec<(usize, usize)> = sample.cells.iter().map(|c| (c.row, c.col)).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn triangle_excludes_outside_centres() {
        let raster = ramp(10);
        let tri = geo::Polygon::new(
            geo::LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![],
        );
        let sample = clip(&raster, &Parcel::from_polygon(tri));
        // Window covers the full raster; only the lower-left half is selected.
        assert_eq!((sample.window.height, sample.window.width), (10, 10));
        assert_eq!(sample.len(), 45);
        for cell in &sample.cells {
            assert!(cell.x + cell.y < 10.0);
            assert!(sample.is_selected(cell.row, cell.col));
        }
        assert!(!sample.is_selected(0, 9));
    }

    #[test]
    fn nodata_cells_are_dropped() {
        let mut raster = ramp(10);
        raster.set(5, 5, -9999.0);
        raster.set(5, 6, f32::NAN);
        let sample = clip(&raster, &Parcel::rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(sample.len(), 98);
        assert!(!sample.is_selected(5, 5));
        assert!(!sample.is_selected(5, 6));
    }

    #[test]
    fn polygon_outside_extent_is_empty() {
        let raster = ramp(10);
        let sample = clip(&raster, &Parcel::rect(500.0, 500.0, 510.0, 510.0));
        assert!(sample.is_empty());
        assert!(sample.window.is_empty());
    }

    #[test]
    fn partial_overlap_is_clamped() {
        let raster = ramp(10);
        let sample = clip(&raster, &Parcel::rect(-5.0, -5.0, 3.0, 3.0));
        assert_eq!(sample.window.row_off, 7);
        assert_eq!(sample.window.col_off, 0);
        assert_eq!((sample.window.height, sample.window.width), (3, 3));
        assert_eq!(sample.len(), 9);
    }

    #[test]
    fn cropped_transform_matches_raster_centres() {
        let raster = ramp(30);
        let sample = clip(&raster, &Parcel::rect(4.0, 7.0, 12.0, 19.0));
        for cell in &sample.cells {
            let abs = raster.cell_center(cell.row + sample.window.row_off, cell.col + sample.window.col_off);
            assert_eq!((cell.x, cell.y), abs);
        }
    }
}
