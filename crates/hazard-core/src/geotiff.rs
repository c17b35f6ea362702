//! Single-band GeoTIFF → [`RasterWindow`].
//!
//! Georeferencing comes from the GeoTIFF model tags:
//!   ModelPixelScale (33550) + ModelTiepoint (33922), or
//!   ModelTransformation (34264),
//! and the no-data sentinel from GDAL_NODATA (42113, ASCII).
//! Integer sample types are widened to f32.
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::RasterError;
use crate::raster::{AffineTransform, RasterWindow};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GDAL_NODATA: u16 = 42113;

/// Georeferencing of a GeoTIFF without its pixel data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTiffHeader {
    pub width: usize,
    pub height: usize,
    pub transform: AffineTransform,
    pub nodata: Option<f32>,
}

impl GeoTiffHeader {
    /// Whether the raster extent fully covers `(min_x, min_y, max_x, max_y)`.
    pub fn covers(&self, bounds: (f64, f64, f64, f64)) -> bool {
        let (min_x, min_y, max_x, max_y) = bounds;
        let corners = [
            self.transform.apply(0.0, 0.0),
            self.transform.apply(self.width as f64, self.height as f64),
        ];
        let (x0, x1) = (corners[0].0.min(corners[1].0), corners[0].0.max(corners[1].0));
        let (y0, y1) = (corners[0].1.min(corners[1].1), corners[0].1.max(corners[1].1));
        min_x >= x0 && max_x <= x1 && min_y >= y0 && max_y <= y1
    }
}

/// Read only the georeferencing tags of the GeoTIFF at `path`.
pub fn read_header(path: &Path) -> Result<GeoTiffHeader, RasterError> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    header_from(&mut decoder)
}

/// Decode the first band of the GeoTIFF at `path`.
pub fn read_geotiff(path: &Path) -> Result<RasterWindow, RasterError> {
    let raster = decode(BufReader::new(File::open(path)?))?;
    log::debug!(
        "read {}: {}x{} px, resolution {:?}, nodata {:?}",
        path.display(),
        raster.width,
        raster.height,
        raster.resolution(),
        raster.nodata
    );
    Ok(raster)
}

/// Decode a GeoTIFF from any seekable reader.
pub fn decode<R: Read + Seek>(reader: R) -> Result<RasterWindow, RasterError> {
    let mut decoder = Decoder::new(reader)?;
    let header = header_from(&mut decoder)?;

    let data: Vec<f32> = match decoder.read_image()? {
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        _ => return Err(RasterError::Unsupported("pixel type".into())),
    };

    if data.len() != header.width * header.height {
        return Err(RasterError::Unsupported(format!(
            "expected a single band of {} samples, got {}",
            header.width * header.height,
            data.len()
        )));
    }

    RasterWindow::from_vec(data, header.width, header.height, header.transform, header.nodata)
}

fn header_from<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTiffHeader, RasterError> {
    let (w, h) = decoder.dimensions()?;
    let transform = read_transform(decoder)?;
    if !transform.is_invertible() {
        return Err(RasterError::SingularTransform);
    }
    let nodata = decoder
        .find_tag(Tag::from_u16_exhaustive(GDAL_NODATA))?
        .map(|v| v.into_string())
        .transpose()?
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f32>().ok());

    Ok(GeoTiffHeader {
        width: w as usize,
        height: h as usize,
        transform,
        nodata,
    })
}

fn f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<Vec<f64>>, RasterError> {
    Ok(decoder
        .find_tag(Tag::from_u16_exhaustive(code))?
        .map(|v| v.into_f64_vec())
        .transpose()?)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<AffineTransform, RasterError> {
    if let Some(m) = f64_tag(decoder, MODEL_TRANSFORMATION)? {
        // Row-major 4×4 matrix; the 2D affine part sits in rows 0 and 1.
        if m.len() >= 8 {
            return Ok(AffineTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let scale = f64_tag(decoder, MODEL_PIXEL_SCALE)?;
    let tie = f64_tag(decoder, MODEL_TIEPOINT)?;
    match (scale, tie) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            // Tiepoint (i, j, k, x, y, z): raster (i, j) sits at world (x, y).
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            Ok(AffineTransform::from_gdal([
                x - i * s[0],
                s[0],
                0.0,
                y + j * s[1],
                0.0,
                -s[1],
            ]))
        }
        _ => Err(RasterError::MissingGeoreference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{colortype, TiffEncoder};

    fn encode(width: u32, height: u32, data: &[f32], nodata: Option<&str>) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut enc = TiffEncoder::new(&mut buf).unwrap();
            let mut img = enc.new_image::<colortype::Gray32Float>(width, height).unwrap();
            img.encoder()
                .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[2.0f64, 3.0, 0.0][..])
                .unwrap();
            img.encoder()
                .write_tag(Tag::Unknown(MODEL_TIEPOINT), &[0.0f64, 0.0, 0.0, 500.0, 1000.0, 0.0][..])
                .unwrap();
            if let Some(nd) = nodata {
                img.encoder().write_tag(Tag::Unknown(GDAL_NODATA), nd).unwrap();
            }
            img.write_data(data).unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn decodes_grid_transform_and_nodata() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let bytes = encode(4, 3, &data, Some("-9999"));
        let r = decode(Cursor::new(bytes)).unwrap();

        assert_eq!((r.width, r.height), (4, 3));
        assert_eq!(r.get(2, 3), 11.0);
        assert_eq!(r.nodata, Some(-9999.0));
        assert_eq!(r.resolution(), (2.0, 3.0));
        assert_eq!(r.cell_center(0, 0), (501.0, 998.5));
    }

    #[test]
    fn missing_nodata_tag_is_none() {
        let bytes = encode(2, 2, &[1.0, 2.0, 3.0, 4.0], None);
        let r = decode(Cursor::new(bytes)).unwrap();
        assert_eq!(r.nodata, None);
    }

    #[test]
    fn header_covers_bounds() {
        let h = GeoTiffHeader {
            width: 10,
            height: 10,
            transform: AffineTransform::from_origin(0.0, 100.0, 10.0, 10.0),
            nodata: None,
        };
        assert!(h.covers((10.0, 10.0, 90.0, 90.0)));
        assert!(!h.covers((10.0, 10.0, 110.0, 90.0)));
    }

    #[test]
    fn plain_tiff_without_georeference_is_rejected() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut enc = TiffEncoder::new(&mut buf).unwrap();
            enc.write_image::<colortype::Gray32Float>(2, 2, &[0.0, 1.0, 2.0, 3.0]).unwrap();
        }
        let err = decode(Cursor::new(buf.into_inner())).unwrap_err();
        assert!(matches!(err, RasterError::MissingGeoreference));
    }
}
