//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Supports single-band rasters with the
//! pixel-scale/tiepoint georeferencing tags, the GDAL no-data tag and the
//! EPSG code from the GeoKey directory.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{ColorType, Gray16, Gray32Float, Gray8, RGBA8};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Write the GDAL no-data tag when the raster has a sentinel
    pub write_nodata: bool,
    /// Write the EPSG code into the GeoKey directory when known
    pub write_crs: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            write_nodata: true,
            write_crs: true,
        }
    }
}

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode_geotiff(Cursor::new(data))
}

fn tiff_err(context: &'static str) -> impl Fn(tiff::TiffError) -> Error {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let colortype = decoder.colortype().map_err(tiff_err("Cannot read color type"))?;
    if !matches!(colortype, tiff::ColorType::Gray(_)) {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single-band raster, found {:?}",
            colortype
        )));
    }

    let (width, height) = decoder.dimensions().map_err(tiff_err("Cannot read dimensions"))?;
    let rows = height as usize;
    let cols = width as usize;

    let data: Vec<T> = match decoder.read_image().map_err(tiff_err("Cannot read image data"))? {
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_nodata(read_nodata(&mut decoder));
    raster.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_nodata<T: RasterElement, R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = decoder.get_tag_ascii_string(Tag::Unknown(GDAL_NODATA)).ok()?;
    let value: f64 = text.trim().trim_end_matches('\0').parse().ok()?;
    num_traits::cast(value)
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(Tag::Unknown(GEO_KEY_DIRECTORY)).ok()?;
    // Header is 4 shorts, then entries of [key, location, count, value]
    keys.get(4..)?
        .chunks_exact(4)
        .find(|entry| {
            (entry[0] == PROJECTED_CS_TYPE_KEY || entry[0] == GEOGRAPHIC_TYPE_KEY)
                && entry[1] == 0
                && entry[3] != 0
                && entry[3] != 32767
        })
        .map(|entry| u32::from(entry[3]))
}

/// Write a Raster to a GeoTIFF file.
///
/// Floats and wide or signed integers are written as 32-bit float, `u8`
/// as 8-bit and `u16` as 16-bit unsigned samples.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, &options.unwrap_or_default())?;
    writer.flush()?;
    Ok(())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T: RasterElement>(
    raster: &Raster<T>,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), &options.unwrap_or_default())?;
    Ok(buf)
}

/// Write an interleaved RGBA buffer as a georeferenced 4-band TIFF.
///
/// Used for class previews; `template` supplies dimensions, transform and CRS.
pub fn write_rgba_geotiff<T, P>(rgba: &[u8], template: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let (rows, cols) = template.shape();
    if rgba.len() != rows * cols * 4 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    let mut encoder = TiffEncoder::new(&mut writer).map_err(tiff_err("TIFF encoder error"))?;
    let tags = GeoTags::new(template, &GeoTiffOptions { write_nodata: false, write_crs: true });
    write_image::<RGBA8, _>(&mut encoder, cols, rows, rgba, &tags)?;
    drop(encoder);
    writer.flush()?;
    Ok(())
}

/// Georeferencing tags shared by every image written
struct GeoTags {
    scale: [f64; 3],
    tiepoint: [f64; 6],
    geokeys: Vec<u16>,
    nodata: Option<String>,
}

impl GeoTags {
    fn new<T: RasterElement>(raster: &Raster<T>, options: &GeoTiffOptions) -> Self {
        let gt = raster.transform();

        // Version 1.1.0, then [key, location, count, value] entries.
        // GTModelType 1 = projected, 2 = geographic; GTRasterType 1 = PixelIsArea.
        let epsg = raster.crs().filter(|_| options.write_crs).and_then(|crs| {
            let code = u16::try_from(crs.epsg()?).ok()?;
            Some((crs.is_geographic(), code))
        });
        let model_type = match epsg {
            Some((true, _)) => 2,
            _ => 1,
        };
        let mut entries = vec![[GT_MODEL_TYPE_KEY, 0, 1, model_type], [GT_RASTER_TYPE_KEY, 0, 1, 1]];
        if let Some((geographic, code)) = epsg {
            let key = if geographic { GEOGRAPHIC_TYPE_KEY } else { PROJECTED_CS_TYPE_KEY };
            entries.push([key, 0, 1, code]);
        }
        let mut geokeys = vec![1, 1, 0, entries.len() as u16];
        geokeys.extend(entries.into_iter().flatten());

        let nodata = raster
            .nodata()
            .filter(|_| options.write_nodata)
            .and_then(|nd| nd.to_f64())
            .map(format_nodata);

        Self {
            scale: [gt.pixel_width, gt.pixel_height.abs(), 0.0],
            tiepoint: [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0],
            geokeys,
            nodata,
        }
    }
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn write_image<C, W>(
    encoder: &mut TiffEncoder<W>,
    cols: usize,
    rows: usize,
    data: &[C::Inner],
    tags: &GeoTags,
) -> Result<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let dir = image.encoder();
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &tags.scale[..])
        .map_err(tiff_err("Cannot write scale tag"))?;
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), &tags.tiepoint[..])
        .map_err(tiff_err("Cannot write tiepoint tag"))?;
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), tags.geokeys.as_slice())
        .map_err(tiff_err("Cannot write geokey tag"))?;
    if let Some(nodata) = &tags.nodata {
        dir.write_tag(Tag::Unknown(GDAL_NODATA), nodata.as_str())
            .map_err(tiff_err("Cannot write nodata tag"))?;
    }

    image.write_data(data).map_err(tiff_err("Cannot write image data"))?;
    Ok(())
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;
    let (rows, cols) = raster.shape();
    let tags = GeoTags::new(raster, options);

    let signed = T::default_nodata() < T::zero();
    match (T::is_float() || signed, std::mem::size_of::<T>()) {
        (false, 1) => {
            let data: Vec<u8> = raster.data().iter().map(|&v| num_traits::cast(v).unwrap_or(0)).collect();
            write_image::<Gray8, _>(&mut encoder, cols, rows, &data, &tags)
        }
        (false, 2) => {
            let data: Vec<u16> = raster.data().iter().map(|&v| num_traits::cast(v).unwrap_or(0)).collect();
            write_image::<Gray16, _>(&mut encoder, cols, rows, &data, &tags)
        }
        _ => {
            let data: Vec<f32> = raster
                .data()
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
                .collect();
            write_image::<Gray32Float, _>(&mut encoder, cols, rows, &data, &tags)
        }
    }
}
