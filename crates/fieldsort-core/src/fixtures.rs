//! Test fixtures: tiny JPEGs with hand-built EXIF blocks, and a symbol
//! reader that "decodes" a card from the photo's brightness and width.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::pipeline::code::SymbolReader;

/// Height of every fixture photo; the card reader only answers at native size.
pub const PHOTO_HEIGHT: u32 = 40;

/// Width of fixture photos without a card.
pub const PLAIN_WIDTH: u32 = 48;

/// GPS block for a fixture photo.
pub struct GpsSpec {
    latitude: Vec<Rational>,
    latitude_ref: &'static str,
    longitude: Vec<Rational>,
    longitude_ref: &'static str,
    altitude: Rational,
}

impl GpsSpec {
    pub fn new(
        lat_deg: (u32, u32),
        lat_min: (u32, u32),
        lat_ref: &'static str,
        lon_deg: (u32, u32),
        lon_min: (u32, u32),
        lon_ref: &'static str,
        altitude: (u32, u32),
    ) -> Self {
        let r = |(num, denom): (u32, u32)| Rational { num, denom };
        Self {
            latitude: vec![r(lat_deg), r(lat_min), r((0, 1))],
            latitude_ref: lat_ref,
            longitude: vec![r(lon_deg), r(lon_min), r((0, 1))],
            longitude_ref: lon_ref,
            altitude: r(altitude),
        }
    }
}

/// EXIF content for a fixture photo.
pub struct ExifSpec {
    pub captured_at: Option<String>,
    pub gps: Option<GpsSpec>,
}

impl ExifSpec {
    pub fn dated(captured_at: impl Into<String>) -> Self {
        Self {
            captured_at: Some(captured_at.into()),
            gps: None,
        }
    }
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn rational(tag: Tag, values: Vec<Rational>) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(values),
    }
}

/// Encode a uniform grey JPEG and splice an APP1 EXIF segment after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, luma: u8, spec: &ExifSpec) -> Vec<u8> {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([luma])));
    encode_with_exif(&img, spec)
}

/// Encode `img` as JPEG and splice an APP1 EXIF segment after SOI.
pub fn encode_with_exif(img: &DynamicImage, spec: &ExifSpec) -> Vec<u8> {
    let mut jpeg = Vec::new();
    img.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();

    let mut fields = vec![ascii(Tag::Make, "fieldsort-fixture")];
    if let Some(ts) = &spec.captured_at {
        fields.push(ascii(Tag::DateTimeOriginal, ts));
    }
    if let Some(gps) = &spec.gps {
        fields.push(rational(Tag::GPSLatitude, gps.latitude.clone()));
        fields.push(ascii(Tag::GPSLatitudeRef, gps.latitude_ref));
        fields.push(rational(Tag::GPSLongitude, gps.longitude.clone()));
        fields.push(ascii(Tag::GPSLongitudeRef, gps.longitude_ref));
        fields.push(rational(Tag::GPSAltitude, vec![gps.altitude]));
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let segment_len = (2 + 6 + tiff.len()) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a fixture photo into `dir`.
///
/// `card: Some(w)` makes a bright photo `w` pixels wide that [`CardReader`]
/// decodes as `S{w}`; `None` makes a dark photo with no card.
pub fn write_photo(dir: &Path, name: &str, card: Option<u32>, spec: &ExifSpec) -> PathBuf {
    let (width, luma) = match card {
        Some(w) => (w, 255),
        None => (PLAIN_WIDTH, 0),
    };
    let path = dir.join(name);
    std::fs::write(&path, jpeg_with_exif(width, PHOTO_HEIGHT, luma, spec)).unwrap();
    path
}

/// Decodes a "card" from bright fixture photos at native resolution.
pub struct CardReader;

impl SymbolReader for CardReader {
    fn read(&self, image: &GrayImage) -> Vec<String> {
        let (w, h) = image.dimensions();
        if h == PHOTO_HEIGHT && image.get_pixel(w / 2, h / 2)[0] > 128 {
            vec![format!("S{w}")]
        } else {
            vec![]
        }
    }
}
