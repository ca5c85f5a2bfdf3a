//! PDF reader wrapper for lopdf

use crate::error::{Error, Result};
use crate::source::{check_pdf_header, resolve_path};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// Guard against cyclic `Parent` chains and self-referencing form XObjects
const MAX_NESTING: usize = 32;

/// On-disk encoding of an extracted image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Original DCT stream bytes
    Jpeg,
    /// Original JPX stream bytes
    Jpeg2000,
    /// Raw samples re-encoded as PNG
    Png,
}

impl ImageEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpeg",
            ImageEncoding::Jpeg2000 => "jpx",
            ImageEncoding::Png => "png",
        }
    }
}

/// Extracted image information
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Page number (1-indexed)
    pub page: u32,
    /// Image index on the page (1-indexed)
    pub index: u32,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub encoding: ImageEncoding,
    /// Encoded file content
    pub data: Vec<u8>,
}

/// An image that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub page: u32,
    pub index: u32,
    pub reason: String,
}

impl SkippedImage {
    /// `image{page}_{index}: {reason}`, naming the file it would have been
    pub fn note(&self) -> String {
        format!("image{}_{}: {}", self.page, self.index, self.reason)
    }
}

/// Images of a document, plus the ones that had to be left out
#[derive(Debug, Default)]
pub struct ImageExtraction {
    pub images: Vec<ExtractedImage>,
    pub skipped: Vec<SkippedImage>,
}

impl ExtractedImage {
    /// File name following the `image{page}_{index}.{ext}` convention
    pub fn file_name(&self) -> String {
        format!(
            "image{}_{}.{}",
            self.page,
            self.index,
            self.encoding.extension()
        )
    }
}

/// PDF reader using lopdf
pub struct PdfReader {
    document: Document,
    /// (page number, page object) in page order
    pages: Vec<(u32, ObjectId)>,
}

impl PdfReader {
    /// Open a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let resolved = resolve_path(path)?;
        Self::open_bytes(&resolved.data)
    }

    /// Open a PDF from bytes
    pub fn open_bytes(data: &[u8]) -> Result<Self> {
        check_pdf_header(data)?;

        let document = Document::load_mem(data).map_err(|e| Error::InvalidPdf {
            reason: e.to_string(),
        })?;
        let pages = document.get_pages().into_iter().collect();

        Ok(Self { document, pages })
    }

    /// Get page count
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Extract text from a specific page (1-indexed)
    pub fn extract_page_text(&self, page_num: u32) -> Result<String> {
        if page_num == 0 || page_num > self.page_count() {
            return Err(Error::PageOutOfBounds {
                page: page_num,
                total: self.page_count(),
            });
        }
        let (number, _) = self.pages[(page_num - 1) as usize];
        Ok(self.document.extract_text(&[number])?)
    }

    /// Extract text from all pages as (page number, text)
    pub fn extract_all_text(&self) -> Result<Vec<(u32, String)>> {
        (1..=self.page_count())
            .map(|n| Ok((n, self.extract_page_text(n)?)))
            .collect()
    }

    /// Extract the images of every page, in page order and resource order.
    ///
    /// Images that cannot be written are recorded as skipped; their position
    /// still counts toward the per-page index.
    pub fn extract_images(&self) -> Result<ImageExtraction> {
        let mut extraction = ImageExtraction::default();

        for (page_idx, &(_, page_id)) in self.pages.iter().enumerate() {
            let page = page_idx as u32 + 1;
            let mut seen = HashSet::new();
            let mut streams = Vec::new();
            if let Some(resources) = self.page_resources(page_id)? {
                self.collect_image_streams(resources, &mut seen, &mut streams, 0)?;
            }

            for (i, stream) in streams.into_iter().enumerate() {
                let index = i as u32 + 1;
                match self.encode_image(stream) {
                    Ok((encoding, width, height, data)) => extraction.images.push(ExtractedImage {
                        page,
                        index,
                        width,
                        height,
                        encoding,
                        data,
                    }),
                    Err(e) => {
                        tracing::warn!(page, index, error = %e, "skipping image");
                        let reason = match e {
                            Error::UnsupportedImage { reason } => reason,
                            other => other.client_message(),
                        };
                        extraction.skipped.push(SkippedImage {
                            page,
                            index,
                            reason,
                        });
                    }
                }
            }
        }

        Ok(extraction)
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.document.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// Resources of a page, following inheritance through `Parent`
    fn page_resources(&self, page_id: ObjectId) -> Result<Option<&Dictionary>> {
        let mut node = self.document.get_dictionary(page_id)?;
        for _ in 0..MAX_NESTING {
            if let Ok(resources) = node.get(b"Resources") {
                return Ok(Some(self.resolve(resources)?.as_dict()?));
            }
            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node = self.document.get_dictionary(parent)?,
                Err(_) => return Ok(None),
            }
        }
        Ok(None)
    }

    fn collect_image_streams<'a>(
        &'a self,
        resources: &'a Dictionary,
        seen: &mut HashSet<ObjectId>,
        out: &mut Vec<&'a Stream>,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_NESTING {
            return Ok(());
        }
        let xobjects = match resources.get(b"XObject") {
            Ok(obj) => self.resolve(obj)?.as_dict()?,
            Err(_) => return Ok(()),
        };

        for (_, entry) in xobjects.iter() {
            if let Object::Reference(id) = entry {
                if !seen.insert(*id) {
                    continue;
                }
            }
            let stream = match self.resolve(entry)?.as_stream() {
                Ok(s) => s,
                Err(_) => continue,
            };
            match stream.dict.get(b"Subtype").and_then(Object::as_name) {
                Ok(b"Image") => out.push(stream),
                Ok(b"Form") => {
                    if let Ok(form_resources) = stream.dict.get(b"Resources") {
                        let form_resources = self.resolve(form_resources)?.as_dict()?;
                        self.collect_image_streams(form_resources, seen, out, depth + 1)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Turn an image XObject into file bytes: (encoding, width, height, data)
    fn encode_image(&self, stream: &Stream) -> Result<(ImageEncoding, u32, u32, Vec<u8>)> {
        let dict = &stream.dict;
        let width = dimension(dict, b"Width")?;
        let height = dimension(dict, b"Height")?;
        let filters = filter_names(dict);
        let filters: Vec<&[u8]> = filters.iter().map(Vec::as_slice).collect();

        match filters.as_slice() {
            [b"DCTDecode"] => {
                // Corrupt streams must fail here, not as a broken file on disk
                image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).map_err(
                    |e| Error::UnsupportedImage {
                        reason: format!("corrupt JPEG data: {}", e),
                    },
                )?;
                return Ok((ImageEncoding::Jpeg, width, height, stream.content.clone()));
            }
            [b"JPXDecode"] => {
                return Ok((ImageEncoding::Jpeg2000, width, height, stream.content.clone()));
            }
            [b"CCITTFaxDecode"] => {
                let params = self.decode_params(dict)?;
                let luma = decode_ccitt(&stream.content, params, dict, width, height)?;
                let png = samples_to_png(luma, width, height, 1)?;
                return Ok((ImageEncoding::Png, width, height, png));
            }
            [b"JBIG2Decode"] => {
                return Err(Error::UnsupportedImage {
                    reason: "JBIG2 image".to_string(),
                });
            }
            names if names.iter().any(|n| is_image_codec(n)) => {
                return Err(Error::UnsupportedImage {
                    reason: "chained image filters".to_string(),
                });
            }
            _ => {}
        }

        let mask = dict
            .get(b"ImageMask")
            .and_then(Object::as_bool)
            .unwrap_or(false);
        let bits = if mask {
            1
        } else {
            dict.get(b"BitsPerComponent")
                .and_then(Object::as_i64)
                .unwrap_or(8)
        };
        let bits = match bits {
            1 | 2 | 4 | 8 | 16 => bits as u8,
            other => {
                return Err(Error::UnsupportedImage {
                    reason: format!("{} bits per component", other),
                })
            }
        };
        // Stencil masks are 1-bit gray: 0 paints, 1 leaves the page visible
        let model = if mask {
            ColorModel::Direct(1)
        } else {
            self.color_model(dict)?
        };

        let raw = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .map_err(|e| Error::UnsupportedImage {
                    reason: format!("cannot decode stream: {}", e),
                })?
        };

        let (components, samples) = match model {
            ColorModel::Direct(components) => {
                let mut samples = unpack_samples(&raw, width, height, components, bits, true)?;
                if components == 1 && decode_inverted(dict) {
                    invert(&mut samples);
                }
                (components, samples)
            }
            ColorModel::Indexed {
                components,
                palette,
            } => {
                let indices = unpack_samples(&raw, width, height, 1, bits, false)?;
                (components, expand_palette(&indices, &palette, components))
            }
        };

        let png = samples_to_png(samples, width, height, components)?;
        Ok((ImageEncoding::Png, width, height, png))
    }

    /// First `DecodeParms` dictionary of an image stream, if any
    fn decode_params<'a>(&'a self, dict: &'a Dictionary) -> Result<Option<&'a Dictionary>> {
        let params = match dict.get(b"DecodeParms") {
            Ok(obj) => self.resolve(obj)?,
            Err(_) => return Ok(None),
        };
        let params = match params {
            Object::Array(items) => match items.first() {
                Some(first) => self.resolve(first)?,
                None => return Ok(None),
            },
            other => other,
        };
        Ok(params.as_dict().ok())
    }

    fn color_model(&self, dict: &Dictionary) -> Result<ColorModel> {
        let space = self.resolve(
            dict.get(b"ColorSpace")
                .map_err(|_| unsupported_space("missing"))?,
        )?;
        if let Object::Array(items) = space {
            if items.first().and_then(|o| o.as_name().ok()) == Some(b"Indexed".as_slice()) {
                return self.indexed_model(items);
            }
        }
        Ok(ColorModel::Direct(self.components_of(space)?))
    }

    /// `[/Indexed base hival lookup]`
    fn indexed_model(&self, items: &[Object]) -> Result<ColorModel> {
        let [_, base, hival, lookup] = items else {
            return Err(unsupported_space("malformed Indexed"));
        };
        let components = self.components_of(self.resolve(base)?)?;
        let hival = self
            .resolve(hival)?
            .as_i64()
            .map_err(|_| unsupported_space("Indexed without hival"))?;

        let mut palette = match self.resolve(lookup)? {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(table) => table
                .decompressed_content()
                .unwrap_or_else(|_| table.content.clone()),
            _ => return Err(unsupported_space("Indexed without lookup table")),
        };
        let entries = hival.clamp(0, 255) as usize + 1;
        palette.truncate(entries * components as usize);
        if palette.len() < components as usize {
            return Err(unsupported_space("Indexed with empty lookup table"));
        }

        Ok(ColorModel::Indexed {
            components,
            palette,
        })
    }

    fn components_of(&self, space: &Object) -> Result<u8> {
        match space {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" => Ok(1),
                b"DeviceRGB" | b"CalRGB" => Ok(3),
                b"DeviceCMYK" => Ok(4),
                other => Err(unsupported_space(&String::from_utf8_lossy(other))),
            },
            Object::Array(items) => {
                let family = items.first().and_then(|o| o.as_name().ok());
                match family {
                    Some(b"ICCBased") => {
                        let profile = items
                            .get(1)
                            .ok_or_else(|| unsupported_space("ICCBased without profile"))?;
                        let n = self.resolve(profile)?.as_stream()?.dict.get(b"N")?.as_i64()?;
                        match n {
                            1 | 3 | 4 => Ok(n as u8),
                            _ => Err(unsupported_space("ICCBased with odd component count")),
                        }
                    }
                    Some(b"CalGray") => Ok(1),
                    Some(b"CalRGB") => Ok(3),
                    Some(other) => Err(unsupported_space(&String::from_utf8_lossy(other))),
                    None => Err(unsupported_space("empty array")),
                }
            }
            _ => Err(unsupported_space("of unexpected type")),
        }
    }
}

/// How image samples map to colors
enum ColorModel {
    /// Samples are color values with this many components
    Direct(u8),
    /// Samples index into `palette`, whose entries are `components` bytes wide
    Indexed { components: u8, palette: Vec<u8> },
}

fn unsupported_space(what: &str) -> Error {
    Error::UnsupportedImage {
        reason: format!("color space {}", what),
    }
}

fn is_image_codec(filter: &[u8]) -> bool {
    matches!(
        filter,
        b"DCTDecode" | b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode"
    )
}

/// `Decode [1 0]` on a single-component image
fn decode_inverted(dict: &Dictionary) -> bool {
    let number = |o: &Object| match o {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    };
    match dict.get(b"Decode").and_then(Object::as_array) {
        Ok(range) => matches!(
            (range.first().and_then(number), range.get(1).and_then(number)),
            (Some(lo), Some(hi)) if lo > hi
        ),
        Err(_) => false,
    }
}

fn invert(samples: &mut [u8]) {
    samples.iter_mut().for_each(|s| *s = 255 - *s);
}

/// Unpack rows of `bits`-wide samples into one byte per sample.
///
/// Rows start on byte boundaries. With `scale`, values are stretched to
/// 0..=255; otherwise they are kept as is (palette indices). 16-bit samples
/// keep their high byte.
fn unpack_samples(
    raw: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    bits: u8,
    scale: bool,
) -> Result<Vec<u8>> {
    let per_row = width as usize * channels as usize;
    let row_bytes = (per_row * bits as usize).div_ceil(8);
    let needed = row_bytes * height as usize;
    if raw.len() < needed {
        return Err(Error::UnsupportedImage {
            reason: format!(
                "image data too short: {} bytes, expected {}",
                raw.len(),
                needed
            ),
        });
    }
    if bits == 8 {
        return Ok(raw[..needed].to_vec());
    }

    let mut out = Vec::with_capacity(per_row * height as usize);
    for row in raw[..needed].chunks_exact(row_bytes) {
        if bits == 16 {
            out.extend(row.chunks_exact(2).map(|pair| pair[0]));
            continue;
        }
        let max = (1u16 << bits) - 1;
        for i in 0..per_row {
            let bit = i * bits as usize;
            let shift = 8 - bits as usize - bit % 8;
            let value = (row[bit / 8] >> shift) as u16 & max;
            out.push(if scale { (value * 255 / max) as u8 } else { value as u8 });
        }
    }
    Ok(out)
}

/// Replace palette indices by their color bytes; out-of-range indices clamp
fn expand_palette(indices: &[u8], palette: &[u8], components: u8) -> Vec<u8> {
    let n = components as usize;
    let last = palette.len() / n - 1;
    indices
        .iter()
        .flat_map(|&i| {
            let start = (i as usize).min(last) * n;
            palette[start..start + n].iter().copied()
        })
        .collect()
}

/// Decode CCITT Group 3 (1D) or Group 4 data into 8-bit gray samples
fn decode_ccitt(
    data: &[u8],
    params: Option<&Dictionary>,
    dict: &Dictionary,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let unsupported = |reason: String| Error::UnsupportedImage { reason };
    let int = |key: &[u8], default: i64| {
        params
            .and_then(|p| p.get(key).ok())
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(default)
    };
    let k = int(b"K", 0);
    let columns = int(b"Columns", 1728);
    let black_is_1 = params
        .and_then(|p| p.get(b"BlackIs1").ok())
        .and_then(|o| o.as_bool().ok())
        .unwrap_or(false);

    if columns != width as i64 {
        return Err(unsupported(format!(
            "CCITT Columns {} differ from Width {}",
            columns, width
        )));
    }
    let columns = u16::try_from(columns)
        .map_err(|_| unsupported(format!("CCITT image {} pixels wide", columns)))?;
    let rows = u16::try_from(height).ok();

    // Sample values as seen through the default Decode array
    let (black, white) = if black_is_1 { (255u8, 0u8) } else { (0u8, 255u8) };
    let line_len = width as usize;
    let mut pixels = Vec::with_capacity(line_len * height as usize);
    let mut lines = 0u32;
    let mut on_line = |transitions: &[u16]| {
        if lines >= height {
            return;
        }
        let start = pixels.len();
        pixels.resize(start + line_len, white);
        let mut is_black = false;
        let mut from = 0usize;
        for &t in transitions {
            let to = (t as usize).min(line_len);
            if is_black && from < to {
                pixels[start + from..start + to].fill(black);
            }
            is_black = !is_black;
            from = to;
        }
        if is_black && from < line_len {
            pixels[start + from..start + line_len].fill(black);
        }
        lines += 1;
    };

    let bytes = data.iter().copied();
    let decoded = match k {
        k if k < 0 => fax::decoder::decode_g4(bytes, columns, rows, &mut on_line),
        0 => fax::decoder::decode_g3(bytes, &mut on_line),
        _ => return Err(unsupported("CCITT mixed 1D/2D data".to_string())),
    };
    if lines == 0 {
        return Err(unsupported(match decoded {
            Some(()) => "CCITT data without rows".to_string(),
            None => "CCITT data could not be decoded".to_string(),
        }));
    }
    if decoded.is_none() {
        tracing::debug!(lines, height, "CCITT data ended early");
    }

    pixels.resize(line_len * height as usize, white);
    if decode_inverted(dict) {
        invert(&mut pixels);
    }
    Ok(pixels)
}

fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let name = String::from_utf8_lossy(key);
    let value = dict
        .get(key)
        .and_then(Object::as_i64)
        .map_err(|_| Error::UnsupportedImage {
            reason: format!("missing {}", name),
        })?;
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::UnsupportedImage {
            reason: format!("bad {} {}", name, value),
        }),
    }
}

/// Re-encode one-byte-per-sample gray/RGB/CMYK data as PNG
fn samples_to_png(mut samples: Vec<u8>, width: u32, height: u32, components: u8) -> Result<Vec<u8>> {
    let required = width as usize * height as usize * components as usize;
    if samples.len() < required {
        return Err(Error::InvalidPdf {
            reason: format!(
                "image data too short: {} bytes, expected {}",
                samples.len(),
                required
            ),
        });
    }
    samples.truncate(required);

    let too_short = || Error::InvalidPdf {
        reason: "image buffer size mismatch".to_string(),
    };
    let image = match components {
        1 => DynamicImage::ImageLuma8(
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, samples).ok_or_else(too_short)?,
        ),
        3 => DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, samples).ok_or_else(too_short)?,
        ),
        _ => {
            let rgb: Vec<u8> = samples.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            DynamicImage::ImageRgb8(
                ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, rgb).ok_or_else(too_short)?,
            )
        }
    };

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - px[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}
