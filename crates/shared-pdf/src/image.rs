//! Image XObject extraction

use lopdf::{Dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};

/// An image placed on a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    /// XObject resource name, e.g. `Im0`
    pub name: String,
    /// Whether the image dictionary carries an `/Alt` entry
    pub has_alt: bool,
    #[serde(skip)]
    pub data: ImageData,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, has_alt: bool, data: ImageData) -> Self {
        Self {
            name: name.into(),
            has_alt,
            data,
        }
    }
}

/// Pixel source for an image
#[derive(Debug, Clone, Default)]
pub enum ImageData {
    /// A self-describing encoded file (JPEG from `DCTDecode`, JPEG 2000 from `JPXDecode`)
    Encoded(Vec<u8>),
    /// Decoded 8-bit samples, row-major, `color.channels()` per pixel
    Raw {
        width: u32,
        height: u32,
        color: RawColor,
        samples: Vec<u8>,
    },
    /// Something the adapter cannot hand to a decoder
    Unsupported(String),
    #[default]
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawColor {
    Gray,
    Rgb,
    Cmyk,
}

impl RawColor {
    pub fn channels(&self) -> usize {
        match self {
            RawColor::Gray => 1,
            RawColor::Rgb => 3,
            RawColor::Cmyk => 4,
        }
    }
}

/// Collect every image XObject in a page's resource dictionary
pub(crate) fn page_images(doc: &Document, resources: Option<&Dictionary>) -> Vec<ImageRef> {
    let Some(xobjects) = resources
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, value) in xobjects.iter() {
        let Some(stream) = resolve_stream(doc, value) else {
            continue;
        };
        let is_image = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Image");
        if !is_image {
            continue;
        }
        images.push(ImageRef {
            name: String::from_utf8_lossy(name).into_owned(),
            has_alt: stream.dict.has(b"Alt"),
            data: image_data(doc, stream),
        });
    }
    images
}

fn image_data(doc: &Document, stream: &Stream) -> ImageData {
    let dict = &stream.dict;
    let filters = filter_names(dict);

    if let Some(last) = filters.last() {
        if last == "DCTDecode" || last == "JPXDecode" {
            return ImageData::Encoded(stream.content.clone());
        }
    }

    let width = dict.get(b"Width").ok().and_then(integer);
    let height = dict.get(b"Height").ok().and_then(integer);
    let (Some(width), Some(height)) = (width, height) else {
        return ImageData::Unsupported("missing image dimensions".into());
    };

    let bits = dict.get(b"BitsPerComponent").ok().and_then(integer).unwrap_or(8);
    if bits != 8 {
        return ImageData::Unsupported(format!("{} bits per component", bits));
    }

    let Some(color) = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| color_space(doc, cs))
    else {
        return ImageData::Unsupported("unsupported color space".into());
    };

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        match stream.decompressed_content() {
            Ok(samples) => samples,
            Err(e) => return ImageData::Unsupported(format!("cannot decompress: {}", e)),
        }
    };

    let expected = width as usize * height as usize * color.channels();
    if samples.len() < expected {
        return ImageData::Unsupported(format!(
            "expected {} sample bytes, found {}",
            expected,
            samples.len()
        ));
    }

    ImageData::Raw {
        width,
        height,
        color,
        samples,
    }
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn color_space(doc: &Document, object: &Object) -> Option<RawColor> {
    let object = match object {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match object {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"G" => Some(RawColor::Gray),
            b"DeviceRGB" | b"RGB" => Some(RawColor::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(RawColor::Cmyk),
            _ => None,
        },
        // [/ICCBased stream]: the component count decides
        Object::Array(items) => match items.first() {
            Some(Object::Name(family)) if family.as_slice() == b"ICCBased" => {
                let profile = items.get(1).and_then(|p| resolve_stream(doc, p))?;
                match profile.dict.get(b"N").ok().and_then(integer)? {
                    1 => Some(RawColor::Gray),
                    3 => Some(RawColor::Rgb),
                    4 => Some(RawColor::Cmyk),
                    _ => None,
                }
            }
            Some(Object::Name(family)) if family.as_slice() == b"CalRGB" => Some(RawColor::Rgb),
            Some(Object::Name(family)) if family.as_slice() == b"CalGray" => Some(RawColor::Gray),
            _ => None,
        },
        _ => None,
    }
}

fn integer(object: &Object) -> Option<u32> {
    match object {
        Object::Integer(i) => u32::try_from(*i).ok(),
        _ => None,
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        },
        _ => None,
    }
}

fn resolve_stream<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Stream> {
    match object {
        Object::Stream(stream) => Some(stream),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(stream) => Some(stream),
            _ => None,
        },
        _ => None,
    }
}
