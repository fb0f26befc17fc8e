use std::path::Path;

use mupdf::pdf::{PdfDocument, PdfObject};
use mupdf::{Document, TextPageFlags};

use symcat_core::{ImageRecord, PageSource, SourceError};

mod encode;

pub use encode::{ColorModel, SampleLayout, cmyk_to_rgb, encode_png, render_png};

/// How deep to follow nested Form XObjects.
const MAX_NESTING: usize = 8;

/// MuPDF-based implementation of [`PageSource`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (AGPL-3.0) from the rest of the workspace.
///
/// Text comes from MuPDF's structured text page, one output line per text
/// line. Images are the `/Subtype /Image` streams reachable from the page's
/// `/Resources /XObject` dictionary (descending into Form XObjects), in
/// dictionary order. JPEG and JPEG 2000 streams are passed through as-is.
/// Everything else is decoded by MuPDF and re-encoded as PNG, which covers
/// gray, RGB, CMYK, ICC-based and indexed colour at any bit depth as well as
/// stencil masks. Streams in other colour spaces keep their decoded samples
/// with the `bin` extension.
pub struct MupdfSource {
    document: Document,
    pdf: PdfDocument,
}

impl MupdfSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| SourceError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| SourceError::OpenError(e.to_string()))?;
        let pdf = PdfDocument::open(path_str).map_err(|e| SourceError::OpenError(e.to_string()))?;

        Ok(Self { document, pdf })
    }

    fn check_page(&self, page: usize) -> Result<i32, SourceError> {
        let count = self.page_count()?;
        if page >= count {
            return Err(SourceError::PageOutOfRange { page, count });
        }
        i32::try_from(page).map_err(|_| SourceError::PageOutOfRange { page, count })
    }
}

impl PageSource for MupdfSource {
    fn page_count(&self) -> Result<usize, SourceError> {
        let count = self
            .document
            .page_count()
            .map_err(|e| SourceError::OpenError(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn page_text(&self, page: usize) -> Result<String, SourceError> {
        let page_no = self.check_page(page)?;
        let text_err = |e: mupdf::Error| SourceError::TextError {
            page,
            message: e.to_string(),
        };

        let loaded = self.document.load_page(page_no).map_err(text_err)?;
        let text_page = loaded
            .to_text_page(TextPageFlags::empty())
            .map_err(text_err)?;

        // Block/line iteration keeps each visual line on its own line
        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                page_text.push_str(&line_text);
                page_text.push('\n');
            }
        }
        Ok(page_text)
    }

    fn page_images(&self, page: usize) -> Result<Vec<ImageRecord>, SourceError> {
        let page_no = self.check_page(page)?;
        let image_err = |e: mupdf::Error| SourceError::ImageError {
            page,
            message: e.to_string(),
        };

        let page_obj = self.pdf.find_page(page_no).map_err(image_err)?;
        let mut streams = Vec::new();
        if let Some(resources) = inherited_resources(&page_obj).map_err(image_err)? {
            collect_image_streams(&resources, 0, &mut streams).map_err(image_err)?;
        }

        let mut records = Vec::with_capacity(streams.len());
        for (i, stream) in streams.iter().enumerate() {
            let (bytes, ext) = export_image(stream).map_err(image_err)?;
            if ext == "bin" {
                tracing::warn!(
                    page = page + 1,
                    image = i + 1,
                    "unsupported colour space, writing decoded samples"
                );
            }
            records.push(ImageRecord {
                bytes,
                ext: ext.to_string(),
                index: i + 1,
            });
        }

        tracing::debug!(page = page + 1, images = records.len(), "page images extracted");
        Ok(records)
    }
}

/// The page's `/Resources`, inherited from the page tree when absent.
fn inherited_resources(page: &PdfObject) -> Result<Option<PdfObject>, mupdf::Error> {
    page.get_dict_inheritable("Resources")
}

/// Walk `/XObject` entries of a resource dictionary in order, collecting
/// image streams and descending into Form XObjects.
fn collect_image_streams(
    resources: &PdfObject,
    depth: usize,
    out: &mut Vec<PdfObject>,
) -> Result<(), mupdf::Error> {
    let Some(xobjects) = resources.get_dict("XObject")? else {
        return Ok(());
    };

    for i in 0..xobjects.dict_len()? {
        let Some(xobject) = xobjects.get_dict_val(i as i32)? else {
            continue;
        };
        match name_of(&xobject, "Subtype")?.as_deref() {
            Some("Image") => out.push(xobject),
            Some("Form") if depth < MAX_NESTING => {
                if let Some(form_resources) = xobject.get_dict("Resources")? {
                    collect_image_streams(&form_resources, depth + 1, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn name_text(obj: &PdfObject) -> Result<Option<String>, mupdf::Error> {
    if obj.is_name()? {
        return Ok(Some(String::from_utf8_lossy(obj.as_name()?).into_owned()));
    }
    Ok(None)
}

fn name_of(obj: &PdfObject, key: &str) -> Result<Option<String>, mupdf::Error> {
    match obj.get_dict(key)? {
        Some(value) => name_text(&value),
        None => Ok(None),
    }
}

/// Names in `/Filter`, which may be a single name or an array of names.
fn filters_of(stream: &PdfObject) -> Result<Vec<String>, mupdf::Error> {
    let Some(filter) = stream.get_dict("Filter")? else {
        return Ok(Vec::new());
    };
    if let Some(name) = name_text(&filter)? {
        return Ok(vec![name]);
    }
    let mut names = Vec::new();
    if filter.is_array()? {
        for i in 0..filter.len()? {
            if let Some(item) = filter.get_array(i as i32)?
                && let Some(name) = name_text(&item)?
            {
                names.push(name);
            }
        }
    }
    Ok(names)
}

fn int_of(obj: &PdfObject, key: &str) -> Result<Option<i32>, mupdf::Error> {
    match obj.get_dict(key)? {
        Some(value) if value.is_int()? => Ok(Some(value.as_int()?)),
        _ => Ok(None),
    }
}

/// Component layout of a non-indexed colour space: a family name, or an
/// array such as `[/ICCBased stream]` (resolved by its `/N`) or
/// `[/CalRGB dict]`.
fn layout_of(cs: &PdfObject) -> Result<Option<SampleLayout>, mupdf::Error> {
    if let Some(name) = name_text(cs)? {
        return Ok(SampleLayout::from_color_space(&name));
    }
    if !cs.is_array()? {
        return Ok(None);
    }
    let family = match cs.get_array(0)? {
        Some(first) => name_text(&first)?,
        None => None,
    };
    match family.as_deref() {
        Some("ICCBased") => match cs.get_array(1)? {
            Some(profile) => Ok(int_of(&profile, "N")?.and_then(SampleLayout::from_components)),
            None => Ok(None),
        },
        Some(family) => Ok(SampleLayout::from_color_space(family)),
        None => Ok(None),
    }
}

/// `[/Indexed base hival lookup]`, the lookup table being a string or a stream.
fn indexed_model(cs: &PdfObject) -> Result<Option<ColorModel>, mupdf::Error> {
    let (Some(base), Some(hival), Some(table)) = (cs.get_array(1)?, cs.get_array(2)?, cs.get_array(3)?)
    else {
        return Ok(None);
    };
    let Some(base) = layout_of(&base)? else {
        return Ok(None);
    };
    if !hival.is_int()? {
        return Ok(None);
    }
    let hival = hival.as_int()?.clamp(0, 255) as u8;
    let lookup = if table.is_stream()? {
        table.read_stream()?
    } else if table.is_string()? {
        table.as_bytes()?.to_vec()
    } else {
        return Ok(None);
    };
    Ok(Some(ColorModel::Indexed {
        base,
        hival,
        lookup,
    }))
}

/// How the samples of an image stream map to colours, or `None` for colour
/// spaces that are not exported as PNG (Separation, DeviceN, Lab, ...).
fn color_model_of(stream: &PdfObject) -> Result<Option<ColorModel>, mupdf::Error> {
    if let Some(mask) = stream.get_dict("ImageMask")?
        && mask.is_bool()?
        && mask.as_bool()?
    {
        let inverted = match stream.get_dict("Decode")? {
            Some(decode) if decode.is_array()? => match decode.get_array(0)? {
                Some(first) if first.is_number()? => first.as_float()? > 0.5,
                _ => false,
            },
            _ => false,
        };
        return Ok(Some(ColorModel::Stencil { inverted }));
    }

    let Some(cs) = stream.get_dict("ColorSpace")? else {
        return Ok(None);
    };
    if cs.is_array()?
        && let Some(first) = cs.get_array(0)?
        && name_text(&first)?.as_deref() == Some("Indexed")
    {
        return indexed_model(&cs);
    }
    Ok(layout_of(&cs)?.map(ColorModel::Device))
}

/// Bytes and file extension for one image stream.
fn export_image(stream: &PdfObject) -> Result<(Vec<u8>, &'static str), mupdf::Error> {
    let filters = filters_of(stream)?;
    match filters.as_slice() {
        [only] if only == "DCTDecode" => return Ok((stream.read_raw_stream()?, "jpeg")),
        [only] if only == "JPXDecode" => return Ok((stream.read_raw_stream()?, "jpx")),
        _ => {}
    }

    // MuPDF applies every remaining filter, JBIG2 and CCITT fax included.
    let samples = stream.read_stream()?;
    let width = int_of(stream, "Width")?.and_then(|w| u32::try_from(w).ok());
    let height = int_of(stream, "Height")?.and_then(|h| u32::try_from(h).ok());
    let model = color_model_of(stream)?;
    let bpc = match (&model, int_of(stream, "BitsPerComponent")?) {
        (Some(ColorModel::Stencil { .. }), _) => Some(1),
        (_, bpc) => bpc.and_then(|b| u8::try_from(b).ok()),
    };

    if let (Some(width), Some(height), Some(bpc), Some(model)) = (width, height, bpc, model)
        && let Some(png) = render_png(&samples, width, height, bpc, &model)
    {
        return Ok((png, "png"));
    }
    Ok((samples, "bin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mupdf::Buffer;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    /// Add an indirect object parsed from `dict` and attach decoded `data`
    /// as its stream.
    fn stream_object(doc: &mut PdfDocument, dict: &str, data: &[u8]) -> PdfObject {
        let obj = doc.new_object_from_str(dict).unwrap();
        let mut stream = doc.add_object(&obj).unwrap();
        stream
            .write_stream_buffer(&Buffer::from_bytes(data).unwrap())
            .unwrap();
        stream
    }

    fn gray_pixel(doc: &mut PdfDocument, value: u8) -> PdfObject {
        stream_object(
            doc,
            "<< /Type /XObject /Subtype /Image /Width 1 /Height 1 /ColorSpace /DeviceGray /BitsPerComponent 8 >>",
            &[value],
        )
    }

    fn resources_with(doc: &PdfDocument, entries: Vec<(&str, PdfObject)>) -> PdfObject {
        let mut xobjects = doc.new_dict().unwrap();
        for (key, value) in entries {
            xobjects.dict_put(key, value).unwrap();
        }
        let mut resources = doc.new_dict().unwrap();
        resources.dict_put("XObject", xobjects).unwrap();
        resources
    }

    #[test]
    fn filters_accept_name_or_array() {
        let doc = PdfDocument::new();
        let single = doc.new_object_from_str("<< /Filter /DCTDecode >>").unwrap();
        assert_eq!(filters_of(&single).unwrap(), vec!["DCTDecode"]);

        let chain = doc
            .new_object_from_str("<< /Filter [/ASCIIHexDecode /FlateDecode] >>")
            .unwrap();
        assert_eq!(filters_of(&chain).unwrap(), vec!["ASCIIHexDecode", "FlateDecode"]);

        let none = doc.new_object_from_str("<< /Width 1 >>").unwrap();
        assert!(filters_of(&none).unwrap().is_empty());
    }

    #[test]
    fn jpeg_and_jpx_pass_through_untouched() {
        let mut doc = PdfDocument::new();
        for (filter, ext) in [("DCTDecode", "jpeg"), ("JPXDecode", "jpx")] {
            let dict = format!("<< /Subtype /Image /Width 1 /Height 1 /Filter /{filter} >>");
            let obj = doc.new_object_from_str(&dict).unwrap();
            let mut stream = doc.add_object(&obj).unwrap();
            stream.write_raw_stream_string("encoded image bytes").unwrap();

            let (bytes, got) = export_image(&stream).unwrap();
            assert_eq!(got, ext);
            assert_eq!(bytes, b"encoded image bytes".to_vec());
        }
    }

    #[test]
    fn eight_bit_gray_becomes_png() {
        let mut doc = PdfDocument::new();
        let stream = gray_pixel(&mut doc, 128);
        let (bytes, ext) = export_image(&stream).unwrap();
        assert_eq!(ext, "png");
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn icc_based_layout_uses_component_count() {
        let mut doc = PdfDocument::new();
        let profile = stream_object(&mut doc, "<< /N 3 >>", b"profile");
        let mut cs = doc.new_array().unwrap();
        cs.array_push(doc.new_name("ICCBased").unwrap()).unwrap();
        cs.array_push(profile).unwrap();
        assert_eq!(layout_of(&cs).unwrap(), Some(SampleLayout::Rgb));

        let mut image = stream_object(
            &mut doc,
            "<< /Subtype /Image /Width 1 /Height 1 /BitsPerComponent 8 >>",
            &[255, 0, 0],
        );
        image.dict_put("ColorSpace", cs).unwrap();
        assert_eq!(
            color_model_of(&image).unwrap(),
            Some(ColorModel::Device(SampleLayout::Rgb))
        );
        assert_eq!(export_image(&image).unwrap().1, "png");
    }

    #[test]
    fn indexed_image_becomes_png() {
        let mut doc = PdfDocument::new();
        let stream = stream_object(
            &mut doc,
            "<< /Subtype /Image /Width 2 /Height 1 /BitsPerComponent 8 /ColorSpace [/Indexed /DeviceRGB 1 <FF000000FF00>] >>",
            &[0, 1],
        );
        assert_eq!(
            color_model_of(&stream).unwrap(),
            Some(ColorModel::Indexed {
                base: SampleLayout::Rgb,
                hival: 1,
                lookup: vec![0xFF, 0, 0, 0, 0xFF, 0],
            })
        );
        let (bytes, ext) = export_image(&stream).unwrap();
        assert_eq!(ext, "png");
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn indexed_lookup_may_be_a_stream() {
        let mut doc = PdfDocument::new();
        let table = stream_object(&mut doc, "<< >>", &[0, 255]);
        let mut cs = doc.new_array().unwrap();
        cs.array_push(doc.new_name("Indexed").unwrap()).unwrap();
        cs.array_push(doc.new_name("DeviceGray").unwrap()).unwrap();
        cs.array_push(doc.new_int(1).unwrap()).unwrap();
        cs.array_push(table).unwrap();

        let model = indexed_model(&cs).unwrap();
        assert_eq!(
            model,
            Some(ColorModel::Indexed {
                base: SampleLayout::Gray,
                hival: 1,
                lookup: vec![0, 255],
            })
        );
    }

    #[test]
    fn one_bit_gray_becomes_png() {
        let mut doc = PdfDocument::new();
        let stream = stream_object(
            &mut doc,
            "<< /Subtype /Image /Width 8 /Height 1 /BitsPerComponent 1 /ColorSpace /DeviceGray >>",
            &[0b1010_1010],
        );
        let (bytes, ext) = export_image(&stream).unwrap();
        assert_eq!(ext, "png");
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn image_mask_reads_decode_array() {
        let mut doc = PdfDocument::new();
        let plain = stream_object(
            &mut doc,
            "<< /Subtype /Image /Width 2 /Height 1 /ImageMask true >>",
            &[0b0100_0000],
        );
        assert_eq!(
            color_model_of(&plain).unwrap(),
            Some(ColorModel::Stencil { inverted: false })
        );
        assert_eq!(export_image(&plain).unwrap().1, "png");

        let inverted = stream_object(
            &mut doc,
            "<< /Subtype /Image /Width 2 /Height 1 /ImageMask true /Decode [1 0] >>",
            &[0b0100_0000],
        );
        assert_eq!(
            color_model_of(&inverted).unwrap(),
            Some(ColorModel::Stencil { inverted: true })
        );
    }

    #[test]
    fn unsupported_colour_space_keeps_samples() {
        let mut doc = PdfDocument::new();
        let stream = stream_object(
            &mut doc,
            "<< /Subtype /Image /Width 1 /Height 1 /BitsPerComponent 8 /ColorSpace [/Lab << /WhitePoint [0.95 1 1.09] >>] >>",
            &[50, 0, 0],
        );
        assert_eq!(color_model_of(&stream).unwrap(), None);
        let (bytes, ext) = export_image(&stream).unwrap();
        assert_eq!(ext, "bin");
        assert_eq!(bytes, vec![50, 0, 0]);
    }

    #[test]
    fn form_xobjects_are_walked_in_place() {
        let mut doc = PdfDocument::new();
        let inner = gray_pixel(&mut doc, 10);
        let outer = gray_pixel(&mut doc, 20);

        let mut form = doc
            .new_object_from_str("<< /Type /XObject /Subtype /Form >>")
            .unwrap();
        form.dict_put("Resources", resources_with(&doc, vec![("Im1", inner)]))
            .unwrap();
        let resources = resources_with(&doc, vec![("Fm1", form), ("Im2", outer)]);

        let mut found = Vec::new();
        collect_image_streams(&resources, 0, &mut found).unwrap();
        let samples: Vec<Vec<u8>> = found.iter().map(|s| s.read_stream().unwrap()).collect();
        assert_eq!(samples, vec![vec![10], vec![20]]);
    }

    #[test]
    fn resources_are_inherited_from_page_tree() {
        let mut doc = PdfDocument::new();
        let image = gray_pixel(&mut doc, 7);

        let mut parent = doc.new_dict().unwrap();
        parent
            .dict_put("Resources", resources_with(&doc, vec![("Im1", image)]))
            .unwrap();
        let mut page = doc.new_dict().unwrap();
        page.dict_put("Parent", parent).unwrap();

        let resources = inherited_resources(&page).unwrap().unwrap();
        let mut found = Vec::new();
        collect_image_streams(&resources, 0, &mut found).unwrap();
        assert_eq!(found.len(), 1);

        let own = doc.new_object_from_str("<< /Resources << >> >>").unwrap();
        let own_resources = inherited_resources(&own).unwrap().unwrap();
        let mut none = Vec::new();
        collect_image_streams(&own_resources, 0, &mut none).unwrap();
        assert!(none.is_empty());
    }
}
