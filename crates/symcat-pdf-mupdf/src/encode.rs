use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

/// Layout of decoded image samples, as far as PNG export cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    Gray,
    Rgb,
    Cmyk,
}

impl SampleLayout {
    /// Map a PDF colour space name (or ICC component count) to a layout.
    pub fn from_color_space(name: &str) -> Option<Self> {
        match name {
            "DeviceGray" | "CalGray" => Some(Self::Gray),
            "DeviceRGB" | "CalRGB" => Some(Self::Rgb),
            "DeviceCMYK" => Some(Self::Cmyk),
            _ => None,
        }
    }

    pub fn from_components(n: i32) -> Option<Self> {
        match n {
            1 => Some(Self::Gray),
            3 => Some(Self::Rgb),
            4 => Some(Self::Cmyk),
            _ => None,
        }
    }

    pub fn components(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

/// How the samples of an image XObject map to colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorModel {
    /// Samples are colour components in the given layout.
    Device(SampleLayout),
    /// Samples index into `lookup`, `base.components()` bytes per entry.
    Indexed {
        base: SampleLayout,
        hival: u8,
        lookup: Vec<u8>,
    },
    /// `/ImageMask true`. Sample 0 paints unless `/Decode [1 0]` inverts it.
    Stencil { inverted: bool },
}

/// Naive CMYK to RGB conversion, one output pixel per 4 input bytes.
pub fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

/// Split packed rows into one byte per sample.
///
/// Rows of 1, 2 and 4 bit samples are padded to a byte boundary. 16-bit
/// samples keep their high byte. Values are left unscaled, so a 4-bit
/// sample stays in `0..=15`. Returns `None` when `data` is too short.
pub fn unpack_samples(data: &[u8], bpc: u8, row_len: usize, rows: usize) -> Option<Vec<u8>> {
    let total = row_len.checked_mul(rows)?;
    if total == 0 {
        return None;
    }
    match bpc {
        8 => data.get(..total).map(<[u8]>::to_vec),
        16 => Some(
            data.get(..total.checked_mul(2)?)?
                .chunks_exact(2)
                .map(|pair| pair[0])
                .collect(),
        ),
        1 | 2 | 4 => {
            let bits = usize::from(bpc);
            let stride = (row_len * bits).div_ceil(8);
            let mask = (1u8 << bpc) - 1;
            let mut out = Vec::with_capacity(total);
            for row in 0..rows {
                let packed = data.get(row * stride..(row + 1) * stride)?;
                for i in 0..row_len {
                    let bit = i * bits;
                    let shift = 8 - bits - bit % 8;
                    out.push((packed[bit / 8] >> shift) & mask);
                }
            }
            Some(out)
        }
        _ => None,
    }
}

/// Stretch unpacked sample values to the full `0..=255` range.
pub fn scale_to_8bit(values: &mut [u8], bpc: u8) {
    let max: u16 = match bpc {
        1 => 1,
        2 => 3,
        4 => 15,
        _ => return,
    };
    for v in values {
        *v = (u16::from(*v) * 255 / max) as u8;
    }
}

/// Replace palette indices by their colour components. Indices above
/// `hival` are clamped to it.
pub fn expand_indexed(indices: &[u8], base: SampleLayout, hival: u8, lookup: &[u8]) -> Option<Vec<u8>> {
    let n = base.components();
    let mut out = Vec::with_capacity(indices.len() * n);
    for &index in indices {
        let start = usize::from(index.min(hival)) * n;
        out.extend_from_slice(lookup.get(start..start + n)?);
    }
    Some(out)
}

/// Encode 8-bit decoded samples as PNG. Returns `None` when the sample
/// buffer is too short for the given dimensions.
pub fn encode_png(samples: Vec<u8>, width: u32, height: u32, layout: SampleLayout) -> Option<Vec<u8>> {
    let image = match layout {
        SampleLayout::Gray => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples)?),
        SampleLayout::Rgb => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples)?),
        SampleLayout::Cmyk => {
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))?)
        }
    };

    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).ok()?;
    Some(buf)
}

/// Turn a decoded stream into PNG bytes: unpack sub-byte and 16-bit
/// samples, expand palettes and stencil masks, then encode.
pub fn render_png(data: &[u8], width: u32, height: u32, bpc: u8, model: &ColorModel) -> Option<Vec<u8>> {
    let pixels = usize::try_from(width).ok()?;
    let rows = usize::try_from(height).ok()?;

    let (samples, layout) = match model {
        ColorModel::Device(layout) => {
            let mut samples = unpack_samples(data, bpc, pixels * layout.components(), rows)?;
            scale_to_8bit(&mut samples, bpc);
            (samples, *layout)
        }
        ColorModel::Indexed {
            base,
            hival,
            lookup,
        } => {
            let indices = unpack_samples(data, bpc, pixels, rows)?;
            (expand_indexed(&indices, *base, *hival, lookup)?, *base)
        }
        ColorModel::Stencil { inverted } => {
            let mut samples = unpack_samples(data, 1, pixels, rows)?;
            if *inverted {
                samples.iter_mut().for_each(|v| *v ^= 1);
            }
            scale_to_8bit(&mut samples, 1);
            (samples, SampleLayout::Gray)
        }
    };
    encode_png(samples, width, height, layout)
}
