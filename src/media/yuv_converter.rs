// SPDX-License-Identifier: GPL-3.0-only

//! CPU conversion of chroma-subsampled YUV samples to packed RGBA
//!
//! One routine serves every [`ChromaLayout`]: the layout only decides where
//! the luma and chroma bytes of a 2-pixel group are read from. The colour
//! math lives in [`ChromaTerms`] and [`luma`] and is shared by all of them.
//!
//! ```text
//! R = Y' + 1.402 V'
//! G = Y' - 0.344 U' - 0.714 V'
//! B = Y' + 1.772 U'
//! ```
//!
//! with `U' = U - 128`, `V' = V - 128` and `Y'` depending on [`LumaRange`].
//! Every channel saturates to 0..=255 and alpha is always opaque.

use super::formats::pixel_format::{ChromaPlanes, PackedOffsets};
use super::formats::{FrameGeometry, LumaRange, YuvFormat};
use super::frame::RgbaFrame;
use crate::constants::OPAQUE;
use crate::errors::ConvertError;

/// Converter configured once from the negotiated source format
///
/// When the destination is smaller than the source, the centered region is
/// kept; the offset is rounded down to even values so chroma blocks stay
/// aligned. The converter never scales up.
#[derive(Debug, Clone)]
pub struct YuvConverter {
    format: YuvFormat,
    source: FrameGeometry,
    dest: FrameGeometry,
    row_stride: usize,
    crop_x: usize,
    crop_y: usize,
}

impl YuvConverter {
    pub fn new(
        format: YuvFormat,
        source: FrameGeometry,
        dest: FrameGeometry,
    ) -> Result<Self, ConvertError> {
        if !dest.fits_within(&source) {
            return Err(ConvertError::CropOutOfRange {
                source: (source.width(), source.height()),
                dest: (dest.width(), dest.height()),
            });
        }

        let (crop_x, crop_y) = source.center_crop_offset(&dest);

        Ok(Self {
            format,
            source,
            dest,
            row_stride: format.layout.min_row_stride(source.width()),
            crop_x: crop_x as usize,
            crop_y: crop_y as usize,
        })
    }

    /// Use a driver-reported row stride (bytes per line, luma plane for 4:2:0)
    pub fn with_row_stride(mut self, row_stride: usize) -> Result<Self, ConvertError> {
        let minimum = self.format.layout.min_row_stride(self.source.width());
        if row_stride < minimum {
            return Err(ConvertError::StrideTooSmall {
                stride: row_stride,
                minimum,
            });
        }
        self.row_stride = row_stride;
        Ok(self)
    }

    pub fn format(&self) -> YuvFormat {
        self.format
    }

    pub fn source_geometry(&self) -> FrameGeometry {
        self.source
    }

    pub fn dest_geometry(&self) -> FrameGeometry {
        self.dest
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Top-left corner of the region copied from the source
    pub fn crop_offset(&self) -> (u32, u32) {
        (self.crop_x as u32, self.crop_y as u32)
    }

    /// Exact length every source sample must have
    pub fn expected_len(&self) -> usize {
        self.format.layout.source_len(&self.source, self.row_stride)
    }

    /// Convert one sample into a freshly allocated RGBA frame
    ///
    /// # Panics
    ///
    /// If `source` does not have exactly [`expected_len`](Self::expected_len)
    /// bytes. That means capture and conversion disagree about the format,
    /// and continuing would only produce garbage pixels.
    pub fn convert(&self, source: &[u8]) -> RgbaFrame {
        assert_eq!(
            source.len(),
            self.expected_len(),
            "sample length does not match negotiated {} {} (stride {})",
            self.format,
            self.source,
            self.row_stride
        );

        let mut out = Vec::with_capacity(self.dest.rgba_len());

        if let Some(offsets) = self.format.layout.packed_offsets() {
            self.convert_packed(source, offsets, &mut out);
        } else if let Some(planes) = self
            .format
            .layout
            .chroma_planes(self.row_stride, self.source.height() as usize)
        {
            self.convert_planar(source, planes, &mut out);
        }

        assert_eq!(out.len(), self.dest.rgba_len());
        RgbaFrame::from_converted(self.dest, out)
    }

    fn convert_packed(&self, source: &[u8], o: PackedOffsets, out: &mut Vec<u8>) {
        let range = self.format.luma_range;
        let width = self.dest.width() as usize;

        for row in 0..self.dest.height() as usize {
            let row_start = (row + self.crop_y) * self.row_stride + self.crop_x * 2;
            let src_row = &source[row_start..row_start + width * 2];

            // Even widths mean every group holds two complete pixels
            for group in src_row.chunks_exact(4) {
                let chroma = ChromaTerms::new(group[o.u], group[o.v]);
                chroma.push_pixel(out, luma(group[o.y0], range));
                chroma.push_pixel(out, luma(group[o.y1], range));
            }
        }
    }

    fn convert_planar(&self, source: &[u8], planes: ChromaPlanes, out: &mut Vec<u8>) {
        let range = self.format.luma_range;
        let width = self.dest.width() as usize;

        for row in 0..self.dest.height() as usize {
            let src_y = row + self.crop_y;
            let luma_start = src_y * self.row_stride + self.crop_x;
            let luma_row = &source[luma_start..luma_start + width];
            let chroma_row = (src_y / 2) * planes.stride;

            for (pair, lumas) in luma_row.chunks(2).enumerate() {
                let cx = (self.crop_x / 2 + pair) * planes.step;
                let chroma = ChromaTerms::new(
                    source[planes.u_offset + chroma_row + cx],
                    source[planes.v_offset + chroma_row + cx],
                );
                for &y in lumas {
                    chroma.push_pixel(out, luma(y, range));
                }
            }
        }
    }
}

/// Convert a sample with a one-off converter
///
/// # Panics
///
/// If `dest` does not fit inside `source_geometry` or the sample length does
/// not match the format. Both are caller contract violations.
pub fn convert(
    source: &[u8],
    format: YuvFormat,
    source_geometry: FrameGeometry,
    dest: FrameGeometry,
) -> RgbaFrame {
    let converter = YuvConverter::new(format, source_geometry, dest)
        .unwrap_or_else(|e| panic!("invalid conversion request: {}", e));
    converter.convert(source)
}

/// Convert a single YUV triple, mostly useful for checking the colour math
pub fn yuv_to_rgba(y: u8, u: u8, v: u8, range: LumaRange) -> [u8; 4] {
    let chroma = ChromaTerms::new(u, v);
    let mut out = Vec::with_capacity(4);
    chroma.push_pixel(&mut out, luma(y, range));
    [out[0], out[1], out[2], out[3]]
}

/// Chroma contributions shared by every pixel of a group
#[derive(Debug, Clone, Copy)]
struct ChromaTerms {
    r: f32,
    g: f32,
    b: f32,
}

impl ChromaTerms {
    #[inline]
    fn new(u: u8, v: u8) -> Self {
        let u = u as f32 - 128.0;
        let v = v as f32 - 128.0;
        Self {
            r: 1.402 * v,
            g: -0.344 * u - 0.714 * v,
            b: 1.772 * u,
        }
    }

    #[inline]
    fn push_pixel(&self, out: &mut Vec<u8>, y: f32) {
        out.extend_from_slice(&[
            saturate(y + self.r),
            saturate(y + self.g),
            saturate(y + self.b),
            OPAQUE,
        ]);
    }
}

#[inline]
fn luma(y: u8, range: LumaRange) -> f32 {
    match range {
        LumaRange::Full => y as f32,
        LumaRange::Studio => (y as f32 - 16.0) * 1.164,
    }
}

#[inline]
fn saturate(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::formats::ChromaLayout;

    fn geometry(width: u32, height: u32) -> FrameGeometry {
        FrameGeometry::new(width, height).unwrap()
    }

    /// Packed YUYV sample where every pixel has luma `y` and chroma (u, v)
    fn uniform_yuyv(width: u32, height: u32, y: u8, u: u8, v: u8) -> Vec<u8> {
        [y, u, y, v].repeat((width * height / 2) as usize)
    }

    /// I420 sample with luma(x, y) = f(x, y) and neutral chroma
    fn i420_with_luma(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        data.resize(data.len() + (width * height / 2) as usize, 128);
        data
    }

    #[test]
    fn test_yuv_to_rgba_gray() {
        assert_eq!(yuv_to_rgba(128, 128, 128, LumaRange::Full), [128, 128, 128, 255]);
        assert_eq!(yuv_to_rgba(0, 128, 128, LumaRange::Full), [0, 0, 0, 255]);
        assert_eq!(yuv_to_rgba(255, 128, 128, LumaRange::Full), [255, 255, 255, 255]);
    }

    #[test]
    fn test_studio_range_rescales_luma() {
        // Black and white reference levels of limited-range video
        assert_eq!(yuv_to_rgba(16, 128, 128, LumaRange::Studio), [0, 0, 0, 255]);
        let white = yuv_to_rgba(235, 128, 128, LumaRange::Studio);
        assert!(white[0] >= 254 && white[1] >= 254 && white[2] >= 254);
        // Footroom below 16 saturates instead of wrapping
        assert_eq!(yuv_to_rgba(0, 128, 128, LumaRange::Studio), [0, 0, 0, 255]);
    }

    #[test]
    fn test_saturation_clamps_instead_of_wrapping() {
        // R = 255 + 1.402 * 127 overflows
        let [r, g, _, a] = yuv_to_rgba(255, 128, 255, LumaRange::Full);
        assert_eq!(r, 255);
        assert_eq!(a, 255);
        assert!(g < 255);

        // G = 0 - 0.714 * 127 underflows
        let [r, g, b, _] = yuv_to_rgba(0, 128, 255, LumaRange::Full);
        assert_eq!(g, 0);
        assert_eq!(b, 0);
        assert_eq!(r, 178);

        // B = 255 + 1.772 * 127 overflows, R underflows with V = 0
        let [r, _, b, _] = yuv_to_rgba(255, 255, 0, LumaRange::Full);
        assert_eq!(b, 255);
        assert_eq!(r, 75);
    }

    #[test]
    fn test_packed_gray_frame() {
        let g = geometry(8, 4);
        let format = YuvFormat::new(ChromaLayout::Yuyv, LumaRange::Full);
        let converter = YuvConverter::new(format, g, g).unwrap();
        let frame = converter.convert(&uniform_yuyv(8, 4, 128, 128, 128));

        assert_eq!(frame.data().len(), 8 * 4 * 4);
        for px in frame.data().chunks_exact(4) {
            assert_eq!(px, [128, 128, 128, 255]);
        }
    }

    #[test]
    fn test_packed_orders_agree() {
        // Same two pixels encoded in each packed byte order
        let (y0, y1, u, v) = (60u8, 200u8, 90u8, 170u8);
        let g = geometry(2, 2);
        let samples = [
            (ChromaLayout::Yuyv, [y0, u, y1, v]),
            (ChromaLayout::Yvyu, [y0, v, y1, u]),
            (ChromaLayout::Uyvy, [u, y0, v, y1]),
            (ChromaLayout::Vyuy, [v, y0, u, y1]),
        ];

        let expected = [
            yuv_to_rgba(y0, u, v, LumaRange::Full),
            yuv_to_rgba(y1, u, v, LumaRange::Full),
        ]
        .concat();

        for (layout, group) in samples {
            let data = group.repeat(2);
            let frame = convert(&data, YuvFormat::new(layout, LumaRange::Full), g, g);
            assert_eq!(&frame.data()[..8], expected.as_slice(), "{layout}");
            assert_eq!(&frame.data()[8..], expected.as_slice(), "{layout}");
        }
    }

    #[test]
    fn test_planar_chroma_shared_by_2x2_block() {
        let g = geometry(4, 2);
        // Y plane: 8 samples; U plane: 2; V plane: 2
        let mut data = vec![100u8; 8];
        data.extend_from_slice(&[128, 200]); // U
        data.extend_from_slice(&[128, 60]); // V

        let frame = convert(&data, YuvFormat::new(ChromaLayout::I420, LumaRange::Full), g, g);
        let left = yuv_to_rgba(100, 128, 128, LumaRange::Full);
        let right = yuv_to_rgba(100, 200, 60, LumaRange::Full);

        for row in 0..2 {
            assert_eq!(frame.pixel(0, row), left);
            assert_eq!(frame.pixel(1, row), left);
            assert_eq!(frame.pixel(2, row), right);
            assert_eq!(frame.pixel(3, row), right);
        }
    }

    #[test]
    fn test_semi_planar_matches_planar() {
        let g = geometry(4, 4);
        let luma: Vec<u8> = (0..16).map(|i| (i * 15) as u8).collect();
        let us = [40u8, 80, 120, 160];
        let vs = [200u8, 170, 140, 110];

        let mut i420 = luma.clone();
        i420.extend_from_slice(&us);
        i420.extend_from_slice(&vs);

        let mut nv12 = luma.clone();
        let mut nv21 = luma;
        for i in 0..4 {
            nv12.extend_from_slice(&[us[i], vs[i]]);
            nv21.extend_from_slice(&[vs[i], us[i]]);
        }

        let full = |layout| YuvFormat::new(layout, LumaRange::Full);
        let reference = convert(&i420, full(ChromaLayout::I420), g, g);
        assert_eq!(convert(&nv12, full(ChromaLayout::Nv12), g, g), reference);
        assert_eq!(convert(&nv21, full(ChromaLayout::Nv21), g, g), reference);
    }

    #[test]
    fn test_center_crop_planar() {
        // Source luma encodes its own column so the crop origin is visible
        let source = geometry(16, 8);
        let dest = geometry(8, 4);
        let data = i420_with_luma(16, 8, |x, y| (x * 10 + y) as u8);
        let frame = convert(&data, YuvFormat::new(ChromaLayout::I420, LumaRange::Full), source, dest);

        // offset = ((16-8)/2, (8-4)/2) = (4, 2)
        assert_eq!(frame.pixel(0, 0)[0], 42);
        assert_eq!(frame.pixel(7, 3)[0], (11 * 10 + 5) as u8);
    }

    #[test]
    fn test_crop_offset_rounds_to_even() {
        let format = YuvFormat::with_default_range(ChromaLayout::Yuyv);
        let converter = YuvConverter::new(format, geometry(20, 10), geometry(14, 4)).unwrap();
        // (20-14)/2 = 3 -> 2, (10-4)/2 = 3 -> 2
        assert_eq!(converter.crop_offset(), (2, 2));
    }

    #[test]
    fn test_rejects_upscale() {
        let format = YuvFormat::with_default_range(ChromaLayout::Nv12);
        let err = YuvConverter::new(format, geometry(320, 240), geometry(640, 240)).unwrap_err();
        assert_eq!(
            err,
            ConvertError::CropOutOfRange {
                source: (320, 240),
                dest: (640, 240)
            }
        );
    }

    #[test]
    fn test_padded_row_stride() {
        let g = geometry(2, 2);
        let format = YuvFormat::new(ChromaLayout::Yuyv, LumaRange::Full);
        let converter = YuvConverter::new(format, g, g)
            .unwrap()
            .with_row_stride(8)
            .unwrap();
        assert_eq!(converter.expected_len(), 16);

        // Padding bytes (0xEE) must never reach the output
        let data = [
            50, 128, 50, 128, 0xEE, 0xEE, 0xEE, 0xEE, //
            90, 128, 90, 128, 0xEE, 0xEE, 0xEE, 0xEE,
        ];
        let frame = converter.convert(&data);
        assert_eq!(frame.pixel(1, 0), [50, 50, 50, 255]);
        assert_eq!(frame.pixel(0, 1), [90, 90, 90, 255]);
    }

    #[test]
    fn test_stride_below_minimum() {
        let g = geometry(4, 2);
        let format = YuvFormat::with_default_range(ChromaLayout::Uyvy);
        let err = YuvConverter::new(format, g, g)
            .unwrap()
            .with_row_stride(6)
            .unwrap_err();
        assert_eq!(err, ConvertError::StrideTooSmall { stride: 6, minimum: 8 });
    }

    #[test]
    #[should_panic(expected = "sample length")]
    fn test_length_mismatch_panics() {
        let g = geometry(4, 4);
        let converter = YuvConverter::new(YuvFormat::with_default_range(ChromaLayout::Yuyv), g, g)
            .unwrap();
        converter.convert(&[0u8; 31]);
    }

    #[test]
    #[should_panic(expected = "invalid conversion request")]
    fn test_free_convert_rejects_upscale() {
        let small = geometry(2, 2);
        let big = geometry(4, 4);
        convert(&[0u8; 8], YuvFormat::with_default_range(ChromaLayout::Yuyv), small, big);
    }
}
