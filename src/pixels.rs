//! CPU-side pixel unpacking applied before texture uploads.
//!
//! WebGL semantics let the application request a vertical flip and alpha
//! premultiplication at upload time; GLES 2.0 has neither, so both are applied
//! here, on a copy of the caller's buffer, before the data reaches the driver.

use crate::gles_ffi as gl;
use crate::gles_ffi::{GLenum, GLint};

/// Pixel-store state of one context.
#[derive(Debug, Clone)]
pub(crate) struct UnpackState {
    pub flip_y: bool,
    pub premultiply_alpha: bool,
    pub colorspace_conversion: GLint,
    /// Row alignment for uploads (`GL_UNPACK_ALIGNMENT`).
    pub alignment: GLint,
    /// Row alignment for readbacks (`GL_PACK_ALIGNMENT`); readback buffer
    /// sizing must use this, not the upload alignment.
    pub pack_alignment: GLint,
}

impl Default for UnpackState {
    fn default() -> Self {
        Self {
            flip_y: false,
            premultiply_alpha: false,
            colorspace_conversion: gl::GL_BROWSER_DEFAULT_WEBGL as GLint,
            alignment: 4,
            pack_alignment: 4,
        }
    }
}

impl UnpackState {
    /// The transform is only worth a copy when one of the flags is set.
    pub fn is_active(&self) -> bool {
        self.flip_y || self.premultiply_alpha
    }
}

/// Bytes per pixel for an upload of the given component type and format.
///
/// All 16-bit packed types occupy two bytes regardless of format.
pub(crate) fn pixel_size(type_: GLenum, format: GLenum) -> usize {
    match type_ {
        gl::GL_UNSIGNED_BYTE | gl::GL_FLOAT => {
            let component = if type_ == gl::GL_FLOAT { 4 } else { 1 };
            let channels = match format {
                gl::GL_LUMINANCE_ALPHA => 2,
                gl::GL_RGB => 3,
                gl::GL_RGBA => 4,
                // GL_ALPHA and GL_LUMINANCE carry a single channel.
                _ => 1,
            };
            component * channels
        }
        _ => 2,
    }
}

/// Bytes per row, padded up to the unpack alignment.
pub(crate) fn row_stride(pixel_size: usize, width: usize, alignment: usize) -> usize {
    let stride = pixel_size * width;
    match alignment {
        0 | 1 => stride,
        a => stride.div_ceil(a) * a,
    }
}

/// Size in bytes of one packed image.
pub(crate) fn image_size(
    type_: GLenum,
    format: GLenum,
    width: usize,
    height: usize,
    alignment: GLint,
) -> usize {
    row_stride(pixel_size(type_, format), width, alignment.max(1) as usize) * height
}

/// Produce a freshly allocated copy of `src` with the configured row flip and
/// alpha premultiplication applied. `src` must hold at least one packed image
/// (`image_size` bytes); the caller's buffer is never mutated.
pub(crate) fn unpack(
    state: &UnpackState,
    type_: GLenum,
    format: GLenum,
    width: usize,
    height: usize,
    src: &[u8],
) -> Vec<u8> {
    let px = pixel_size(type_, format);
    let stride = row_stride(px, width, state.alignment.max(1) as usize);
    let size = stride * height;
    debug_assert!(src.len() >= size);

    let mut out = vec![0u8; size];
    if state.flip_y {
        for (src_row, dst_row) in (0..height).zip((0..height).rev()) {
            let row = &src[src_row * stride..][..width * px];
            out[dst_row * stride..][..width * px].copy_from_slice(row);
        }
    } else {
        out.copy_from_slice(&src[..size]);
    }

    // Premultiplication only makes sense for formats carrying both color and
    // alpha. Float data is sized above but never premultiplied.
    if state.premultiply_alpha && (format == gl::GL_LUMINANCE_ALPHA || format == gl::GL_RGBA) {
        for row in 0..height {
            for col in 0..width {
                let pixel = &mut out[row * stride + col * px..][..px];
                if format == gl::GL_LUMINANCE_ALPHA {
                    if type_ == gl::GL_UNSIGNED_BYTE {
                        pixel[0] = (f32::from(pixel[0]) * f32::from(pixel[1]) / 255.0) as u8;
                    }
                } else {
                    premultiply_rgba(type_, pixel);
                }
            }
        }
    }

    out
}

fn premultiply_rgba(type_: GLenum, pixel: &mut [u8]) {
    match type_ {
        gl::GL_UNSIGNED_BYTE => {
            let scale = f32::from(pixel[3]) / 255.0;
            pixel[0] = (f32::from(pixel[0]) * scale) as u8;
            pixel[1] = (f32::from(pixel[1]) * scale) as u8;
            pixel[2] = (f32::from(pixel[2]) * scale) as u8;
        }
        gl::GL_UNSIGNED_SHORT_4_4_4_4 => {
            let r = pixel[0] & 0x0f;
            let g = pixel[0] >> 4;
            let b = pixel[1] & 0x0f;
            let a = pixel[1] >> 4;

            let scale = f32::from(a) / 15.0;
            let r = (f32::from(r) * scale) as u8;
            let g = (f32::from(g) * scale) as u8;
            let b = (f32::from(b) * scale) as u8;

            pixel[0] = r + (g << 4);
            pixel[1] = b + (a << 4);
        }
        gl::GL_UNSIGNED_SHORT_5_5_5_1 => {
            // Long-standing quirk: a cleared alpha bit forces the pixel to
            // 0x0001 instead of premultiplying the color bits to zero.
            // Preserved because existing consumers depend on the output.
            if pixel[0] & 1 == 0 {
                pixel[0] = 1;
                pixel[1] = 0;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> UnpackState {
        UnpackState {
            alignment: 1,
            ..UnpackState::default()
        }
    }

    #[test]
    fn identity_copy_when_no_flags_set() {
        let src: Vec<u8> = (0..4 * 3 * 2).map(|i| i as u8).collect();
        let out = unpack(&plain(), gl::GL_UNSIGNED_BYTE, gl::GL_RGBA, 3, 2, &src);
        assert_eq!(out, src);
    }

    #[test]
    fn flip_reverses_row_order() {
        let state = UnpackState {
            flip_y: true,
            ..plain()
        };
        // 1x3 RGBA image, one recognizable byte pattern per row.
        let src = [
            1, 1, 1, 1, //
            2, 2, 2, 2, //
            3, 3, 3, 3,
        ];
        let out = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_RGBA, 1, 3, &src);
        assert_eq!(out, [3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1]);
    }

    #[test]
    fn double_flip_restores_row_order() {
        let state = UnpackState {
            flip_y: true,
            ..plain()
        };
        let src: Vec<u8> = (0..2 * 4 * 5).map(|i| i as u8).collect();
        let once = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_RGBA, 2, 5, &src);
        let twice = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_RGBA, 2, 5, &once);
        assert_eq!(twice, src);
    }

    #[test]
    fn premultiply_rgba_u8() {
        let state = UnpackState {
            premultiply_alpha: true,
            ..plain()
        };
        let src = [255, 255, 255, 128];
        let out = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_RGBA, 1, 1, &src);
        assert_eq!(out, [128, 128, 128, 128]);
    }

    #[test]
    fn premultiply_skips_opaque_formats() {
        let state = UnpackState {
            premultiply_alpha: true,
            ..plain()
        };
        let src = [10, 20, 30];
        let out = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_RGB, 1, 1, &src);
        assert_eq!(out, src);
    }

    #[test]
    fn premultiply_luminance_alpha() {
        let state = UnpackState {
            premultiply_alpha: true,
            ..plain()
        };
        let src = [200, 51]; // luminance 200, alpha 51 (20%)
        let out = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_LUMINANCE_ALPHA, 1, 1, &src);
        assert_eq!(out, [40, 51]);
    }

    #[test]
    fn premultiply_4444_scales_nibbles() {
        let state = UnpackState {
            premultiply_alpha: true,
            ..plain()
        };
        // r=15, g=15 in byte 0; b=15, a=7 in byte 1 (scale 7/15).
        let src = [0xff, 0x7f];
        let out = unpack(
            &state,
            gl::GL_UNSIGNED_SHORT_4_4_4_4,
            gl::GL_RGBA,
            1,
            1,
            &src,
        );
        assert_eq!(out, [0x77, 0x77]);
    }

    #[test]
    fn premultiply_5551_zero_alpha_sentinel() {
        let state = UnpackState {
            premultiply_alpha: true,
            ..plain()
        };
        let src = [0xfe, 0xff]; // alpha bit clear
        let out = unpack(
            &state,
            gl::GL_UNSIGNED_SHORT_5_5_5_1,
            gl::GL_RGBA,
            1,
            1,
            &src,
        );
        assert_eq!(out, [1, 0]);

        let src = [0xff, 0xff]; // alpha bit set, untouched
        let out = unpack(
            &state,
            gl::GL_UNSIGNED_SHORT_5_5_5_1,
            gl::GL_RGBA,
            1,
            1,
            &src,
        );
        assert_eq!(out, [0xff, 0xff]);
    }

    #[test]
    fn float_rgba_is_sized_but_not_premultiplied() {
        let state = UnpackState {
            premultiply_alpha: true,
            ..plain()
        };
        let src: Vec<u8> = (0..16).collect();
        let out = unpack(&state, gl::GL_FLOAT, gl::GL_RGBA, 1, 1, &src);
        assert_eq!(out, src);
    }

    #[test]
    fn rows_are_padded_to_alignment() {
        // 3-byte RGB rows padded to 4 under the default alignment.
        assert_eq!(row_stride(3, 1, 4), 4);
        assert_eq!(row_stride(3, 2, 4), 8);
        assert_eq!(row_stride(4, 2, 4), 8);
        assert_eq!(image_size(gl::GL_UNSIGNED_BYTE, gl::GL_RGB, 1, 2, 4), 8);

        let state = UnpackState {
            flip_y: true,
            alignment: 4,
            ..UnpackState::default()
        };
        // Two RGB rows of width 1, each padded to 4 bytes.
        let src = [10, 11, 12, 0, 20, 21, 22, 0];
        let out = unpack(&state, gl::GL_UNSIGNED_BYTE, gl::GL_RGB, 1, 2, &src);
        // Only width * pixel_size bytes per row are moved; padding stays zero.
        assert_eq!(out, [20, 21, 22, 0, 10, 11, 12, 0]);
    }

    #[test]
    fn readback_rows_follow_the_pack_alignment() {
        // Width-1 RGB rows: 3 payload bytes, padded per alignment. At
        // alignment 8 the driver packs each row to 8 bytes and writes 11
        // bytes for two rows, so the buffer requirement must cover 16, not
        // the 8 the default alignment would suggest.
        assert_eq!(row_stride(3, 1, 8), 8);
        assert_eq!(image_size(gl::GL_UNSIGNED_BYTE, gl::GL_RGB, 1, 2, 8), 16);

        // Tighter alignments shrink the requirement instead of rejecting
        // correctly sized buffers.
        assert_eq!(image_size(gl::GL_UNSIGNED_BYTE, gl::GL_RGB, 1, 2, 1), 6);
        assert_eq!(image_size(gl::GL_UNSIGNED_BYTE, gl::GL_RGB, 1, 2, 2), 8);

        assert_eq!(UnpackState::default().pack_alignment, 4);
    }

    #[test]
    fn packed_types_are_two_bytes_per_pixel() {
        assert_eq!(pixel_size(gl::GL_UNSIGNED_SHORT_5_6_5, gl::GL_RGB), 2);
        assert_eq!(pixel_size(gl::GL_UNSIGNED_SHORT_4_4_4_4, gl::GL_RGBA), 2);
        assert_eq!(pixel_size(gl::GL_UNSIGNED_BYTE, gl::GL_RGBA), 4);
        assert_eq!(pixel_size(gl::GL_FLOAT, gl::GL_RGBA), 16);
        assert_eq!(pixel_size(gl::GL_UNSIGNED_BYTE, gl::GL_LUMINANCE), 1);
    }
}
