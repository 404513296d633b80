//! Response-shape partitioning for the `getParameter` entry point.

use crate::gles_ffi as gl;
use crate::gles_ffi::GLenum;

/// A dynamically shaped `getParameter` result.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Int2([i32; 2]),
    Int4([i32; 4]),
    Float2([f32; 2]),
    Float4([f32; 4]),
    Bool4([bool; 4]),
}

/// How a parameter name must be queried and shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamClass {
    /// Served from context state, never from the driver.
    UnpackFlipY,
    UnpackPremultiplyAlpha,
    UnpackColorspaceConversion,
    Bool,
    Float,
    Str,
    Int2,
    Int4,
    Float2,
    Float4,
    Bool4,
    /// Every other recognized name degrades to a single integer query.
    Int,
}

pub(crate) fn classify(pname: GLenum) -> ParamClass {
    match pname {
        gl::GL_UNPACK_FLIP_Y_WEBGL => ParamClass::UnpackFlipY,
        gl::GL_UNPACK_PREMULTIPLY_ALPHA_WEBGL => ParamClass::UnpackPremultiplyAlpha,
        gl::GL_UNPACK_COLORSPACE_CONVERSION_WEBGL => ParamClass::UnpackColorspaceConversion,

        gl::GL_BLEND
        | gl::GL_CULL_FACE
        | gl::GL_DEPTH_TEST
        | gl::GL_DEPTH_WRITEMASK
        | gl::GL_DITHER
        | gl::GL_POLYGON_OFFSET_FILL
        | gl::GL_SAMPLE_COVERAGE_INVERT
        | gl::GL_SCISSOR_TEST
        | gl::GL_STENCIL_TEST => ParamClass::Bool,

        gl::GL_DEPTH_CLEAR_VALUE
        | gl::GL_LINE_WIDTH
        | gl::GL_POLYGON_OFFSET_FACTOR
        | gl::GL_POLYGON_OFFSET_UNITS
        | gl::GL_SAMPLE_COVERAGE_VALUE
        | gl::GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT => ParamClass::Float,

        gl::GL_RENDERER
        | gl::GL_SHADING_LANGUAGE_VERSION
        | gl::GL_VENDOR
        | gl::GL_VERSION
        | gl::GL_EXTENSIONS => ParamClass::Str,

        gl::GL_MAX_VIEWPORT_DIMS => ParamClass::Int2,

        gl::GL_SCISSOR_BOX | gl::GL_VIEWPORT => ParamClass::Int4,

        gl::GL_ALIASED_LINE_WIDTH_RANGE | gl::GL_ALIASED_POINT_SIZE_RANGE | gl::GL_DEPTH_RANGE => {
            ParamClass::Float2
        }

        gl::GL_BLEND_COLOR | gl::GL_COLOR_CLEAR_VALUE => ParamClass::Float4,

        gl::GL_COLOR_WRITEMASK => ParamClass::Bool4,

        _ => ParamClass::Int,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_parameters_never_reach_the_driver() {
        assert_eq!(classify(gl::GL_UNPACK_FLIP_Y_WEBGL), ParamClass::UnpackFlipY);
        assert_eq!(
            classify(gl::GL_UNPACK_PREMULTIPLY_ALPHA_WEBGL),
            ParamClass::UnpackPremultiplyAlpha
        );
        assert_eq!(
            classify(gl::GL_UNPACK_COLORSPACE_CONVERSION_WEBGL),
            ParamClass::UnpackColorspaceConversion
        );
    }

    #[test]
    fn shapes_match_the_queried_state() {
        assert_eq!(classify(gl::GL_DEPTH_TEST), ParamClass::Bool);
        assert_eq!(classify(gl::GL_LINE_WIDTH), ParamClass::Float);
        assert_eq!(classify(gl::GL_VERSION), ParamClass::Str);
        assert_eq!(classify(gl::GL_MAX_VIEWPORT_DIMS), ParamClass::Int2);
        assert_eq!(classify(gl::GL_VIEWPORT), ParamClass::Int4);
        assert_eq!(classify(gl::GL_SCISSOR_BOX), ParamClass::Int4);
        assert_eq!(classify(gl::GL_DEPTH_RANGE), ParamClass::Float2);
        assert_eq!(classify(gl::GL_COLOR_CLEAR_VALUE), ParamClass::Float4);
        assert_eq!(classify(gl::GL_COLOR_WRITEMASK), ParamClass::Bool4);
    }

    #[test]
    fn unrecognized_names_fall_back_to_integer() {
        assert_eq!(classify(0x8B4D), ParamClass::Int); // MAX_COMBINED_TEXTURE_IMAGE_UNITS
        assert_eq!(classify(0xFFFF_FFFF), ParamClass::Int);
    }
}
