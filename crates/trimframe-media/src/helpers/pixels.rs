// crates/trimframe-media/src/helpers/pixels.rs
//
// Copies between strided ffmpeg RGBA frames and packed Surface buffers.
//
// ffmpeg frame rows may carry padding past the visible pixels (stride >
// width * 4). Surfaces are always packed, so every copy goes row by row.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::util::frame::video::Video as VideoFrame;

use crate::host::Surface;

/// Copy the visible pixels of an RGBA `frame` into `surface`.
/// Both must have the same dimensions.
pub fn frame_to_surface(frame: &VideoFrame, surface: &mut Surface) {
    let row_bytes = surface.row_bytes();
    let rows      = surface.height() as usize;
    let stride    = frame.stride(0);
    let src       = frame.data(0);
    let dst       = surface.pixels_mut();
    for row in 0..rows {
        dst[row * row_bytes..(row + 1) * row_bytes]
            .copy_from_slice(&src[row * stride..row * stride + row_bytes]);
    }
}

/// A new RGBA frame holding the pixels of `surface`.
pub fn surface_to_frame(surface: &Surface) -> VideoFrame {
    let mut frame = VideoFrame::new(Pixel::RGBA, surface.width(), surface.height());
    let row_bytes = surface.row_bytes();
    let stride    = frame.stride(0);
    let src       = surface.pixels();
    let dst       = frame.data_mut(0);
    for row in 0..surface.height() as usize {
        dst[row * stride..row * stride + row_bytes]
            .copy_from_slice(&src[row * row_bytes..(row + 1) * row_bytes]);
    }
    frame
}
