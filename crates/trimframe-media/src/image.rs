// crates/trimframe-media/src/image.rs
//
// Lossless thumbnail encoding. PNG needs no codec library, so it works on
// any host; the lossy JPEG path lives in native::jpeg.

use trimframe_core::{MediaError, Result};

use crate::host::{ImageEncoder, Surface};

/// 8-bit RGBA PNG writer.
#[derive(Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn mime(&self) -> &'static str {
        "image/png"
    }

    fn encode(&mut self, surface: &Surface) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(surface.pixels().len() / 2);
        let mut encoder = png::Encoder::new(&mut out, surface.width(), surface.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| MediaError::Encode(format!("png header: {e}")))?;
        writer
            .write_image_data(surface.pixels())
            .map_err(|e| MediaError::Encode(format!("png data: {e}")))?;
        writer
            .finish()
            .map_err(|e| MediaError::Encode(format!("png finish: {e}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_decodes_back_to_the_surface() {
        let mut surface = Surface::new(4, 3);
        for (i, px) in surface.pixels_mut().chunks_mut(4).enumerate() {
            px.copy_from_slice(&[i as u8 * 20, 255 - i as u8, 7, 255]);
        }
        let bytes = PngEncoder.encode(&surface).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (4, 3));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(&buf[..info.buffer_size()], surface.pixels());
    }
}
