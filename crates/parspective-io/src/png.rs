use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use png::{BitDepth, ColorType, Compression, Encoder};
use tiny_skia::Pixmap;

use crate::error::IoError;

/// Encode `pixmap` as an 8-bit RGBA PNG.
pub fn encode_png<W: Write>(pixmap: &Pixmap, writer: W) -> Result<(), IoError> {
    // tiny-skia stores premultiplied alpha; PNG wants it straight.
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut encoder = Encoder::new(writer, pixmap.width(), pixmap.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(Compression::Balanced);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}

pub fn write_png(pixmap: &Pixmap, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_buffered(pixmap, path, file)?;
    log::info!("Wrote {}x{} image to {}", pixmap.width(), pixmap.height(), path.display());
    Ok(())
}

fn write_buffered<W: Write>(pixmap: &Pixmap, path: &Path, inner: W) -> Result<(), IoError> {
    let mut writer = BufWriter::new(inner);
    encode_png(pixmap, &mut writer)?;
    writer.flush().map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use tiny_skia::{Color, Rect, Paint, Transform};

    fn decode(bytes: Vec<u8>) -> (png::OutputInfo, Vec<u8>) {
        let mut reader = png::Decoder::new(Cursor::new(bytes)).read_info().unwrap();
        let (width, height) = (reader.info().width, reader.info().height);
        let mut buf = vec![0; (width * height * 4) as usize];
        let info = reader.next_frame(&mut buf).unwrap();
        (info, buf)
    }

    #[test]
    fn test_encode_demultiplies() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(Color::from_rgba8(255, 0, 0, 255));
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 255, 128);
        pixmap.fill_rect(
            Rect::from_xywh(1.0, 0.0, 1.0, 1.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );
        let mut transparent = Pixmap::new(2, 1).unwrap();
        transparent.fill(Color::from_rgba8(0, 255, 0, 128));

        let mut bytes = Vec::new();
        encode_png(&transparent, &mut bytes).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let (info, buf) = decode(bytes);
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.color_type, ColorType::Rgba);
        assert_eq!(info.bit_depth, BitDepth::Eight);
        // Straight alpha: the colour survives the half transparency
        assert_eq!(buf[1], 255);
        assert_eq!(buf[3], 128);

        let mut bytes = Vec::new();
        encode_png(&pixmap, &mut bytes).unwrap();
        let (_, buf) = decode(bytes);
        assert_eq!(&buf[..4], &[255, 0, 0, 255]);
        assert_eq!(buf[7], 255);
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let pixmap = Pixmap::new(3, 2).unwrap();
        write_png(&pixmap, &path).unwrap();
        let (info, _) = decode(std::fs::read(&path).unwrap());
        assert_eq!((info.width, info.height), (3, 2));

        let missing = dir.path().join("no-such-dir").join("out.png");
        assert!(matches!(write_png(&pixmap, &missing), Err(IoError::Write { .. })));
    }

    /// Accepts nothing, like a full disk.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_buffered_write_failure_reported() {
        let pixmap = Pixmap::new(3, 2).unwrap();
        let result = write_buffered(&pixmap, Path::new("out.png"), FullDisk);
        assert!(matches!(result, Err(IoError::Write { .. }) | Err(IoError::Png(_))));
    }
}
