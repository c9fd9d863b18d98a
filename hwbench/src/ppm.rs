/*!
    Binary PPM (P6) snapshots of converted frames.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hwdec_pipeline::RgbFrame;

/**
    Write `frame` to `writer` as a binary PPM image.

    Frames are stored BGR; PPM wants RGB, so each pixel is swapped on the
    way out. Row padding is not written.
*/
pub fn write_ppm(frame: &RgbFrame, mut writer: impl Write) -> std::io::Result<()> {
    write!(writer, "P6\n{} {}\n255\n", frame.width, frame.height)?;
    let mut row = Vec::with_capacity(frame.width as usize * 3);
    for y in 0..frame.height {
        row.clear();
        for px in frame.row(y).chunks_exact(3) {
            row.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        writer.write_all(&row)?;
    }
    writer.flush()
}

pub fn save_ppm(frame: &RgbFrame, path: &Path) -> std::io::Result<()> {
    write_ppm(frame, BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_to_rgb_and_drops_padding() {
        let frame = RgbFrame {
            // two rows of one blue pixel, padded to 4 bytes
            data: vec![255, 0, 0, 9, 255, 0, 0, 9],
            width: 1,
            height: 2,
            stride: 4,
        };
        let mut out = Vec::new();
        write_ppm(&frame, &mut out).unwrap();

        let header = b"P6\n1 2\n255\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[0, 0, 255, 0, 0, 255]);
    }

    #[test]
    fn saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.ppm");
        let frame = RgbFrame {
            data: vec![1, 2, 3, 4, 5, 6],
            width: 2,
            height: 1,
            stride: 6,
        };
        save_ppm(&frame, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6\n2 1\n255\n"));
        assert!(bytes.ends_with(&[3, 2, 1, 6, 5, 4]));
    }
}
