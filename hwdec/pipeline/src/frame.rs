/**
    An owned frame of packed BGR24 pixels.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct RgbFrame {
    /// Pixel data, `stride * height` bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub stride: usize,
}

impl RgbFrame {
    /**
        Returns the pixels of row `y`, without any row padding.

        # Panics

        Panics if `y` is not less than the frame height.
    */
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * 3]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl std::fmt::Debug for RgbFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(RgbFrame: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_skip_padding() {
        let frame = RgbFrame {
            data: (0..2 * 8).map(|i| i as u8).collect(),
            width: 2,
            height: 2,
            stride: 8,
        };
        assert_eq!(frame.row(0), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(frame.row(1), &[8, 9, 10, 11, 12, 13]);
    }

    #[test]
    fn debug_omits_pixels() {
        let frame = RgbFrame {
            data: vec![0; 12],
            width: 2,
            height: 2,
            stride: 6,
        };
        assert_eq!(
            format!("{frame:?}"),
            "RgbFrame { width: 2, height: 2, stride: 6, bytes: 12 }"
        );
    }
}
