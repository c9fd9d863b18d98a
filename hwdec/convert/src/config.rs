use hwdec_types::{PixelFormat, ScalingAlgorithm};

/**
    Configuration for a [`ColorConverter`](crate::ColorConverter).

    The destination layout is fixed; only the scaling algorithm is
    configurable. Source and destination geometry are always identical.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConverterConfig {
    pub algorithm: ScalingAlgorithm,
}

impl ConverterConfig {
    /// Pixel format every converted frame is written in.
    pub const DESTINATION: PixelFormat = PixelFormat::Bgr24;

    pub fn new(algorithm: ScalingAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Nearest-neighbour sampling, cheapest when geometry is unchanged.
    pub fn fast() -> Self {
        Self::new(ScalingAlgorithm::Point)
    }
}
