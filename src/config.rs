/// Numeric settings shared by the transformations. Passed explicitly to
/// every operation that needs it; nothing reads process-wide state.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Standard deviation of the gaussian kernel, in cells.
    pub gaussian_sigma: f64,
    /// Kernel radius expressed in standard deviations.
    pub gaussian_truncate: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            gaussian_sigma: 1.0,
            gaussian_truncate: 4.0,
        }
    }
}

impl TransformConfig {
    /// Radius in cells of the gaussian kernel built from this config.
    pub fn gaussian_radius(&self) -> usize {
        (self.gaussian_truncate * self.gaussian_sigma + 0.5).floor().max(0.0) as usize
    }
}
