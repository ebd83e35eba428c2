use crate::error::{OperationError, Result};
use crate::geometry::Line;
use crate::math::TOLERANCE;
use crate::skeleton::{Options, Wavefront};

/// Removes ring features narrower than twice the margin.
///
/// Insets by the margin, outsets by twice the margin without splitting,
/// then insets by the margin again. Narrow spikes vanish in the first pass
/// and narrow notches fill in the second; what survives has its corners
/// rounded. A negative margin fills notches first. Chains are returned
/// unchanged.
#[derive(Debug, Clone)]
pub struct Smooth {
    lines: Vec<Line>,
    margin: f64,
    cutoff_angle: Option<f64>,
}

impl Smooth {
    /// Creates a new smoothing operation.
    #[must_use]
    pub fn new(lines: Vec<Line>, margin: f64) -> Self {
        Self {
            lines,
            margin,
            cutoff_angle: None,
        }
    }

    /// Chamfers corners sharper than `degrees` in the outset pass.
    #[must_use]
    pub fn cutoff_angle(mut self, degrees: Option<f64>) -> Self {
        self.cutoff_angle = degrees;
        self
    }

    /// Executes the smoothing.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOption` for a non-finite margin or an
    /// invalid cutoff angle, and `GeometryError::NonFinite` for non-finite
    /// input.
    pub fn execute(&self) -> Result<Vec<Line>> {
        if !self.margin.is_finite() {
            return Err(OperationError::InvalidOption {
                option: "margin",
                value: self.margin,
            }
            .into());
        }
        let wavefront = Wavefront::new(self.lines.iter().cloned())?;
        let (rings, mut chains): (Vec<Line>, Vec<Line>) =
            wavefront.lines().iter().cloned().partition(|line| line.closed);
        if self.margin.abs() < TOLERANCE || rings.is_empty() {
            return Ok(wavefront.lines().to_vec());
        }

        let margin = self.margin;
        let inset = Options::default();
        let outset = Options::default()
            .with_splits(false)
            .with_cutoff_angle(self.cutoff_angle);

        let mut result = rings;
        for (travel, options) in [(margin, &inset), (-2.0 * margin, &outset), (margin, &inset)] {
            let options = options.clone().with_limit(travel);
            result = Wavefront::new(result)?.progress(&options, |_, _| {})?.readout();
        }
        result.append(&mut chains);
        Ok(result)
    }
}
