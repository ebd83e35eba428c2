use crate::error::{OperationError, Result};

/// Default maximum turn, in degrees, between consecutive normals of a
/// rounded reflex corner.
pub const DEFAULT_ROUNDING_ANGLE: f64 = 15.0;

/// Parameters of a single wavefront run.
///
/// `limit` carries the direction: positive travel moves the front to the
/// left of each line (inward for counter-clockwise rings), negative travel
/// to the right. Without a limit the front moves left until every event has
/// been processed.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Reflex corners turning more than this many degrees are rounded with
    /// a fan of normals; `None` keeps mitred corners.
    pub rounding_angle: Option<f64>,
    /// Reflex corners turning more than this many degrees are chamfered
    /// with a single segment, taking precedence over rounding.
    pub cutoff_angle: Option<f64>,
    /// Travel at which the run stops.
    pub limit: Option<f64>,
    /// Whether reflex and terminal nodes may split the front.
    pub splits: bool,
    /// Resample the front every time travel crosses a multiple of this.
    pub interval: Option<f64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rounding_angle: Some(DEFAULT_ROUNDING_ANGLE),
            cutoff_angle: None,
            limit: None,
            splits: true,
            interval: None,
        }
    }
}

impl Options {
    /// Sets the signed travel limit.
    #[must_use]
    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets (or with `None`, disables) reflex corner rounding.
    #[must_use]
    pub fn with_rounding_angle(mut self, degrees: Option<f64>) -> Self {
        self.rounding_angle = degrees;
        self
    }

    /// Sets the chamfer cutoff angle.
    #[must_use]
    pub fn with_cutoff_angle(mut self, degrees: Option<f64>) -> Self {
        self.cutoff_angle = degrees;
        self
    }

    /// Enables or disables split events.
    #[must_use]
    pub fn with_splits(mut self, splits: bool) -> Self {
        self.splits = splits;
        self
    }

    /// Sets the resampling interval.
    #[must_use]
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Checks every option is in range.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOption` for a non-finite limit, an
    /// angle outside `(0, 180]` or a non-positive interval.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit.filter(|limit| !limit.is_finite()) {
            return Err(invalid("limit", limit));
        }
        for (option, angle) in [
            ("rounding_angle", self.rounding_angle),
            ("cutoff_angle", self.cutoff_angle),
        ] {
            if let Some(angle) = angle.filter(|a| !(*a > 0.0 && *a <= 180.0)) {
                return Err(invalid(option, angle));
            }
        }
        if let Some(interval) = self.interval.filter(|i| !(i.is_finite() && *i > 0.0)) {
            return Err(invalid("interval", interval));
        }
        Ok(())
    }
}

fn invalid(option: &'static str, value: f64) -> crate::error::Error {
    OperationError::InvalidOption { option, value }.into()
}
