use tracing::debug;

use super::nodes::{Change, Nodes};
use super::options::Options;
use crate::error::Result;
use crate::geometry::Line;

/// Validated input to a wavefront run.
///
/// Every edge moves at unit speed along its normal and the nodes where two
/// edges meet slide along the bisector. The front changes shape at discrete
/// events: an edge shrinking to nothing (collapse) or a node running into an
/// edge on the far side of the front (split).
///
/// Holds sanitised rings and chains; runs borrow it, so one wavefront can be
/// progressed any number of times with different options.
#[derive(Debug, Clone)]
pub struct Wavefront {
    lines: Vec<Line>,
}

impl Wavefront {
    /// Creates a wavefront from rings and chains.
    ///
    /// Consecutive duplicate points are dropped and lines left with fewer
    /// than two distinct points are discarded.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` if any coordinate is NaN or
    /// infinite.
    pub fn new(lines: impl IntoIterator<Item = Line>) -> Result<Self> {
        let mut kept = Vec::new();
        for line in lines {
            line.validate()?;
            kept.extend(line.sanitized());
        }
        Ok(Self { lines: kept })
    }

    /// The sanitised input lines.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Moves the front until the travel limit, or until every event has
    /// been processed when there is none.
    ///
    /// `callback` sees every node replacement as it happens, with the engine
    /// in a consistent state.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOption` if `options` fail validation.
    pub fn progress<F>(&self, options: &Options, mut callback: F) -> Result<Skeleton>
    where
        F: FnMut(&Nodes, Change),
    {
        options.validate()?;
        let reversed = options.limit.is_some_and(|limit| limit < 0.0);
        let limit = options.limit.map(f64::abs);

        let mut nodes = Nodes::build(&self.lines, reversed, limit, options.splits);
        nodes.join_coincident(&mut callback);
        nodes.round_corners(options.rounding_angle, options.cutoff_angle);
        nodes.prepare();
        let seeded = nodes.queued();
        nodes.drain(options.interval, &mut callback);

        debug!(
            lines = self.lines.len(),
            nodes = nodes.active().count(),
            seeded,
            processed = nodes.processed,
            stale = nodes.stale,
            travel = nodes.travel(),
            "wavefront progressed"
        );
        Ok(Skeleton { nodes, limit })
    }
}

/// The state of a finished run.
#[derive(Debug)]
pub struct Skeleton {
    nodes: Nodes,
    limit: Option<f64>,
}

impl Skeleton {
    /// Reads the front out at the travel limit, or, for an unlimited run,
    /// with every remaining node where it was created.
    #[must_use]
    pub fn readout(&self) -> Vec<Line> {
        match self.limit {
            Some(limit) => self.nodes.readout_at(limit),
            None => self.nodes.readout_as_created(),
        }
    }

    /// Reads the front out at an unsigned travel distance.
    #[must_use]
    pub fn readout_at(&self, travel: f64) -> Vec<Line> {
        self.nodes.readout_at(travel)
    }

    /// Travel of the last applied event.
    #[must_use]
    pub fn travel(&self) -> f64 {
        self.nodes.travel()
    }

    /// The engine, for inspecting nodes after the run.
    #[must_use]
    pub fn nodes(&self) -> &Nodes {
        &self.nodes
    }
}
