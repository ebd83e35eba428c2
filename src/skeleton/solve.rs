use crate::math::{Point2, Vector2, Vector2Ext};

/// Determinants smaller than this are treated as parallel, non-converging
/// lines.
const DETERMINANT_EPSILON: f64 = 1e-12;

/// Right-hand side `n·q − t` of an edge constraint.
///
/// An edge with unit normal `n` that passed through `q` at travel `t` lies,
/// at travel `τ`, on the line `n·p − τ = n·q − t`. Events are the points and
/// travels where three such constraints hold at once.
#[must_use]
pub(crate) fn offset(normal: &Vector2, point: &Point2, travel: f64) -> f64 {
    normal.dot(&point.coords) - travel
}

/// Solves for `p` and `τ` in
///
/// ```text
/// n0·p − τ = x0
/// n1·p − τ = x1
/// n2·p − τ = x2
/// ```
///
/// Returns `None` when the three lines never meet in a single point.
#[must_use]
pub(crate) fn solve(normals: [Vector2; 3], offsets: [f64; 3]) -> Option<(Point2, f64)> {
    let [n0, n1, n2] = normals;
    let [x0, x1, x2] = offsets;
    let a = n0 - n1;
    let b = n1 - n2;
    let det = a.wedge(&b);
    if det.abs() < DETERMINANT_EPSILON {
        return None;
    }
    let (r0, r1) = (x0 - x1, x1 - x2);
    let point = Point2::new((r0 * b.y - a.y * r1) / det, (a.x * r1 - r0 * b.x) / det);
    let travel = n0.dot(&point.coords) - x0;
    (point.x.is_finite() && point.y.is_finite() && travel.is_finite()).then_some((point, travel))
}

/// Solves for `p` and `τ` in
///
/// ```text
/// n0·p − τ = x0
/// n1·p − τ = x1
/// h × p    = x2
/// ```
///
/// The last row pins `p` to the trajectory of a node moving along `h`, used
/// when a node has a single normal (a chain terminus) or two equal ones.
#[must_use]
pub(crate) fn solve_asym(
    n0: Vector2,
    n1: Vector2,
    heading: Vector2,
    offsets: [f64; 3],
) -> Option<(Point2, f64)> {
    let [x0, x1, x2] = offsets;
    let a = n0 - n1;
    let c = heading.quarter_turn();
    let det = a.dot(&heading);
    if det.abs() < DETERMINANT_EPSILON {
        return None;
    }
    let r0 = x0 - x1;
    let point = Point2::new((r0 * c.y - a.y * x2) / det, (a.x * x2 - r0 * c.x) / det);
    let travel = n0.dot(&point.coords) - x0;
    (point.x.is_finite() && point.y.is_finite() && travel.is_finite()).then_some((point, travel))
}
