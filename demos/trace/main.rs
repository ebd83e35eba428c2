//! Runs the wavefront over a few built-in shapes and prints the results.
//!
//! Usage:
//! ```text
//! cargo run --example trace                      # every shape
//! cargo run --example trace -- notch 1.5         # one shape, one distance
//! RUST_LOG=straight_skeleton=trace cargo run --example trace -- l_shape
//! ```

use straight_skeleton::geometry::Line;
use straight_skeleton::operations::{Buffer, Centerpoints, Offset, SkeletonGraph};
use straight_skeleton::Result;

fn shapes() -> Vec<(&'static str, Line)> {
    vec![
        (
            "square",
            Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
        ),
        (
            "l_shape",
            Line::ring(&[
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 5.0),
                (5.0, 5.0),
                (5.0, 10.0),
                (0.0, 10.0),
            ]),
        ),
        (
            "notch",
            Line::ring(&[
                (0.0, 0.0),
                (20.0, 0.0),
                (20.0, 10.0),
                (11.0, 10.0),
                (10.0, 2.0),
                (9.0, 10.0),
                (0.0, 10.0),
            ]),
        ),
        ("chain", Line::chain(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])),
    ]
}

fn print_lines(label: &str, lines: &[Line]) {
    println!("  {label}: {} line(s)", lines.len());
    for line in lines {
        let kind = if line.closed { "ring" } else { "chain" };
        let points: Vec<String> = line
            .points
            .iter()
            .map(|p| format!("({:.3}, {:.3})", p.x, p.y))
            .collect();
        println!("    {kind} [{}]", points.join(", "));
    }
}

fn run(name: &str, line: &Line, distance: f64) -> Result<()> {
    println!("{name}");
    if line.closed {
        print_lines("offset", &Offset::new(vec![line.clone()], distance).execute()?);
        let centres = Centerpoints::new(vec![line.clone()]).execute()?;
        for centre in centres {
            println!(
                "  centre ({:.3}, {:.3}) radius {:.3}",
                centre.point.x, centre.point.y, centre.radius
            );
        }
    }
    print_lines("buffer", &Buffer::new(vec![line.clone()], distance).execute()?);
    let arcs = SkeletonGraph::new(vec![line.clone()]).execute()?;
    println!("  skeleton: {} arc(s)", arcs.len());
    Ok(())
}

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for the engine.
    // Override with RUST_LOG (e.g. RUST_LOG=straight_skeleton=trace).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("straight_skeleton=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut args = std::env::args().skip(1);
    let selected = args.next();
    let distance = args.next().and_then(|d| d.parse().ok()).unwrap_or(1.0);

    for (name, line) in shapes() {
        if selected.as_deref().is_none_or(|s| s == name) {
            run(name, &line, distance)?;
        }
    }
    Ok(())
}
