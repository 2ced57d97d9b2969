use geopath::math::{Point3, Tolerance};
use geopath::path::Path;
use geopath::segment::{Bezier3Segment, Segment};
use geopath::GeopathError;

fn main() -> Result<(), GeopathError> {
    // Default: WARN for everything, INFO for geopath.
    // Override with RUST_LOG (e.g. RUST_LOG=geopath=trace).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("geopath=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let tol = Tolerance::metric();
    // M 0,100 C 0,0 80,0 100,90
    let curve = Bezier3Segment::new(
        Point3::new(0.0, 100.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(80.0, 0.0, 0.0),
        Point3::new(100.0, 90.0, 0.0),
        tol,
    )?;
    let path = Path::from_segments(vec![curve.into()], tol);
    println!("input:  {}", path.svg_code(2));

    let fitted = path.cnc_friendly(0.05)?;
    let arcs = fitted.segments().iter().filter(|s| matches!(s, Segment::Arc(_))).count();
    println!(
        "fitted: {} segments ({} arcs, {} lines)",
        fitted.len(),
        arcs,
        fitted.len() - arcs
    );
    println!("{}", fitted.svg_code(3));
    Ok(())
}
