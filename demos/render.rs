//! Builds the path program of a curve polygon with a compound outer ring and
//! prints it, then replays it as SVG path data.
//!
//! Run with `RUST_LOG=curvegeom=debug` to see the builder's decisions.

use curvegeom::geometry::{CircularString, CompoundCurve, Coordinate, CurvePolygon, Layout, LineString};
use curvegeom::math::{CircularArc, Point2};
use curvegeom::render::{
    build_instructions, replay, BuilderParams, Color, Feature, FeatureId, FeatureStore, FillStyle, PathSink, Style,
    StrokeStyle,
};
use curvegeom::Result;
use tracing::{info, warn};

/// Collects SVG path data, one `<path>` per geometry.
#[derive(Default)]
struct SvgSink {
    paths: Vec<String>,
    current: String,
    pen: Option<Point2>,
    subpath_start: Option<Point2>,
}

impl SvgSink {
    fn arc_command(&mut self, from: Point2, through: Point2, to: Point2) {
        let arc = CircularArc::new(from, through, to);
        let Ok(center) = arc.center_of_circle() else {
            warn!("arc without center, drawing a line");
            self.current.push_str(&format!("L {} {} ", to.x, to.y));
            return;
        };
        let Ok(angles) = arc.angles(&center) else {
            return;
        };
        let radius = arc.radius(&center);
        let sweep = CircularArc::sweep(&angles, arc.clockwise(&angles));
        let large = u8::from(sweep.abs() > std::f64::consts::PI);
        let positive = u8::from(sweep > 0.0);
        self.current.push_str(&format!("A {radius} {radius} 0 {large} {positive} {} {} ", to.x, to.y));
    }
}

impl PathSink for SvgSink {
    fn end_geometry(&mut self, _feature: FeatureId) {
        if !self.current.is_empty() {
            self.paths.push(std::mem::take(&mut self.current).trim_end().to_owned());
        }
    }

    fn begin_path(&mut self) {
        self.pen = None;
    }

    fn move_to(&mut self, to: Point2) {
        self.current.push_str(&format!("M {} {} ", to.x, to.y));
        self.pen = Some(to);
        self.subpath_start = Some(to);
    }

    fn arc_through_point(&mut self, through: Point2, to: Point2, center: Point2) {
        let Some(from) = self.pen else {
            return;
        };
        if from == to {
            // SVG cannot draw a full circle in one arc command.
            let r = (from - center).norm();
            self.current.push_str(&format!(
                "A {r} {r} 0 0 1 {} {} A {r} {r} 0 0 1 {} {} ",
                through.x, through.y, to.x, to.y
            ));
        } else {
            self.arc_command(from, through, to);
        }
        self.pen = Some(to);
    }

    fn line_to(&mut self, to: Point2) {
        self.current.push_str(&format!("L {} {} ", to.x, to.y));
        self.pen = Some(to);
    }

    fn close_path(&mut self) {
        self.current.push_str("Z ");
        self.pen = self.subpath_start;
    }

    fn fill(&mut self) {}

    fn stroke(&mut self) {}
}

fn xy(points: &[(f64, f64)]) -> Vec<Coordinate> {
    points.iter().map(|&(x, y)| Coordinate::xy(x, y)).collect()
}

/// CURVEPOLYGON(COMPOUNDCURVE(CIRCULARSTRING(1 2, 2 4, 4 2), (4 2, 5 4, 4 5),
/// CIRCULARSTRING(4 5, 3 6, 4 8), (4 8, 8 4, 8 -2, 2 -2, 1 2)),
/// CIRCULARSTRING(1.5 2.5, 2 3, 3 1.5, 2 1, 1.5 2.5),
/// CIRCULARSTRING(2 0, 3 0, 2 0), (7 1, 6 2, 5 1, 7 1))
fn sample_polygon() -> Result<CurvePolygon> {
    let outer = CompoundCurve::new(vec![
        CircularString::new(&xy(&[(1.0, 2.0), (2.0, 4.0), (4.0, 2.0)]), Layout::Xy)?.into(),
        LineString::new(&xy(&[(4.0, 2.0), (5.0, 4.0), (4.0, 5.0)]), Layout::Xy)?.into(),
        CircularString::new(&xy(&[(4.0, 5.0), (3.0, 6.0), (4.0, 8.0)]), Layout::Xy)?.into(),
        LineString::new(
            &xy(&[(4.0, 8.0), (8.0, 4.0), (8.0, -2.0), (2.0, -2.0), (1.0, 2.0)]),
            Layout::Xy,
        )?
        .into(),
    ])?;
    CurvePolygon::new(vec![
        outer.into(),
        CircularString::new(
            &xy(&[(1.5, 2.5), (2.0, 3.0), (3.0, 1.5), (2.0, 1.0), (1.5, 2.5)]),
            Layout::Xy,
        )?
        .into(),
        CircularString::new(&xy(&[(2.0, 0.0), (3.0, 0.0), (2.0, 0.0)]), Layout::Xy)?.into(),
        LineString::new(&xy(&[(7.0, 1.0), (6.0, 2.0), (5.0, 1.0), (7.0, 1.0)]), Layout::Xy)?.into(),
    ])
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("render=info".parse().unwrap_or_default())
        .add_directive("curvegeom=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let polygon = sample_polygon()?;
    let extent = polygon.extent();
    let interior = polygon.interior_point();
    info!(
        rings = polygon.rings().len(),
        ?extent,
        label_x = interior.point.x,
        label_y = interior.point.y,
        label_width = interior.width,
        "built curve polygon"
    );

    let arc = CircularString::new(
        &xy(&[(1.0, 2.0), (2.0, 4.0), (4.0, 2.0), (5.0, 4.0), (4.0, 5.0), (3.0, 6.0), (4.0, 8.0)]),
        Layout::Xy,
    )?;
    info!(arcs = arc.arc_count(), "built circular string");

    let mut store = FeatureStore::new();
    store.add(Feature::new(
        polygon,
        Style::new(
            Some(FillStyle::new(Color::rgb(255, 200, 0))),
            Some(StrokeStyle::new(Color::rgb(40, 40, 40), 1.5)?),
        ),
    ));
    store.add(Feature::new(
        arc,
        Style::stroke(StrokeStyle::new(Color::rgb(0, 90, 200), 2.0)?),
    ));

    let built = build_instructions(&store, BuilderParams::default());
    println!("instructions:");
    for (i, instruction) in built.instructions.iter().enumerate() {
        println!("  {i:>3}  {instruction:?}");
    }
    println!(
        "{} coordinates, {} hit-detection instructions",
        built.coordinates.len(),
        built.hit_detection_instructions.len()
    );

    let mut sink = SvgSink::default();
    replay(&built.instructions, &built.coordinates, &mut sink)?;
    for path in &sink.paths {
        println!("<path d=\"{path}\"/>");
    }
    Ok(())
}
