//! Projection of a route into a fixed-size SVG canvas

use std::fmt::Write;

use super::polyline::Coordinate;

pub const CANVAS_WIDTH: f64 = 200.0;
pub const CANVAS_HEIGHT: f64 = 150.0;

/// Fraction of each axis' span added on both sides.
const PADDING_RATIO: f64 = 0.1;

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// `None` for an empty slice.
    pub fn of(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_lat: b.min_lat.min(p.lat),
            max_lat: b.max_lat.max(p.lat),
            min_lng: b.min_lng.min(p.lng),
            max_lng: b.max_lng.max(p.lng),
        }))
    }

    /// Grow each axis symmetrically by `ratio` of its span.
    pub fn padded(self, ratio: f64) -> Self {
        let lat_pad = (self.max_lat - self.min_lat) * ratio;
        let lng_pad = (self.max_lng - self.min_lng) * ratio;
        Self {
            min_lat: self.min_lat - lat_pad,
            max_lat: self.max_lat + lat_pad,
            min_lng: self.min_lng - lng_pad,
            max_lng: self.max_lng + lng_pad,
        }
    }

    /// Map a coordinate onto the canvas, north up.
    ///
    /// A zero-span axis puts every point at the canvas centre on that axis.
    pub fn project(&self, point: Coordinate) -> (f64, f64) {
        let lng_span = self.max_lng - self.min_lng;
        let lat_span = self.max_lat - self.min_lat;

        let x = if lng_span > 0.0 {
            (point.lng - self.min_lng) / lng_span * CANVAS_WIDTH
        } else {
            CANVAS_WIDTH / 2.0
        };
        let y = if lat_span > 0.0 {
            CANVAS_HEIGHT - (point.lat - self.min_lat) / lat_span * CANVAS_HEIGHT
        } else {
            CANVAS_HEIGHT / 2.0
        };
        (x, y)
    }
}

/// Projected route, ready to render as an SVG path.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    points: Vec<(f64, f64)>,
}

impl RoutePath {
    /// `None` when there is nothing to draw.
    pub fn project(points: &[Coordinate]) -> Option<Self> {
        let bounds = Bounds::of(points)?.padded(PADDING_RATIO);
        Some(Self {
            points: points.iter().map(|&p| bounds.project(p)).collect(),
        })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Path `d` attribute: `M x y` then `L x y` for each further point.
    pub fn path_data(&self) -> String {
        let mut d = String::new();
        for (i, (x, y)) in self.points.iter().enumerate() {
            if i > 0 {
                d.push(' ');
            }
            let op = if i == 0 { 'M' } else { 'L' };
            // Writing to a String cannot fail
            let _ = write!(d, "{} {:.1} {:.1}", op, tidy(*x), tidy(*y));
        }
        d
    }

    /// Standalone `<svg>` element with a transparent background.
    pub fn to_svg(&self) -> String {
        format!(
            concat!(
                r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" "#,
                r#"xmlns="http://www.w3.org/2000/svg" style="background: transparent;">"#,
                r#"<path d="{d}" fill="none" stroke="red" stroke-width="2" "#,
                r#"stroke-linecap="round" stroke-linejoin="round"/></svg>"#
            ),
            w = CANVAS_WIDTH,
            h = CANVAS_HEIGHT,
            d = self.path_data()
        )
    }
}

/// Avoid printing `-0.0` for values that round to zero.
fn tidy(v: f64) -> f64 {
    if v.abs() < 0.05 {
        0.0
    } else {
        v
    }
}
