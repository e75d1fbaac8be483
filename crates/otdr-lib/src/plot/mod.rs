use crate::projection::ProjectedTrace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    /// Draw with values increasing downwards.
    #[serde(default)]
    pub inverted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Vertical line at a fixed x position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub x: f64,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Marker(Marker),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis {
                label: None,
                inverted: false,
            },
            y: Axis {
                label: None,
                inverted: false,
            },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(min, max)` over line points and marker positions, or `None` when empty.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let xs = self.series.iter().flat_map(|series| match series {
            Series::Line(line) => line.points.iter().map(|p| p[0]).collect::<Vec<_>>(),
            Series::Marker(marker) => vec![marker.x],
        });
        min_max(xs)
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        let ys = self.series.iter().flat_map(|series| match series {
            Series::Line(line) => line.points.iter().map(|p| p[1]).collect::<Vec<_>>(),
            Series::Marker(_) => Vec::new(),
        });
        min_max(ys)
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        let sample = points[start];
        result.push(sample);
    }
    result
}

fn marker(name: String, x: f64, color: u32, dash: Option<[f32; 2]>) -> Series {
    Series::Marker(Marker {
        name,
        x,
        style: Style {
            width: 1.0,
            dash,
            color: Color(color),
        },
    })
}

/// Trace line plus reference and event markers. Positions stay in the
/// module-origin frame, so the front panel sits to the right of zero.
pub fn figure_from_trace(trace: &ProjectedTrace, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some("OTDR trace".into()));
    fig.x.label = Some("Metres from OTDR module (not front panel/launch)".into());
    fig.y.label = Some("dB".into());
    fig.y.inverted = true;

    fig.add_series(Series::Line(LineSeries {
        name: "trace".into(),
        points: decimate_points(&trace.points(), max_points),
        style: Style {
            width: 1.0,
            dash: None,
            color: Color(0x1F77B4),
        },
    }));
    fig.add_series(marker(
        "front panel".into(),
        trace.offsets.metres_to_front_panel,
        0x2CA02C,
        None,
    ));
    fig.add_series(marker(
        "launch connector".into(),
        trace.offsets.metres_to_launch_connector,
        0xFF7F0E,
        None,
    ));
    for event in &trace.events {
        fig.add_series(marker(
            format!("event {}", event.event_number),
            event.position_metres,
            0xD62728,
            Some([4.0, 4.0]),
        ));
    }
    fig
}
