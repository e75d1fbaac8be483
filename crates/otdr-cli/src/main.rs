use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use otdr_lib::{
    config::{read_config, Config},
    io::{export, json as json_io},
    plot::{figure_from_trace, Figure, PlotBackend, Series, Style},
    projection::{project, ProjectedTrace, SampleEncoding},
    records::SorRecord,
};
use plotters::prelude::*;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "otdr",
    version,
    about = "Project decoded OTDR traces into metres and decibels"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EncodingArg {
    #[value(name = "direct")]
    Direct,
    #[value(name = "inverted-u16")]
    InvertedU16,
}

impl From<EncodingArg> for SampleEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Direct => SampleEncoding::Direct,
            EncodingArg::InvertedU16 => SampleEncoding::InvertedU16,
        }
    }
}

/// Options shared by every subcommand.
#[derive(Args)]
struct SourceArgs {
    /// Decoder JSON document; read from stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sample representation of the decoder output (overrides the config file)
    #[arg(long)]
    encoding: Option<EncodingArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved calibration and reference offsets
    Calibration {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the full projected trace as JSON
    Project {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print annotated key events, one JSON object per line, then the end-to-end summary
    Events {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Render the trace with reference and event markers to a PNG
    Plot {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        max_points: Option<usize>,
    },
    /// Write the position/amplitude series (and optionally events) as CSV
    ExportCsv {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        events: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Calibration { source } => cmd_calibration(&source)?,
        Commands::Project { source } => cmd_project(&source)?,
        Commands::Events { source } => cmd_events(&source)?,
        Commands::Plot {
            source,
            out,
            max_points,
        } => cmd_plot(&source, &out, max_points)?,
        Commands::ExportCsv {
            source,
            out,
            events,
        } => cmd_export_csv(&source, &out, events.as_deref())?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => read_config(path),
        None => Ok(Config::default()),
    }
}

fn read_record(input: Option<&Path>) -> Result<SorRecord> {
    match input {
        Some(path) => json_io::read_sor_json(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            json_io::parse_sor_json(&buf)
        }
    }
}

fn load_trace(source: &SourceArgs) -> Result<(ProjectedTrace, Config)> {
    let config = load_config(source.config.as_deref())?;
    let encoding = source
        .encoding
        .map(SampleEncoding::from)
        .unwrap_or(config.projection.encoding);
    let record = read_record(source.input.as_deref())?;
    let trace = project(&record, encoding).context("projecting trace")?;
    info!(
        "projected {} samples, {} events ({:?})",
        trace.len(),
        trace.events.len(),
        encoding
    );
    Ok((trace, config))
}

#[derive(Serialize)]
struct CalibrationSummary<'a> {
    calibration: &'a otdr_lib::Calibration,
    offsets: &'a otdr_lib::projection::ReferenceOffsets,
    n_points: usize,
}

fn cmd_calibration(source: &SourceArgs) -> Result<()> {
    let (trace, _) = load_trace(source)?;
    let summary = CalibrationSummary {
        calibration: &trace.calibration,
        offsets: &trace.offsets,
        n_points: trace.len(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_project(source: &SourceArgs) -> Result<()> {
    let (trace, _) = load_trace(source)?;
    println!("{}", serde_json::to_string(&trace)?);
    Ok(())
}

fn cmd_events(source: &SourceArgs) -> Result<()> {
    let (trace, _) = load_trace(source)?;
    for event in &trace.events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string(&trace.end_to_end)?);
    Ok(())
}

fn cmd_plot(source: &SourceArgs, out: &Path, max_points: Option<usize>) -> Result<()> {
    let (trace, config) = load_trace(source)?;
    let fig = figure_from_trace(&trace, max_points.unwrap_or(config.plot.max_points));
    let mut backend = PngBackend {
        path: out.to_path_buf(),
        size: (config.plot.width, config.plot.height),
    };
    backend.draw(&fig)?;
    info!("wrote {}", out.display());
    Ok(())
}

fn cmd_export_csv(source: &SourceArgs, out: &Path, events: Option<&Path>) -> Result<()> {
    let (trace, _) = load_trace(source)?;
    export::write_series_csv(out, &trace)?;
    if let Some(path) = events {
        export::write_events_csv(path, &trace)?;
    }
    Ok(())
}

struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

/// Widen a degenerate range so the chart has a non-zero span.
fn padded(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 1.0, lo + 1.0),
        None => (0.0, 1.0),
    }
}

/// Dash and gap lengths in pixels, or `None` for a solid line.
fn dash_pattern(style: &Style) -> Option<(u32, u32)> {
    let [dash, gap] = style.dash?;
    let px = |len: f32| len.round().max(1.0) as u32;
    Some((px(dash), px(gap)))
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let (x_min, x_max) = padded(fig.x_range());
        let (y_min, y_max) = padded(fig.y_range());
        let y_range = if fig.y.inverted {
            y_max..y_min
        } else {
            y_min..y_max
        };
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_range)?;
        chart
            .configure_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    let color = RGBColor(r, g, b);
                    chart
                        .draw_series(LineSeries::new(
                            line.points.iter().map(|p| (p[0], p[1])),
                            color.stroke_width(line.style.width.round().max(1.0) as u32),
                        ))?
                        .label(line.name.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
                Series::Marker(marker) => {
                    let (r, g, b) = marker.style.color.rgb();
                    let style = RGBColor(r, g, b)
                        .stroke_width(marker.style.width.round().max(1.0) as u32);
                    let ends = [(marker.x, y_min), (marker.x, y_max)];
                    match dash_pattern(&marker.style) {
                        Some((dash, gap)) => {
                            chart.draw_series(DashedLineSeries::new(ends, dash, gap, style))?;
                        }
                        None => {
                            chart.draw_series(LineSeries::new(ends, style))?;
                        }
                    }
                }
            }
        }
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(dash: Option<[f32; 2]>) -> Style {
        Style {
            width: 1.0,
            dash,
            color: otdr_lib::plot::Color(0),
        }
    }

    #[test]
    fn solid_style_has_no_dash_pattern() {
        assert_eq!(dash_pattern(&style(None)), None);
    }

    #[test]
    fn dash_pattern_rounds_to_whole_pixels() {
        assert_eq!(dash_pattern(&style(Some([4.0, 4.0]))), Some((4, 4)));
        assert_eq!(dash_pattern(&style(Some([2.6, 0.2]))), Some((3, 1)));
    }
}
