//! Projection of raw trace samples and key events into metres and decibels.
//!
//! The position series uses the OTDR module as its origin, while event
//! positions are shifted by the front-panel offset. Both frames are kept as
//! the instrument reports them; consumers that want a launch-connector origin
//! subtract [`ReferenceOffsets::metres_to_launch_connector`] themselves.

use crate::calibration::Calibration;
use crate::error::{Result, TraceError};
use crate::events::{EventCode, EventOrigin, Reflectivity};
use crate::records::{KeyEvent, KeyEvents, LastKeyEvent, ScaleFactorBlock, SorRecord};
use log::debug;
use serde::{Deserialize, Serialize};

/// Full scale of an unsigned 16-bit sample.
const U16_FULL_SCALE: f64 = 65_535.0;

/// How the decoder represents raw samples.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SampleEncoding {
    /// Signed dB-loss values: `raw / scale_factor`.
    Direct,
    /// Unsigned 16-bit magnitudes: `-(65535 - raw) / scale_factor`.
    #[default]
    InvertedU16,
}

impl SampleEncoding {
    fn decode(self, raw: i32, scale_factor: f64) -> f64 {
        match self {
            SampleEncoding::Direct => raw as f64 / scale_factor,
            // Same value as -(65535 - raw), without producing -0.0 at full scale.
            SampleEncoding::InvertedU16 => (raw as f64 - U16_FULL_SCALE) / scale_factor,
        }
    }
}

/// Front-panel and launch-connector positions, in metres from the OTDR module.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOffsets {
    pub metres_to_front_panel: f64,
    /// Composed on top of the front panel, not measured from the module.
    pub metres_to_launch_connector: f64,
}

impl ReferenceOffsets {
    pub fn new(calibration: &Calibration, front_panel_offset: i32, user_offset: i32) -> Self {
        let metres_to_front_panel = calibration.propagation_to_metres(front_panel_offset);
        let metres_to_launch_connector =
            calibration.propagation_to_metres(user_offset) + metres_to_front_panel;
        Self {
            metres_to_front_panel,
            metres_to_launch_connector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEvent {
    pub event_number: i32,
    pub loss_db: f64,
    pub reflectance_db: f64,
    pub position_metres: f64,
    pub reflectivity: Reflectivity,
    pub origin: EventOrigin,
    pub is_end_of_fibre: bool,
    #[serde(default)]
    pub comment: String,
}

/// Whole-span measurements reported once per trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndToEnd {
    pub loss_db: f64,
    pub optical_return_loss_db: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedTrace {
    pub calibration: Calibration,
    pub offsets: ReferenceOffsets,
    pub encoding: SampleEncoding,
    pub scale_factor: i32,
    /// Metres from the OTDR module, one per sample.
    pub positions: Vec<f64>,
    /// dB, aligned with `positions`.
    pub amplitudes: Vec<f64>,
    pub events: Vec<AnnotatedEvent>,
    pub end_to_end: EndToEnd,
}

impl ProjectedTrace {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// `[position, amplitude]` pairs, ready for plotting.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.positions
            .iter()
            .zip(&self.amplitudes)
            .map(|(x, y)| [*x, *y])
            .collect()
    }
}

/// Project a decoded record: resolve calibration, then convert samples and events.
pub fn project(record: &SorRecord, encoding: SampleEncoding) -> Result<ProjectedTrace> {
    let blocks = record.require()?;
    let calibration = Calibration::from_fixed_parameters(blocks.fixed)?;
    let block = blocks.data_points.single_block()?;
    project_with(
        &calibration,
        blocks.fixed.front_panel_offset,
        blocks.general.user_offset,
        block,
        blocks.key_events,
        encoding,
    )
}

/// Project with an already resolved calibration.
pub fn project_with(
    calibration: &Calibration,
    front_panel_offset: i32,
    user_offset: i32,
    block: &ScaleFactorBlock,
    key_events: &KeyEvents,
    encoding: SampleEncoding,
) -> Result<ProjectedTrace> {
    calibration.check()?;
    let (n_points, scale_factor) = validate_block(block)?;
    let offsets = ReferenceOffsets::new(calibration, front_panel_offset, user_offset);

    let amplitudes = decode_samples(&block.data[..n_points], scale_factor, encoding);
    let positions = position_series(calibration, n_points);

    let mut events: Vec<AnnotatedEvent> = key_events
        .key_events
        .iter()
        .map(|ke| annotate_event(calibration, &offsets, ke, scale_factor))
        .collect();
    let last = &key_events.last_key_event;
    let mut last_annotated =
        annotate_event(calibration, &offsets, &last.as_key_event(), scale_factor);
    last_annotated.is_end_of_fibre = true;
    events.push(last_annotated);

    debug!(
        "projected {} samples and {} events at scale factor {}",
        n_points,
        events.len(),
        block.scale_factor
    );

    Ok(ProjectedTrace {
        calibration: *calibration,
        offsets,
        encoding,
        scale_factor: block.scale_factor,
        positions,
        amplitudes,
        events,
        end_to_end: end_to_end(last, scale_factor),
    })
}

/// Decode the amplitude series alone. Needs no calibration.
pub fn amplitude_series(block: &ScaleFactorBlock, encoding: SampleEncoding) -> Result<Vec<f64>> {
    let (n_points, scale_factor) = validate_block(block)?;
    Ok(decode_samples(&block.data[..n_points], scale_factor, encoding))
}

/// Sample positions in metres from the OTDR module. Built by index
/// multiplication so the length is exactly `n_points`.
pub fn position_series(calibration: &Calibration, n_points: usize) -> Vec<f64> {
    (0..n_points)
        .map(|i| i as f64 * calibration.metres_per_sample)
        .collect()
}

pub fn annotate_event(
    calibration: &Calibration,
    offsets: &ReferenceOffsets,
    event: &KeyEvent,
    scale_factor: f64,
) -> AnnotatedEvent {
    let code = EventCode::parse(&event.event_code);
    AnnotatedEvent {
        event_number: event.event_number,
        loss_db: event.event_loss as f64 / scale_factor,
        reflectance_db: event.event_reflectance as f64 / scale_factor,
        position_metres: calibration.propagation_to_metres(event.event_propogation_time)
            + offsets.metres_to_front_panel,
        reflectivity: code.reflectivity,
        origin: code.origin,
        is_end_of_fibre: code.marks_end_of_fibre(),
        comment: event.comment.clone(),
    }
}

pub fn end_to_end(last: &LastKeyEvent, scale_factor: f64) -> EndToEnd {
    EndToEnd {
        loss_db: last.end_to_end_loss as f64 / scale_factor,
        optical_return_loss_db: last.optical_return_loss as f64 / scale_factor,
    }
}

/// Check the block before anything is emitted; returns `(n_points, scale_factor)`.
fn validate_block(block: &ScaleFactorBlock) -> Result<(usize, f64)> {
    if block.scale_factor <= 0 {
        return Err(TraceError::DegenerateScaleFactor {
            value: block.scale_factor as i64,
        });
    }
    let n_points = usize::try_from(block.n_points)
        .ok()
        .filter(|n| *n <= block.data.len())
        .ok_or(TraceError::IndexInconsistency {
            n_points: block.n_points as i64,
            available: block.data.len(),
        })?;
    Ok((n_points, block.scale_factor as f64))
}

fn decode_samples(raw: &[i32], scale_factor: f64, encoding: SampleEncoding) -> Vec<f64> {
    raw.iter()
        .map(|&sample| encoding.decode(sample, scale_factor))
        .collect()
}
