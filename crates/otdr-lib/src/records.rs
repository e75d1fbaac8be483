//! Decoded SOR record groups, as emitted by an external trace decoder.
//!
//! Field names and units follow the decoder's JSON output so a record set can
//! be deserialized directly. Only the fields the projection needs are
//! required; descriptive fields default to empty when absent and anything
//! else in the document is ignored.

use crate::error::{Result, TraceError};
use serde::{Deserialize, Serialize};

/// Instrument calibration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedParameters {
    /// Refractive index in 1e-5 units; 0 when the instrument left it unset.
    pub group_index: i32,
    /// Time to acquire 10,000 points, in 100 ps units, one per pulse width.
    pub data_spacing: Vec<i32>,
    /// One-way propagation time from the OTDR module to the front panel (100 ps).
    pub front_panel_offset: i32,
    #[serde(default)]
    pub units_of_distance: String,
    /// Calibrated wavelength in nm.
    #[serde(default)]
    pub actual_wavelength: i32,
    /// Pulse widths in ns.
    #[serde(default)]
    pub pulse_widths_used: Vec<i32>,
    #[serde(default)]
    pub acquisition_offset: i32,
}

/// Test identification block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralParameters {
    /// One-way propagation time from the front panel to the launch connector (100 ps).
    pub user_offset: i32,
    #[serde(default)]
    pub cable_id: String,
    #[serde(default)]
    pub fiber_id: String,
    #[serde(default)]
    pub nominal_wavelength: i32,
    #[serde(default)]
    pub originating_location: String,
    #[serde(default)]
    pub terminating_location: String,
}

/// Samples recorded at a single scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactorBlock {
    pub n_points: i32,
    pub scale_factor: i32,
    /// Raw samples, one per distance bin. Held as i32 so both signed dB-loss
    /// and unsigned 16-bit decoder output fit.
    pub data: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoints {
    pub scale_factors: Vec<ScaleFactorBlock>,
}

impl DataPoints {
    /// The single scale factor block this projection supports.
    pub fn single_block(&self) -> Result<&ScaleFactorBlock> {
        match self.scale_factors.as_slice() {
            [block] => Ok(block),
            [] => Err(TraceError::MissingInput {
                block: "data_points.scale_factors",
            }),
            blocks => Err(TraceError::UnsupportedMultiRegimeTrace {
                field: "data_points.scale_factors",
                count: blocks.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub event_number: i32,
    /// One-way time of flight from the OTDR module (100 ps).
    pub event_propogation_time: i32,
    pub event_loss: i32,
    pub event_reflectance: i32,
    #[serde(default)]
    pub event_code: String,
    #[serde(default)]
    pub comment: String,
}

/// Terminating event; carries the whole-span measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastKeyEvent {
    pub event_number: i32,
    pub event_propogation_time: i32,
    pub event_loss: i32,
    pub event_reflectance: i32,
    #[serde(default)]
    pub event_code: String,
    #[serde(default)]
    pub comment: String,
    pub end_to_end_loss: i32,
    #[serde(default)]
    pub optical_return_loss: i32,
}

impl LastKeyEvent {
    /// View of the fields shared with ordinary key events.
    pub fn as_key_event(&self) -> KeyEvent {
        KeyEvent {
            event_number: self.event_number,
            event_propogation_time: self.event_propogation_time,
            event_loss: self.event_loss,
            event_reflectance: self.event_reflectance,
            event_code: self.event_code.clone(),
            comment: self.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvents {
    pub key_events: Vec<KeyEvent>,
    pub last_key_event: LastKeyEvent,
}

/// A decoded trace. Every group is optional because the decoder is permissive;
/// [`SorRecord::require`] checks that the groups needed for projection exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SorRecord {
    #[serde(default)]
    pub fixed_parameters: Option<FixedParameters>,
    #[serde(default)]
    pub general_parameters: Option<GeneralParameters>,
    #[serde(default)]
    pub data_points: Option<DataPoints>,
    #[serde(default)]
    pub key_events: Option<KeyEvents>,
}

/// Borrowed view of a record with all required groups present.
#[derive(Debug, Clone, Copy)]
pub struct RequiredBlocks<'a> {
    pub fixed: &'a FixedParameters,
    pub general: &'a GeneralParameters,
    pub data_points: &'a DataPoints,
    pub key_events: &'a KeyEvents,
}

impl SorRecord {
    pub fn require(&self) -> Result<RequiredBlocks<'_>> {
        Ok(RequiredBlocks {
            fixed: self.fixed_parameters.as_ref().ok_or(TraceError::MissingInput {
                block: "fixed_parameters",
            })?,
            general: self
                .general_parameters
                .as_ref()
                .ok_or(TraceError::MissingInput {
                    block: "general_parameters",
                })?,
            data_points: self.data_points.as_ref().ok_or(TraceError::MissingInput {
                block: "data_points",
            })?,
            key_events: self.key_events.as_ref().ok_or(TraceError::MissingInput {
                block: "key_events",
            })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_first_missing_block() {
        let record = SorRecord::default();
        assert_eq!(
            record.require().unwrap_err(),
            TraceError::MissingInput {
                block: "fixed_parameters"
            }
        );
    }

    #[test]
    fn single_block_rejects_multiple_scale_factors() {
        let block = ScaleFactorBlock {
            n_points: 1,
            scale_factor: 1000,
            data: vec![0],
        };
        let dp = DataPoints {
            scale_factors: vec![block.clone(), block],
        };
        assert_eq!(
            dp.single_block().unwrap_err(),
            TraceError::UnsupportedMultiRegimeTrace {
                field: "data_points.scale_factors",
                count: 2
            }
        );
    }

    #[test]
    fn single_block_reports_missing_scale_factors() {
        let dp = DataPoints {
            scale_factors: Vec::new(),
        };
        assert_eq!(
            dp.single_block().unwrap_err(),
            TraceError::MissingInput {
                block: "data_points.scale_factors"
            }
        );
    }

    #[test]
    fn deserializes_decoder_json_ignoring_extra_fields() {
        let json = r#"{
            "map": {"revision_number": 200},
            "fixed_parameters": {
                "group_index": 146800,
                "data_spacing": [50000],
                "front_panel_offset": 0,
                "trace_type": "ST"
            },
            "general_parameters": {"user_offset": 0, "operator": "x"},
            "data_points": {
                "number_of_data_points": 2,
                "scale_factors": [{"n_points": 2, "scale_factor": 1000, "data": [65535, 60000]}]
            },
            "key_events": null
        }"#;
        let record: SorRecord = serde_json::from_str(json).unwrap();
        let fixed = record.fixed_parameters.as_ref().unwrap();
        assert_eq!(fixed.group_index, 146800);
        assert!(fixed.units_of_distance.is_empty());
        assert!(record.key_events.is_none());
        assert_eq!(
            record.require().unwrap_err(),
            TraceError::MissingInput {
                block: "key_events"
            }
        );
    }
}
