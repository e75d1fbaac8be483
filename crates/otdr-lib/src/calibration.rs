use crate::error::{Result, TraceError};
use crate::records::FixedParameters;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Vacuum speed of light, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Group index used when the instrument reports 0 (refractive index 1.468).
pub const DEFAULT_GROUP_INDEX: i32 = 146_800;

/// Group index is stored in 1e-5 units.
const GROUP_INDEX_SCALE: f64 = 100_000.0;

/// Propagation times and spacings are stored in 100 ps units.
const TIME_UNITS_PER_SECOND: f64 = 1e10;

/// Spacing is reported as the time taken for this many points.
const POINTS_PER_SPACING: f64 = 10_000.0;

/// Per-trace calibration constants, resolved once and shared by every sample
/// and event conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub refractive_index: f64,
    /// m/s
    pub speed_of_light_in_fibre: f64,
    /// m
    pub metres_per_sample: f64,
}

impl Calibration {
    /// Resolve calibration from the reported group index and pulse-width spacings.
    pub fn resolve(group_index: i32, data_spacing: &[i32]) -> Result<Self> {
        let spacing = match data_spacing {
            [spacing] => *spacing,
            [] => {
                return Err(TraceError::InvalidCalibration {
                    field: "data_spacing",
                    value: 0,
                })
            }
            many => {
                return Err(TraceError::UnsupportedMultiRegimeTrace {
                    field: "data_spacing",
                    count: many.len(),
                })
            }
        };
        if spacing <= 0 {
            return Err(TraceError::InvalidCalibration {
                field: "data_spacing[0]",
                value: spacing as i64,
            });
        }

        let effective_index = match group_index {
            0 => {
                warn!("group index unset, falling back to {}", DEFAULT_GROUP_INDEX);
                DEFAULT_GROUP_INDEX
            }
            gi if gi < 0 => {
                return Err(TraceError::InvalidCalibration {
                    field: "group_index",
                    value: gi as i64,
                })
            }
            gi => gi,
        };

        let refractive_index = effective_index as f64 / GROUP_INDEX_SCALE;
        let speed_of_light_in_fibre = SPEED_OF_LIGHT / refractive_index;
        let seconds_per_10k_points = spacing as f64 / TIME_UNITS_PER_SECOND;
        let metres_per_sample =
            (seconds_per_10k_points / POINTS_PER_SPACING) * speed_of_light_in_fibre;

        debug!(
            "calibration: n={} v={} m/s, {} m/sample",
            refractive_index, speed_of_light_in_fibre, metres_per_sample
        );
        Ok(Self {
            refractive_index,
            speed_of_light_in_fibre,
            metres_per_sample,
        })
    }

    pub fn from_fixed_parameters(fixed: &FixedParameters) -> Result<Self> {
        Self::resolve(fixed.group_index, &fixed.data_spacing)
    }

    /// Reject a calibration that could not have come out of [`Calibration::resolve`],
    /// such as one deserialized from elsewhere.
    pub fn check(&self) -> Result<()> {
        let fields = [
            ("refractive_index", self.refractive_index),
            ("speed_of_light_in_fibre", self.speed_of_light_in_fibre),
            ("metres_per_sample", self.metres_per_sample),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(TraceError::InvalidCalibration {
                    field,
                    value: value as i64,
                });
            }
        }
        Ok(())
    }

    /// Convert a one-way propagation time (100 ps units) to metres of fibre.
    pub fn propagation_to_metres(&self, time: i32) -> f64 {
        (time as f64 / TIME_UNITS_PER_SECOND) * self.speed_of_light_in_fibre
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, rel_tol: f64) {
        let tol = expected.abs().max(1.0) * rel_tol;
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "expected {expected}, got {actual} (diff {diff} > tol {tol})"
        );
    }

    #[test]
    fn zero_group_index_falls_back_to_default() {
        let unset = Calibration::resolve(0, &[50_000]).unwrap();
        let default = Calibration::resolve(DEFAULT_GROUP_INDEX, &[50_000]).unwrap();
        assert_eq!(unset, default);
        assert_eq!(unset.refractive_index, 1.468);
    }

    #[test]
    fn resolves_reference_scenario() {
        let cal = Calibration::resolve(146_800, &[2_000_000_000]).unwrap();
        assert_close(cal.speed_of_light_in_fibre, 204_218_295.640_327, 1e-12);
        assert_close(cal.metres_per_sample, 4_084.365_912_806_54, 1e-12);
    }

    #[test]
    fn realistic_spacing_gives_decimetre_bins() {
        let cal = Calibration::resolve(147_000, &[50_000]).unwrap();
        assert_close(cal.speed_of_light_in_fibre, 203_940_447.619_047_6, 1e-12);
        assert_close(cal.metres_per_sample, 0.101_970_223_809_523_81, 1e-12);
    }

    #[test]
    fn rejects_zero_spacing() {
        assert_eq!(
            Calibration::resolve(146_800, &[0]).unwrap_err(),
            TraceError::InvalidCalibration {
                field: "data_spacing[0]",
                value: 0
            }
        );
    }

    #[test]
    fn rejects_empty_spacing() {
        assert_eq!(
            Calibration::resolve(146_800, &[]).unwrap_err(),
            TraceError::InvalidCalibration {
                field: "data_spacing",
                value: 0
            }
        );
    }

    #[test]
    fn rejects_negative_group_index() {
        assert!(matches!(
            Calibration::resolve(-1, &[50_000]),
            Err(TraceError::InvalidCalibration {
                field: "group_index",
                ..
            })
        ));
    }

    #[test]
    fn rejects_multiple_pulse_widths() {
        assert_eq!(
            Calibration::resolve(146_800, &[50_000, 100_000]).unwrap_err(),
            TraceError::UnsupportedMultiRegimeTrace {
                field: "data_spacing",
                count: 2
            }
        );
    }

    #[test]
    fn resolved_calibration_passes_check() {
        assert!(Calibration::resolve(0, &[50_000]).unwrap().check().is_ok());
    }

    #[test]
    fn check_rejects_unresolved_values() {
        let mut cal = Calibration::resolve(147_000, &[50_000]).unwrap();
        cal.metres_per_sample = f64::NAN;
        assert_eq!(
            cal.check().unwrap_err(),
            TraceError::InvalidCalibration {
                field: "metres_per_sample",
                value: 0
            }
        );
        cal.metres_per_sample = 0.1;
        cal.speed_of_light_in_fibre = -1.0;
        assert!(matches!(
            cal.check(),
            Err(TraceError::InvalidCalibration {
                field: "speed_of_light_in_fibre",
                ..
            })
        ));
    }

    #[test]
    fn propagation_time_converts_with_fibre_speed() {
        let cal = Calibration::resolve(147_000, &[50_000]).unwrap();
        assert_close(cal.propagation_to_metres(1_200), 24.472_853_714_285_712, 1e-12);
        assert_eq!(cal.propagation_to_metres(0), 0.0);
    }
}
