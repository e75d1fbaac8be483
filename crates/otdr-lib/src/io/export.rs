use crate::projection::ProjectedTrace;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs;
use std::path::Path;

/// Write the trace as `position_m,amplitude_db` rows.
pub fn write_series_csv(path: &Path, trace: &ProjectedTrace) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["position_m", "amplitude_db"])?;
    for (position, amplitude) in trace.positions.iter().zip(&trace.amplitudes) {
        writer.write_record(&[position.to_string(), amplitude.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_events_csv(path: &Path, trace: &ProjectedTrace) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record([
        "event_number",
        "position_m",
        "loss_db",
        "reflectance_db",
        "reflectivity",
        "origin",
        "end_of_fibre",
        "comment",
    ])?;
    for event in &trace.events {
        writer.write_record(&[
            event.event_number.to_string(),
            event.position_metres.to_string(),
            event.loss_db.to_string(),
            event.reflectance_db.to_string(),
            format!("{:?}", event.reflectivity),
            format!("{:?}", event.origin),
            event.is_end_of_fibre.to_string(),
            event.comment.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
