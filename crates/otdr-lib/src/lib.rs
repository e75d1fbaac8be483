pub mod calibration;
pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod plot;
pub mod projection;
pub mod records;

pub use calibration::Calibration;
pub use error::TraceError;
pub use projection::{project, ProjectedTrace, SampleEncoding};
pub use records::SorRecord;
