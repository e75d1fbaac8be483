use serde::{Deserialize, Serialize};

/// First character of the six-character event code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Reflectivity {
    NonReflective,
    Reflective,
    SaturatedReflective,
    Unknown,
}

/// Second character of the event code: who placed the event and why.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventOrigin {
    AddedByUser,
    MovedByUser,
    EndOfFibre,
    FoundBySoftware,
    OutOfRange,
    ModifiedEndOfFibre,
    Unknown,
}

/// Decoded form of an instrument event code such as `"1F9999"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventCode {
    pub reflectivity: Reflectivity,
    pub origin: EventOrigin,
}

impl EventCode {
    pub fn parse(code: &str) -> Self {
        let mut chars = code.chars();
        let reflectivity = match chars.next() {
            Some('0') => Reflectivity::NonReflective,
            Some('1') => Reflectivity::Reflective,
            Some('2') => Reflectivity::SaturatedReflective,
            _ => Reflectivity::Unknown,
        };
        let origin = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('A') => EventOrigin::AddedByUser,
            Some('M') => EventOrigin::MovedByUser,
            Some('E') => EventOrigin::EndOfFibre,
            Some('F') => EventOrigin::FoundBySoftware,
            Some('O') => EventOrigin::OutOfRange,
            Some('D') => EventOrigin::ModifiedEndOfFibre,
            _ => EventOrigin::Unknown,
        };
        Self {
            reflectivity,
            origin,
        }
    }

    pub fn marks_end_of_fibre(&self) -> bool {
        matches!(
            self.origin,
            EventOrigin::EndOfFibre | EventOrigin::ModifiedEndOfFibre
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reflective_found_event() {
        let code = EventCode::parse("1F9999");
        assert_eq!(code.reflectivity, Reflectivity::Reflective);
        assert_eq!(code.origin, EventOrigin::FoundBySoftware);
        assert!(!code.marks_end_of_fibre());
    }

    #[test]
    fn parses_end_of_fibre() {
        assert!(EventCode::parse("2E9999").marks_end_of_fibre());
        assert!(EventCode::parse("0d9999").marks_end_of_fibre());
    }

    #[test]
    fn empty_code_is_unknown() {
        let code = EventCode::parse("");
        assert_eq!(code.reflectivity, Reflectivity::Unknown);
        assert_eq!(code.origin, EventOrigin::Unknown);
    }
}
