//! Severity label and accent color, both derived from the first component.

use std::fmt;

use crate::types::ComponentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
    Unknown,
}

impl Severity {
    /// Maps the lead component's status. No components means `Unknown`.
    pub fn from_lead_component(status: Option<&ComponentStatus>) -> Self {
        match status {
            Some(ComponentStatus::Operational) => Severity::Operational,
            Some(ComponentStatus::DegradedPerformance) => Severity::DegradedPerformance,
            Some(ComponentStatus::PartialOutage) => Severity::PartialOutage,
            Some(ComponentStatus::MajorOutage) => Severity::MajorOutage,
            Some(ComponentStatus::UnderMaintenance | ComponentStatus::Other(_)) | None => {
                Severity::Unknown
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Operational => "Operational",
            Severity::DegradedPerformance => "Degraded Performance",
            Severity::PartialOutage => "Partial Outage",
            Severity::MajorOutage => "Major Outage",
            Severity::Unknown => "Unknown",
        }
    }

    pub fn accent_color(self) -> u32 {
        match self {
            Severity::MajorOutage => COLOR_RED,
            Severity::PartialOutage | Severity::DegradedPerformance => COLOR_ORANGE,
            Severity::Operational | Severity::Unknown => COLOR_GREEN,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const COLOR_RED: u32 = 0xFF0000;
pub const COLOR_ORANGE: u32 = 0xFFA500;
pub const COLOR_GREEN: u32 = 0x00CD00;
