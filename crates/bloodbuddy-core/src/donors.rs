use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::CoreError;

/// The eight ABO/Rh blood groups the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodGroup {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = CoreError;

    /// Parses `"ab+"`, `" O- "` and friends; case and surrounding whitespace
    /// are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidBloodGroup(s.to_string()))
    }
}

impl TryFrom<String> for BloodGroup {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodGroup> for String {
    fn from(value: BloodGroup) -> Self {
        value.as_str().to_string()
    }
}

/// Page size choices offered by the donor search screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultLimit {
    #[default]
    Ten,
    Twenty,
    Fifty,
    Hundred,
}

impl ResultLimit {
    #[must_use]
    pub fn get(self) -> u32 {
        match self {
            ResultLimit::Ten => 10,
            ResultLimit::Twenty => 20,
            ResultLimit::Fifty => 50,
            ResultLimit::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for ResultLimit {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(ResultLimit::Ten),
            20 => Ok(ResultLimit::Twenty),
            50 => Ok(ResultLimit::Fifty),
            100 => Ok(ResultLimit::Hundred),
            other => Err(CoreError::InvalidResultLimit(other)),
        }
    }
}

/// The active donor search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchFilter {
    pub blood_group: Option<BloodGroup>,
    pub limit: ResultLimit,
}

/// A donor as returned by the registry's nearby search.
///
/// The view only ever holds a read-only copy of the current result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub name: String,
    pub blood_group: BloodGroup,
    pub contact: String,
    pub city: String,
    pub coordinate: Coordinate,
    /// Distance from the search point as computed by the registry.
    #[serde(default)]
    pub distance_km: Option<f64>,
}

impl Donor {
    /// The distance column of the donor table; an em-dash placeholder when the registry did
    /// not report one.
    #[must_use]
    pub fn distance_label(&self) -> String {
        self.distance_km
            .map_or_else(|| "\u{2014}".to_string(), |d| format!("{d:.2}"))
    }
}

#[cfg(test)]
#[path = "donors_test.rs"]
mod tests;
