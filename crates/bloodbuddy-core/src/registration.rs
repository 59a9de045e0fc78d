//! Donor registration form and its validation rules.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::donors::BloodGroup;

pub const MIN_DONOR_AGE: u32 = 18;
pub const MAX_DONOR_AGE: u32 = 65;
pub const MIN_DONOR_WEIGHT_KG: f64 = 45.0;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("age must be between {MIN_DONOR_AGE} and {MAX_DONOR_AGE}, got {0}")]
    AgeOutOfRange(u32),

    #[error("weight must be at least {MIN_DONOR_WEIGHT_KG} kg, got {0}")]
    Underweight(f64),

    #[error("blood group is required")]
    MissingBloodGroup,

    #[error("{field} must be exactly 10 digits")]
    InvalidPhone { field: &'static str },

    #[error("Please enter your address.")]
    MissingAddress,
}

/// Raw values of the "become a donor" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationForm {
    pub name: String,
    pub age: u32,
    pub weight_kg: f64,
    pub blood_group: Option<BloodGroup>,
    pub mobile: String,
    pub whatsapp: String,
    pub address: String,
}

/// A form that passed every rule; only this can be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRegistration {
    pub name: String,
    pub blood_group: BloodGroup,
    pub mobile: String,
    pub whatsapp: String,
    pub address: String,
}

impl RegistrationForm {
    /// Checks every field and returns the first violation.
    ///
    /// `has_device_position` relaxes the address requirement: when the
    /// donor's coordinates come from the device, the address is only a label.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, in form order.
    pub fn validate(
        &self,
        has_device_position: bool,
    ) -> Result<ValidatedRegistration, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if !(MIN_DONOR_AGE..=MAX_DONOR_AGE).contains(&self.age) {
            return Err(ValidationError::AgeOutOfRange(self.age));
        }
        if self.weight_kg.is_nan() || self.weight_kg < MIN_DONOR_WEIGHT_KG {
            return Err(ValidationError::Underweight(self.weight_kg));
        }
        let blood_group = self.blood_group.ok_or(ValidationError::MissingBloodGroup)?;
        let mobile = self.mobile.trim();
        if !PHONE_RE.is_match(mobile) {
            return Err(ValidationError::InvalidPhone { field: "mobile" });
        }
        let whatsapp = self.whatsapp.trim();
        if !PHONE_RE.is_match(whatsapp) {
            return Err(ValidationError::InvalidPhone { field: "whatsapp" });
        }
        let address = self.address.trim();
        if address.is_empty() && !has_device_position {
            return Err(ValidationError::MissingAddress);
        }

        Ok(ValidatedRegistration {
            name: name.to_string(),
            blood_group,
            mobile: mobile.to_string(),
            whatsapp: whatsapp.to_string(),
            address: address.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            name: "Ravi Deshmukh".to_string(),
            age: 30,
            weight_kg: 70.0,
            blood_group: Some(BloodGroup::BPositive),
            mobile: "9876543210".to_string(),
            whatsapp: "9876543210".to_string(),
            address: "Rajapeth, Amravati".to_string(),
        }
    }

    #[test]
    fn valid_form_passes() {
        let ok = valid_form().validate(false).unwrap();
        assert_eq!(ok.name, "Ravi Deshmukh");
        assert_eq!(ok.blood_group, BloodGroup::BPositive);
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let mut form = valid_form();
        form.age = 18;
        assert!(form.validate(false).is_ok());
        form.age = 65;
        assert!(form.validate(false).is_ok());
        form.age = 17;
        assert_eq!(
            form.validate(false).unwrap_err(),
            ValidationError::AgeOutOfRange(17)
        );
        form.age = 66;
        assert!(form.validate(false).is_err());
    }

    #[test]
    fn underweight_donor_is_rejected() {
        let mut form = valid_form();
        form.weight_kg = 44.5;
        assert_eq!(
            form.validate(false).unwrap_err(),
            ValidationError::Underweight(44.5)
        );
    }

    #[test]
    fn phone_numbers_must_have_ten_digits() {
        let mut form = valid_form();
        form.mobile = "98765-43210".to_string();
        assert_eq!(
            form.validate(false).unwrap_err(),
            ValidationError::InvalidPhone { field: "mobile" }
        );
        form.mobile = "9876543210".to_string();
        form.whatsapp = "987654321".to_string();
        assert_eq!(
            form.validate(false).unwrap_err(),
            ValidationError::InvalidPhone { field: "whatsapp" }
        );
    }

    #[test]
    fn blank_name_and_missing_group_are_rejected() {
        let mut form = valid_form();
        form.name = "   ".to_string();
        assert_eq!(form.validate(false).unwrap_err(), ValidationError::MissingName);
        let mut form = valid_form();
        form.blood_group = None;
        assert_eq!(
            form.validate(false).unwrap_err(),
            ValidationError::MissingBloodGroup
        );
    }

    #[test]
    fn address_is_optional_with_device_position() {
        let mut form = valid_form();
        form.address = String::new();
        assert_eq!(
            form.validate(false).unwrap_err(),
            ValidationError::MissingAddress
        );
        assert!(form.validate(true).is_ok());
    }
}
