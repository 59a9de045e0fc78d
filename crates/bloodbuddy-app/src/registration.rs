//! The "become a donor" flow: form state, optional device location with
//! reverse-geocoded address prefill, and submission to the registry.

use std::sync::Arc;

use bloodbuddy_client::{DonorRegistry, Geocoder, NewDonor, RegistryAck};
use bloodbuddy_core::{Coordinate, RegistrationForm};

use crate::error::AppError;
use crate::geolocation::{current_position, PositionSource, TrackerOptions};

pub const REGISTRATION_SUCCESS: &str = "Registration successful! 🎉";
pub const ADDRESS_NOT_FOUND: &str = "Address not found. Please enter valid address.";
pub const LOCATION_DENIED: &str =
    "Location access denied or failed. Please enable permissions or enter address manually.";
pub const ADDRESS_LOOKUP_FAILED: &str = "Failed to fetch address details. Please enter manually.";

/// Where the submitted coordinates will come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocationStatus {
    /// Forward-geocode the typed address at submit time.
    #[default]
    Manual,
    /// Use this device fix; the address is only a label.
    Device(Coordinate),
}

pub struct RegistrationFlow<R, G> {
    registry: Arc<R>,
    geocoder: Arc<G>,
    pub form: RegistrationForm,
    location: LocationStatus,
    message: Option<String>,
}

impl<R, G> RegistrationFlow<R, G>
where
    R: DonorRegistry,
    G: Geocoder,
{
    pub fn new(registry: Arc<R>, geocoder: Arc<G>) -> Self {
        Self {
            registry,
            geocoder,
            form: RegistrationForm::default(),
            location: LocationStatus::Manual,
            message: None,
        }
    }

    #[must_use]
    pub fn location(&self) -> LocationStatus {
        self.location
    }

    /// The banner or alert currently shown to the user.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Forgets the device fix and goes back to typed-address entry.
    pub fn use_manual_address(&mut self) {
        self.location = LocationStatus::Manual;
    }

    /// Takes one fresh fix from `source` and prefills the address from it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PermissionDenied`] when no fix could be taken and
    /// [`AppError::LookupNotFound`] when the fix has no known address. Both
    /// leave the form in manual entry.
    pub async fn use_device_location<P>(
        &mut self,
        source: &P,
        options: TrackerOptions,
    ) -> Result<Coordinate, AppError>
    where
        P: PositionSource + ?Sized,
    {
        let sample = match current_position(source, options).await {
            Ok(sample) => sample,
            Err(err) => {
                tracing::warn!(error = %err, "device location unavailable for registration");
                self.location = LocationStatus::Manual;
                self.message = Some(LOCATION_DENIED.to_string());
                return Err(AppError::PermissionDenied);
            }
        };

        let coordinate = sample.coordinate;
        match self.geocoder.reverse(coordinate).await {
            Ok(address) => {
                self.form.address = address;
                self.location = LocationStatus::Device(coordinate);
                self.message = None;
                Ok(coordinate)
            }
            Err(err) => {
                tracing::warn!(error = %err, %coordinate, "reverse geocoding failed");
                self.location = LocationStatus::Manual;
                self.message = Some(ADDRESS_LOOKUP_FAILED.to_string());
                Err(AppError::lookup(&coordinate.to_string(), &err))
            }
        }
    }

    /// Validates the form and registers the donor. On success the form is
    /// cleared for the next registration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a rule violation,
    /// [`AppError::LookupNotFound`] when the address cannot be placed, and
    /// [`AppError::Registry`] with the registry's own message when the
    /// registry refuses.
    pub async fn submit(&mut self) -> Result<RegistryAck, AppError> {
        let device = match self.location {
            LocationStatus::Device(coordinate) => Some(coordinate),
            LocationStatus::Manual => None,
        };
        let valid = match self.form.validate(device.is_some()) {
            Ok(valid) => valid,
            Err(err) => {
                self.message = Some(err.to_string());
                return Err(err.into());
            }
        };

        let coordinate = match device {
            Some(coordinate) => coordinate,
            None => match self.geocoder.forward(&valid.address).await {
                Ok(coordinate) => coordinate,
                Err(err) => {
                    tracing::info!(address = %valid.address, error = %err, "address not found");
                    self.message = Some(ADDRESS_NOT_FOUND.to_string());
                    return Err(AppError::lookup(&valid.address, &err));
                }
            },
        };

        let donor = NewDonor {
            name: valid.name,
            blood_group: valid.blood_group,
            city: valid.address,
            contact: valid.mobile,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        };
        match self.registry.add_donor(&donor).await {
            Ok(ack) => {
                tracing::info!(id = ?ack.id, blood_group = %donor.blood_group, "donor registered");
                self.message = Some(REGISTRATION_SUCCESS.to_string());
                self.form = RegistrationForm::default();
                self.location = LocationStatus::Manual;
                Ok(ack)
            }
            Err(err) => {
                let err = AppError::registry(&err);
                tracing::warn!(error = %err, "registration rejected");
                self.message = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "registration_test.rs"]
mod tests;
