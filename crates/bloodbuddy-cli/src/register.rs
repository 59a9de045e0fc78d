//! `bloodbuddy register`: validate the donor form and submit it.

use std::sync::Arc;

use bloodbuddy_app::{PositionSource, PositionStream, RegistrationFlow, TrackerOptions};
use bloodbuddy_core::{AppConfig, BloodGroup, Coordinate, PositionSample, RegistrationForm};
use clap::{ArgGroup, Args};
use futures::stream::StreamExt;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("location").required(true).multiple(true).args(["address", "lat"])))]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub age: u32,
    /// Body weight in kilograms
    #[arg(long)]
    pub weight: f64,
    #[arg(long)]
    pub blood_group: BloodGroup,
    /// 10-digit mobile number
    #[arg(long)]
    pub mobile: String,
    /// 10-digit WhatsApp number
    #[arg(long)]
    pub whatsapp: String,
    /// Donor address; geocoded unless --lat/--lon are given
    #[arg(long)]
    pub address: Option<String>,
    /// Device latitude; the address is looked up from it when omitted
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl RegisterArgs {
    pub(crate) fn form(&self) -> RegistrationForm {
        RegistrationForm {
            name: self.name.clone(),
            age: self.age,
            weight_kg: self.weight,
            blood_group: Some(self.blood_group),
            mobile: self.mobile.clone(),
            whatsapp: self.whatsapp.clone(),
            address: self.address.clone().unwrap_or_default(),
        }
    }
}

/// A position fix given on the command line, stamped when it is read.
struct FixedPosition(Coordinate);

impl PositionSource for FixedPosition {
    fn watch(&self, _options: &TrackerOptions) -> PositionStream {
        let sample = PositionSample::new(self.0, chrono::Utc::now());
        futures::stream::iter([Ok(sample)]).boxed()
    }
}

/// Registers the donor described by `args`.
///
/// # Errors
///
/// Returns an error when a client cannot be built, the form is invalid, the
/// address cannot be placed, or the registry refuses the donor.
pub(crate) async fn run_register(config: &AppConfig, args: &RegisterArgs) -> anyhow::Result<()> {
    let mut flow = RegistrationFlow::new(
        Arc::new(crate::registry_client(config)?),
        Arc::new(crate::geocoder_client(config)?),
    );

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let options = TrackerOptions::with_timeout_ms(config.geolocation_timeout_ms);
        match flow
            .use_device_location(&FixedPosition(Coordinate::new(lat, lon)), options)
            .await
        {
            Ok(_) => println!("address: {}", flow.form.address),
            Err(err) => {
                tracing::warn!(error = %err, "device location not used");
                if let Some(message) = flow.message() {
                    eprintln!("{message}");
                }
            }
        }
    }

    let prefilled = std::mem::take(&mut flow.form.address);
    let mut form = args.form();
    if form.address.trim().is_empty() {
        form.address = prefilled;
    }
    flow.form = form;

    match flow.submit().await {
        Ok(ack) => {
            println!(
                "{} (id {})",
                flow.message().unwrap_or(ack.message.as_str()),
                ack.id.as_deref().unwrap_or("\u{2014}")
            );
            Ok(())
        }
        Err(err) => {
            let message = flow.message().map_or_else(|| err.to_string(), str::to_string);
            Err(anyhow::anyhow!(message))
        }
    }
}
