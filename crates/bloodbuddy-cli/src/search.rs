//! `bloodbuddy search`: one donor search, printed as a table.

use std::sync::Arc;

use bloodbuddy_app::{DonorSearch, SearchLocation, SearchOutcome};
use bloodbuddy_core::{AppConfig, BloodGroup, Coordinate, ResultLimit, SearchFilter};
use clap::{ArgGroup, Args};

use crate::output::print_donor_table;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("location").required(true).args(["address", "lat"])))]
pub(crate) struct SearchArgs {
    /// Free-text place to search around
    #[arg(long)]
    pub address: Option<String>,
    /// Latitude to search around
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude to search around
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
    /// Only donors of this blood group (e.g. O+, ab-)
    #[arg(long)]
    pub blood_group: Option<BloodGroup>,
    /// Maximum number of donors: 10, 20, 50 or 100
    #[arg(long, value_parser = crate::parse_limit)]
    pub limit: Option<ResultLimit>,
}

impl SearchArgs {
    pub(crate) fn location(&self) -> Option<SearchLocation> {
        match (&self.address, self.lat, self.lon) {
            (Some(address), _, _) => Some(SearchLocation::Address(address.clone())),
            (None, Some(lat), Some(lon)) => Some(SearchLocation::Here(Coordinate::new(lat, lon))),
            _ => None,
        }
    }
}

/// Runs one search and prints the result table.
///
/// # Errors
///
/// Returns an error if a client cannot be built or the search fails.
pub(crate) async fn run_search(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let location = args
        .location()
        .ok_or_else(|| anyhow::anyhow!("either --address or --lat/--lon is required"))?;
    let filter = SearchFilter {
        blood_group: args.blood_group,
        limit: args.limit.unwrap_or(config.default_limit),
    };

    let mut search = DonorSearch::new(
        Arc::new(crate::registry_client(config)?),
        Arc::new(crate::geocoder_client(config)?),
        filter,
        config.refresh_threshold_km,
    );

    match search.search(location).await {
        SearchOutcome::Updated(count) => {
            println!("{count} donor(s) near {}", search.center());
            print_donor_table(&search.rows());
            Ok(())
        }
        SearchOutcome::Failed(err) => {
            let message = search.last_error().unwrap_or("search failed").to_string();
            Err(anyhow::anyhow!("{message} ({err})"))
        }
        other => Err(anyhow::anyhow!("search did not complete: {other:?}")),
    }
}
