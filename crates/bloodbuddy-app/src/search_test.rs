use std::sync::Arc;

use bloodbuddy_core::{BloodGroup, ResultLimit};

use super::*;
use crate::testing::{
    donor, north_of, registry_down, sample, FakeGeocoder, FakeRegistry, AMRAVATI,
};

const RAJAPETH: &str = "Rajapeth, Amravati";

fn b_positive() -> SearchFilter {
    SearchFilter {
        blood_group: Some(BloodGroup::BPositive),
        limit: ResultLimit::Twenty,
    }
}

fn screen(
    filter: SearchFilter,
) -> (
    DonorSearch<FakeRegistry, FakeGeocoder>,
    Arc<FakeRegistry>,
) {
    let registry = Arc::new(FakeRegistry::default());
    let geocoder = Arc::new(FakeGeocoder::default().with_place(RAJAPETH, north_of(AMRAVATI, 1.0)));
    (
        DonorSearch::new(Arc::clone(&registry), geocoder, filter, 0.5),
        registry,
    )
}

fn first_result() -> Vec<Donor> {
    vec![
        donor("Asha Patil", BloodGroup::BPositive, north_of(AMRAVATI, 0.4)),
        donor("Ravi Deshmukh", BloodGroup::BPositive, north_of(AMRAVATI, 1.2)),
    ]
}

#[test]
fn starts_centered_on_amravati() {
    let (search, _) = screen(b_positive());
    assert_eq!(search.center(), DEFAULT_CENTER);
    assert!(search.donors().is_empty());
    assert_eq!(search.button_label(), "Find Donors");
    assert!(search.baseline().is_none());
}

#[tokio::test]
async fn blank_address_is_rejected_without_io() {
    let (mut search, registry) = screen(b_positive());
    let outcome = search.search(SearchLocation::Address("   ".to_string())).await;
    assert_eq!(
        outcome,
        SearchOutcome::Failed(AppError::LookupNotFound(
            EMPTY_LOCATION_MESSAGE.to_string()
        ))
    );
    assert_eq!(search.last_error(), Some("Please enter a location!"));
    assert_eq!(registry.query_count(), 0);
    assert!(!search.is_loading());
}

#[tokio::test]
async fn address_search_geocodes_recenters_and_sets_baseline() {
    let (mut search, registry) = screen(b_positive());
    registry.push_nearby(Ok(first_result()));

    let pending = search
        .submit(SearchLocation::Address(format!("  {RAJAPETH} ")))
        .unwrap();
    assert!(search.is_loading());
    assert_eq!(search.button_label(), "Searching...");

    let outcome = search.apply(pending.await);
    assert_eq!(outcome, SearchOutcome::Updated(2));
    assert!(!search.is_loading());
    assert_eq!(search.center(), north_of(AMRAVATI, 1.0));
    assert_eq!(search.baseline(), Some(north_of(AMRAVATI, 1.0)));

    let queries = registry.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].center, north_of(AMRAVATI, 1.0));
    assert_eq!(queries[0].filter, b_positive());

    let rows = search.rows();
    assert_eq!(rows[0].name, "Asha Patil");
    assert_eq!(rows[0].distance, "0.40");
}

#[tokio::test]
async fn unknown_address_shows_search_error() {
    let (mut search, registry) = screen(b_positive());
    let outcome = search
        .search(SearchLocation::Address("Atlantis".to_string()))
        .await;
    assert!(matches!(
        outcome,
        SearchOutcome::Failed(AppError::LookupNotFound(_))
    ));
    assert_eq!(search.last_error(), Some(SEARCH_FAILED_MESSAGE));
    assert_eq!(registry.query_count(), 0);
}

#[tokio::test]
async fn failed_search_keeps_list_and_baseline() {
    let (mut search, registry) = screen(b_positive());
    registry.push_nearby(Ok(first_result()));
    search.search(SearchLocation::Here(AMRAVATI)).await;

    registry.push_nearby(Err(registry_down()));
    let outcome = search
        .search(SearchLocation::Here(north_of(AMRAVATI, 5.0)))
        .await;

    assert_eq!(
        outcome,
        SearchOutcome::Failed(AppError::Registry("registry unavailable".to_string()))
    );
    assert_eq!(search.donors(), first_result().as_slice());
    assert_eq!(search.baseline(), Some(AMRAVATI));
    assert_eq!(search.center(), AMRAVATI);
    assert_eq!(search.last_error(), Some(SEARCH_FAILED_MESSAGE));
}

#[tokio::test]
async fn failed_proximity_refresh_keeps_list_and_retries() {
    let (mut search, registry) = screen(b_positive());
    registry.push_nearby(Ok(first_result()));
    search.search(SearchLocation::Here(AMRAVATI)).await;

    registry.push_nearby(Err(registry_down()));
    let outcome = search.refresh(&sample(north_of(AMRAVATI, 0.6), 1)).await;
    assert!(matches!(outcome, SearchOutcome::Failed(AppError::Registry(_))));
    assert_eq!(search.donors(), first_result().as_slice());
    assert_eq!(search.baseline(), Some(AMRAVATI));

    let moved = vec![donor("Meena Joshi", BloodGroup::BPositive, north_of(AMRAVATI, 0.7))];
    registry.push_nearby(Ok(moved.clone()));
    let outcome = search.refresh(&sample(north_of(AMRAVATI, 0.7), 2)).await;
    assert_eq!(outcome, SearchOutcome::Updated(1));
    assert_eq!(search.donors(), moved.as_slice());
    assert_eq!(search.baseline(), Some(north_of(AMRAVATI, 0.7)));
    // The user's search center is not moved by a refresh.
    assert_eq!(search.center(), AMRAVATI);
}

#[tokio::test]
async fn successful_refresh_clears_earlier_search_error() {
    let (mut search, registry) = screen(b_positive());
    registry.push_nearby(Ok(first_result()));
    search.search(SearchLocation::Here(AMRAVATI)).await;

    registry.push_nearby(Err(registry_down()));
    search
        .search(SearchLocation::Here(north_of(AMRAVATI, 5.0)))
        .await;
    assert_eq!(search.last_error(), Some(SEARCH_FAILED_MESSAGE));

    registry.push_nearby(Ok(first_result()));
    let outcome = search.refresh(&sample(north_of(AMRAVATI, 0.6), 1)).await;
    assert_eq!(outcome, SearchOutcome::Updated(2));
    assert_eq!(search.last_error(), None);
}

#[tokio::test]
async fn refresh_needs_threshold_and_blood_group() {
    let (mut search, registry) = screen(b_positive());
    assert_eq!(
        search.refresh(&sample(north_of(AMRAVATI, 3.0), 0)).await,
        SearchOutcome::Skipped(SkipReason::NoBaseline)
    );

    search.search(SearchLocation::Here(AMRAVATI)).await;
    assert_eq!(
        search.refresh(&sample(north_of(AMRAVATI, 0.3), 1)).await,
        SearchOutcome::Skipped(SkipReason::BelowThreshold)
    );
    assert_eq!(registry.query_count(), 1);

    search.set_filter(SearchFilter::default());
    assert_eq!(
        search.refresh(&sample(north_of(AMRAVATI, 10.0), 2)).await,
        SearchOutcome::Skipped(SkipReason::NoBloodGroup)
    );
    assert_eq!(registry.query_count(), 1);
}

#[tokio::test]
async fn newer_search_supersedes_older_response() {
    let (mut search, registry) = screen(b_positive());
    registry.push_nearby(Ok(first_result()));
    registry.push_nearby(Ok(Vec::new()));

    let older = search.submit(SearchLocation::Here(AMRAVATI)).unwrap();
    let newer = search
        .submit(SearchLocation::Here(north_of(AMRAVATI, 2.0)))
        .unwrap();

    let older = older.await;
    let newer = newer.await;
    assert_eq!(search.apply(older), SearchOutcome::Superseded);
    assert!(search.is_loading());
    assert_eq!(search.apply(newer), SearchOutcome::Updated(0));
    assert!(!search.is_loading());
    assert_eq!(search.queries_issued(), 2);
    assert_eq!(search.baseline(), Some(north_of(AMRAVATI, 2.0)));
}

#[tokio::test]
async fn refresh_is_not_stacked_while_one_is_running() {
    let (mut search, _registry) = screen(b_positive());
    search.search(SearchLocation::Here(AMRAVATI)).await;

    let first = search.on_position(&sample(north_of(AMRAVATI, 0.6), 1));
    assert!(first.is_ok());
    let second = search.on_position(&sample(north_of(AMRAVATI, 0.9), 2));
    assert!(matches!(second, Err(SkipReason::InFlight)));
}
