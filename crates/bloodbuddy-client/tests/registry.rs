//! Integration tests for `RegistryClient` using wiremock HTTP mocks.

use bloodbuddy_client::{ClientError, DonorRegistry, NearbyQuery, NewDonor, RegistryClient};
use bloodbuddy_core::{BloodGroup, Coordinate, ResultLimit, SearchFilter};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> RegistryClient {
    RegistryClient::new(base_url, "test-agent", 30).expect("client construction should not fail")
}

fn amravati_query(blood_group: Option<BloodGroup>) -> NearbyQuery {
    NearbyQuery {
        center: Coordinate::new(20.9374, 77.7796),
        filter: SearchFilter {
            blood_group,
            limit: ResultLimit::Ten,
        },
    }
}

#[tokio::test]
async fn nearby_parses_envelope_in_order() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "count": 2,
        "donors": [
            {
                "name": "Asha Patil",
                "blood_group": "O+",
                "city": "Rajapeth, Amravati",
                "contact": "9876543210",
                "latitude": 20.932,
                "longitude": 77.785,
                "distance_km": 0.82
            },
            {
                "name": "Ravi Deshmukh",
                "blood_group": "O+",
                "city": "Camp, Amravati",
                "contact": "9123456780",
                "latitude": 20.95,
                "longitude": 77.76
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/donors/nearby"))
        .and(query_param("lat", "20.9374"))
        .and(query_param("lon", "77.7796"))
        .and(query_param("blood_group", "O+"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let donors = client
        .nearby(&amravati_query(Some(BloodGroup::OPositive)))
        .await
        .expect("should parse donors");

    assert_eq!(donors.len(), 2);
    assert_eq!(donors[0].name, "Asha Patil");
    assert_eq!(donors[0].blood_group, BloodGroup::OPositive);
    assert_eq!(donors[0].distance_km, Some(0.82));
    assert_eq!(donors[1].name, "Ravi Deshmukh");
    assert_eq!(donors[1].distance_km, None);
    assert_eq!(donors[1].coordinate, Coordinate::new(20.95, 77.76));
}

#[tokio::test]
async fn nearby_accepts_bare_array_and_skips_unknown_groups() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "name": "Asha Patil",
            "blood_group": "B-",
            "city": "Amravati",
            "contact": "9876543210",
            "latitude": 20.932,
            "longitude": 77.785
        },
        {
            "name": "Typo",
            "blood_group": "C+",
            "latitude": 20.9,
            "longitude": 77.7
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/donors/nearby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let donors = client
        .nearby(&amravati_query(None))
        .await
        .expect("should parse donors");

    assert_eq!(donors.len(), 1);
    assert_eq!(donors[0].blood_group, BloodGroup::BNegative);
}

#[tokio::test]
async fn nearby_not_found_is_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/donors/nearby"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "detail": "No donors found" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let donors = client
        .nearby(&amravati_query(Some(BloodGroup::AbNegative)))
        .await
        .expect("404 should mean no donors");
    assert!(donors.is_empty());
}

#[tokio::test]
async fn nearby_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/donors/nearby"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .nearby(&amravati_query(None))
        .await
        .expect_err("500 should fail");
    assert!(
        matches!(err, ClientError::Api { status: 500, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn add_donor_posts_payload() {
    let server = MockServer::start().await;

    let donor = NewDonor {
        name: "Asha Patil".to_string(),
        blood_group: BloodGroup::APositive,
        city: "Rajapeth, Amravati".to_string(),
        contact: "9876543210".to_string(),
        latitude: 20.932,
        longitude: 77.785,
    };

    Mock::given(method("POST"))
        .and(path("/donors/add"))
        .and(body_json(serde_json::json!({
            "name": "Asha Patil",
            "blood_group": "A+",
            "city": "Rajapeth, Amravati",
            "contact": "9876543210",
            "latitude": 20.932,
            "longitude": 77.785
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Donor added successfully",
            "id": "6650f1c2a9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let ack = client.add_donor(&donor).await.expect("should register");
    assert_eq!(ack.message, "Donor added successfully");
    assert_eq!(ack.id.as_deref(), Some("6650f1c2a9"));
}

#[tokio::test]
async fn add_donor_surfaces_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/donors/add"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "detail": "Donor already registered" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let donor = NewDonor {
        name: "Asha".to_string(),
        blood_group: BloodGroup::ONegative,
        city: "Amravati".to_string(),
        contact: "9876543210".to_string(),
        latitude: 20.9,
        longitude: 77.7,
    };
    let err = client.add_donor(&donor).await.expect_err("400 should fail");
    assert_eq!(err.to_string(), "Donor already registered");
}

#[tokio::test]
async fn add_donor_without_message_uses_generic_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/donors/add"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let donor = NewDonor {
        name: "Asha".to_string(),
        blood_group: BloodGroup::ONegative,
        city: "Amravati".to_string(),
        contact: "9876543210".to_string(),
        latitude: 20.9,
        longitude: 77.7,
    };
    let err = client.add_donor(&donor).await.expect_err("502 should fail");
    assert_eq!(err.to_string(), "Registration failed");
}
