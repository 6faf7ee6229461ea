mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use talentpool_backend::{
    models::{job_offer::NewJobOffer, user::Role},
    repositories::JobOfferRepository,
};

use common::{offer_payload, TestApp, TestUser};

/// Stored directly so the past expiry skips request validation.
async fn seed_expired_offer(app: &TestApp, recruiter: &TestUser) -> i64 {
    JobOfferRepository::create(
        &app.store,
        NewJobOffer {
            title: "Lapsed posting".into(),
            description: "Still flagged active".into(),
            location: None,
            company_name: "Acme".into(),
            contract_type: "CDI".into(),
            salary_min: None,
            salary_max: None,
            is_active: true,
            expires_at: Some(Utc::now().date_naive() - Duration::days(2)),
            requirements: None,
            benefits: None,
            user_id: recruiter.id,
        },
    )
    .await
    .expect("seed expired offer")
    .id
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/api/job-offers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, _) = app.get("/api/job-offers", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inverted_salary_range_is_rejected_without_creating_a_row() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;

    let mut payload = offer_payload();
    payload["salary_min"] = json!(40000);
    payload["salary_max"] = json!(35000);
    let (status, body) = app
        .request(Method::POST, "/api/job-offers", Some(&recruiter.token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "The given data was invalid.");
    assert!(body["errors"]["salary_max"].is_array());

    let (_, listing) = app.get("/api/job-offers", &recruiter.token).await;
    assert_eq!(listing["job_offers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_contract_type_and_past_expiry_are_field_errors() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;

    let mut payload = offer_payload();
    payload["contract_type"] = json!("Gig");
    payload["expires_at"] = json!((Utc::now().date_naive() - Duration::days(1)).to_string());
    let (status, body) = app
        .request(Method::POST, "/api/job-offers", Some(&recruiter.token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["contract_type"].is_array());
    assert!(body["errors"]["expires_at"].is_array());
}

#[tokio::test]
async fn only_recruiters_create_offers() {
    let app = TestApp::new();
    let candidate = app.user("Carl", Role::Candidate).await;
    let admin = app.user("Ada", Role::Admin).await;

    for token in [&candidate.token, &admin.token] {
        let (status, body) = app
            .request(Method::POST, "/api/job-offers", Some(token), Some(offer_payload()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Unauthorized to create job offers");
    }
}

#[tokio::test]
async fn listing_depends_on_role() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;
    let candidate = app.user("Carl", Role::Candidate).await;

    let open = app.create_offer(&recruiter, json!({})).await;
    let closed = app.create_offer(&recruiter, json!({ "is_active": false })).await;

    let (status, own) = app.get("/api/job-offers", &recruiter.token).await;
    assert_eq!(status, StatusCode::OK);
    let own_ids: Vec<i64> = own["job_offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert!(own_ids.contains(&open) && own_ids.contains(&closed));

    let (_, visible) = app.get("/api/job-offers", &candidate.token).await;
    let visible = visible["job_offers"].as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["id"].as_i64(), Some(open));
    assert_eq!(visible[0]["is_active"], true);
}

#[tokio::test]
async fn show_distinguishes_missing_from_hidden() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;
    let candidate = app.user("Carl", Role::Candidate).await;
    let closed = app.create_offer(&recruiter, json!({ "is_active": false })).await;

    let (status, body) = app.get("/api/job-offers/999999", &candidate.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job offer not found");

    let (status, _) = app
        .get(&format!("/api/job-offers/{}", closed), &candidate.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get(&format!("/api/job-offers/{}", closed), &recruiter.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job_offer"]["id"].as_i64(), Some(closed));
}

#[tokio::test]
async fn foreign_recruiter_cannot_update_or_delete() {
    let app = TestApp::new();
    let owner = app.user("Alice", Role::Recruiter).await;
    let other = app.user("Bob", Role::Recruiter).await;
    let offer = app.create_offer(&owner, json!({})).await;
    let uri = format!("/api/job-offers/{}", offer);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&other.token), Some(json!({ "title": "Taken over" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized or job offer not found");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // a missing offer looks the same as someone else's
    let (status, _) = app
        .request(Method::DELETE, "/api/job-offers/424242", Some(&other.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get(&uri, &owner.token).await;
    assert_eq!(body["job_offer"]["title"], "Rust backend engineer");
}

#[tokio::test]
async fn owner_and_admin_can_update_and_delete() {
    let app = TestApp::new();
    let owner = app.user("Alice", Role::Recruiter).await;
    let admin = app.user("Ada", Role::Admin).await;
    let offer = app.create_offer(&owner, json!({})).await;
    let uri = format!("/api/job-offers/{}", offer);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&owner.token), Some(json!({ "location": "Remote" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job offer updated successfully");
    assert_eq!(body["job_offer"]["location"], "Remote");
    assert_eq!(body["job_offer"]["title"], "Rust backend engineer");

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&owner.token), Some(json!({ "salary_max": 1000 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["salary_max"].is_array());

    let (status, body) = app.request(Method::DELETE, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job offer deleted successfully");

    let (status, _) = app.get(&uri, &owner.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn offer_statistics_are_scoped() {
    let app = TestApp::new();
    let alice = app.user("Alice", Role::Recruiter).await;
    let bob = app.user("Bob", Role::Recruiter).await;
    let admin = app.user("Ada", Role::Admin).await;
    let candidate = app.user("Carl", Role::Candidate).await;

    app.create_offer(&alice, json!({})).await;
    app.create_offer(&alice, json!({ "is_active": false })).await;
    app.create_offer(&bob, json!({})).await;

    let (status, body) = app.get("/api/job-offers/statistics", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["total_offers"], 2);
    assert_eq!(body["statistics"]["active_offers"], 1);
    assert_eq!(body["statistics"]["expired_offers"], 0);

    let (status, _) = app
        .get(&format!("/api/job-offers/statistics?recruiter_id={}", bob.id), &alice.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get(&format!("/api/job-offers/statistics?recruiter_id={}", bob.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["total_offers"], 1);

    let (status, _) = app.get("/api/job-offers/statistics", &candidate.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_or_mistyped_fields_come_back_as_field_errors() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;

    let mut payload = offer_payload();
    payload.as_object_mut().unwrap().remove("title");
    let (status, body) = app
        .request(Method::POST, "/api/job-offers", Some(&recruiter.token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "The given data was invalid.");
    assert_eq!(body["errors"]["title"][0], "The title field is required.");

    let mut payload = offer_payload();
    payload["is_active"] = json!("sometimes");
    let (status, body) = app
        .request(Method::POST, "/api/job-offers", Some(&recruiter.token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["is_active"].is_array());

    let (_, listing) = app.get("/api/job-offers", &recruiter.token).await;
    assert_eq!(listing["job_offers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn update_with_null_clears_optional_fields() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;
    let offer = app.create_offer(&recruiter, json!({})).await;
    let uri = format!("/api/job-offers/{}", offer);

    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&recruiter.token),
            Some(json!({
                "expires_at": null,
                "salary_min": null,
                "salary_max": null,
                "location": null,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let updated = &body["job_offer"];
    assert!(updated["expires_at"].is_null());
    assert!(updated["salary_min"].is_null());
    assert!(updated["salary_max"].is_null());
    assert!(updated["location"].is_null());
    assert_eq!(updated["title"], "Rust backend engineer");
    assert_eq!(updated["company_name"], "Acme");

    let (_, body) = app.get(&uri, &recruiter.token).await;
    assert!(body["job_offer"]["expires_at"].is_null());
    assert!(body["job_offer"]["location"].is_null());
}

#[tokio::test]
async fn expired_offers_are_closed_even_when_flagged_active() {
    let app = TestApp::new();
    let recruiter = app.user("Alice", Role::Recruiter).await;
    let candidate = app.user("Carl", Role::Candidate).await;
    let open = app.create_offer(&recruiter, json!({})).await;
    let expired = seed_expired_offer(&app, &recruiter).await;

    let (_, visible) = app.get("/api/job-offers", &candidate.token).await;
    let ids: Vec<i64> = visible["job_offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![open]);

    let (status, _) = app
        .get(&format!("/api/job-offers/{}", expired), &candidate.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/applications/job/{}", expired),
            Some(&candidate.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Unable to apply"));

    let (status, body) = app.get("/api/job-offers/statistics", &recruiter.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["total_offers"], 2);
    assert_eq!(body["statistics"]["active_offers"], 1);
    assert_eq!(body["statistics"]["expired_offers"], 1);
}
