#![allow(unused)]
//! Medicines catalog: shared defaults versus establishment-registered
//! entries.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use support::*;
use uuid::Uuid;

fn medicine(name: &str, registered: Option<Uuid>) -> Value {
    json!({
        "name": name,
        "pharmaceuticalForm": "COMPRIMIDO",
        "forUse": "HUMAN",
        "establishmentRegistered": registered,
    })
}

fn names(listing: &Value) -> Vec<String> {
    let mut names: Vec<String> = listing
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|m| m["name"].as_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn available_for_selects_the_visible_medicines() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (_status, _headers, other) = app
                .request(
                    Method::POST,
                    "/api/establishments",
                    Some(establishment_body("Hospital Sol", "HS")),
                )
                .await?;
            let other_id: Uuid = serde_json::from_value(other["id"].clone())?;

            for body in [
                medicine("Dipirona", None),
                medicine("Xarope Vida", Some(app.establishment_id)),
                medicine("Pomada Sol", Some(other_id)),
            ] {
                let (status, _headers, _body) =
                    app.request(Method::POST, "/api/medicines", Some(body)).await?;
                assert_status(status, StatusCode::CREATED, "create medicine");
            }

            let (_status, _headers, own) = app
                .request(Method::GET, "/api/medicines?availableFor=establishment", None)
                .await?;
            assert_eq!(names(&own), ["Dipirona", "Xarope Vida"]);

            let (_status, _headers, all) = app
                .request(Method::GET, "/api/medicines?availableFor=all", None)
                .await?;
            assert_eq!(names(&all).len(), 3);

            let (_status, _headers, shared) = app
                .request(Method::GET, "/api/medicines?availableFor=default", None)
                .await?;
            assert_eq!(names(&shared), ["Dipirona"]);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn unknown_owner_is_a_conflict() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/medicines",
                    Some(medicine("Dipirona", Some(Uuid::new_v4()))),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "unknown owner");
            assert_eq!(body["field"], "establishmentRegistered");
            Ok(())
        })
    })
    .await
}
