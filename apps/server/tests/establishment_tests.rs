#![allow(unused)]
//! Establishments and units through the HTTP API: uniqueness, address
//! reconciliation and the deactivation lifecycle.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use support::*;

fn with_address(mut body: Value, address: Value) -> Value {
    if let (Some(body), Some(address)) = (body.as_object_mut(), address.as_object()) {
        for (k, v) in address {
            body.insert(k.clone(), v.clone());
        }
    }
    body
}

#[tokio::test]
async fn create_returns_flattened_address() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let body = with_address(
                establishment_body("Hospital Sol", "HS"),
                json!({ "street": "Main St", "number": "12", "city": "Recife" }),
            );
            let (status, _headers, created) =
                app.request(Method::POST, "/api/establishments", Some(body)).await?;
            assert_status(status, StatusCode::CREATED, "create");
            assert_eq!(created["street"], "Main St");
            assert_eq!(created["number"], 12);
            assert_eq!(created["status"], "ACTIVE");
            assert!(created["establishmentAddress"].is_string());

            let id = created["id"].as_str().unwrap_or_default().to_string();
            let (status, _headers, found) = app
                .request(Method::GET, &format!("/api/establishments?id={id}"), None)
                .await?;
            assert_status(status, StatusCode::OK, "detail");
            assert_eq!(found["city"], "Recife");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn duplicate_name_is_a_conflict_on_name() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            // The harness already registered "Clinica Vida".
            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/establishments",
                    Some(establishment_body("Clinica Vida", "OTHER")),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "duplicate");
            assert_eq!(body["error"], "conflict");
            assert_eq!(body["field"], "name");
            assert_eq!(body["message"], "Establishment with same name already exists");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn address_only_update_keeps_the_address_row() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let body = with_address(
                establishment_body("Hospital Sol", "HS"),
                json!({ "street": "Main St", "city": "Recife" }),
            );
            let (_status, _headers, created) =
                app.request(Method::POST, "/api/establishments", Some(body)).await?;
            let id = created["id"].as_str().unwrap_or_default().to_string();

            let update = with_address(
                establishment_body("Hospital Sol", "HS"),
                json!({ "city": "Olinda" }),
            );
            let (status, _headers, updated) = app
                .request(
                    Method::PUT,
                    &format!("/api/establishments?id={id}"),
                    Some(update),
                )
                .await?;
            assert_status(status, StatusCode::OK, "update");
            assert_eq!(updated["city"], "Olinda");
            assert_eq!(updated["street"], "Main St");
            assert_eq!(
                updated["establishmentAddress"],
                created["establishmentAddress"]
            );
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn update_without_id_is_rejected() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, body) = app
                .request(
                    Method::PUT,
                    "/api/establishments",
                    Some(establishment_body("Hospital Sol", "HS")),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "missing id");
            assert_eq!(body["message"], "Id was not provided");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn deactivation_is_idempotent_and_final() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (_status, _headers, created) = app
                .request(
                    Method::POST,
                    "/api/establishments",
                    Some(establishment_body("Hospital Sol", "HS")),
                )
                .await?;
            let id = created["id"].clone();

            for attempt in ["first", "second"] {
                let (status, _headers, _body) = app
                    .request(
                        Method::PATCH,
                        "/api/establishments/deactivate",
                        Some(json!({ "idEstablishmentToDeactivate": id })),
                    )
                    .await?;
                assert_status(status, StatusCode::OK, attempt);
            }

            let mut reactivate = establishment_body("Hospital Sol", "HS");
            reactivate["status"] = json!("ACTIVE");
            let path = format!("/api/establishments?id={}", id.as_str().unwrap_or_default());
            let (status, _headers, body) =
                app.request(Method::PUT, &path, Some(reactivate)).await?;
            assert_status(status, StatusCode::CONFLICT, "reactivation");
            assert_eq!(body["field"], "status");

            let (status, _headers, _body) = app
                .request(
                    Method::PATCH,
                    "/api/establishments/deactivate",
                    Some(json!({ "idEstablishmentToDeactivate": uuid::Uuid::new_v4() })),
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "unknown establishment");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn lists_are_bare_or_paginated() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            for (name, abbreviation) in [("Hospital Sol", "HS"), ("Hospital Lua", "HL")] {
                app.request(
                    Method::POST,
                    "/api/establishments",
                    Some(establishment_body(name, abbreviation)),
                )
                .await?;
            }

            let (status, _headers, all) =
                app.request(Method::GET, "/api/establishments", None).await?;
            assert_status(status, StatusCode::OK, "list");
            assert_eq!(all.as_array().map(Vec::len), Some(3));

            let (_status, _headers, page) = app
                .request(
                    Method::GET,
                    "/api/establishments?page=2&pageSize=2",
                    None,
                )
                .await?;
            assert_eq!(page["totalCount"], 3);
            assert_eq!(page["data"].as_array().map(Vec::len), Some(1));

            let (_status, _headers, found) = app
                .request(Method::GET, "/api/establishments?search=hospital", None)
                .await?;
            assert_eq!(found.as_array().map(Vec::len), Some(2));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn units_require_an_existing_establishment() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let unit = |establishment: Value| {
                json!({
                    "name": "Unidade Norte",
                    "unityType": "BRANCH",
                    "mainPhone": "5581",
                    "email": "norte@example.com",
                    "targetCustomer": "HUMAN",
                    "boundedTo": establishment,
                })
            };

            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/units",
                    Some(unit(json!(uuid::Uuid::new_v4()))),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "orphan unit");
            assert_eq!(body["field"], "unityEstablishment");

            let (status, _headers, created) = app
                .request(
                    Method::POST,
                    "/api/units",
                    Some(unit(json!(app.establishment_id))),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "unit");
            assert_eq!(created["unityEstablishmentAbbreviation"], ORGANIZATION);

            let (status, _headers, units) = app
                .request(
                    Method::GET,
                    &format!("/api/units/from-establishment?id={}", app.establishment_id),
                    None,
                )
                .await?;
            assert_status(status, StatusCode::OK, "units of establishment");
            assert_eq!(units.as_array().map(Vec::len), Some(1));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn unit_duplicate_is_reported_before_a_missing_establishment() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let unit = |email: &str, establishment: Value| {
                json!({
                    "name": "Unidade Sul",
                    "unityType": "BRANCH",
                    "mainPhone": "5581",
                    "email": email,
                    "targetCustomer": "HUMAN",
                    "boundedTo": establishment,
                })
            };

            let (status, _headers, _created) = app
                .request(
                    Method::POST,
                    "/api/units",
                    Some(unit("sul@example.com", json!(app.establishment_id))),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "first unit");

            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/units",
                    Some(unit("outra@example.com", json!(uuid::Uuid::new_v4()))),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "duplicate orphan unit");
            assert_eq!(body["field"], "name");
            assert_eq!(body["message"], "Unity with same name already exists");
            Ok(())
        })
    })
    .await
}
