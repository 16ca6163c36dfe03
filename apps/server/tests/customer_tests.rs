#![allow(unused)]
//! Customers: establishment-scoped uniqueness, responsibility links and the
//! role filter.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use support::*;
use uuid::Uuid;

async fn create_customer(app: &TestApp, body: Value) -> anyhow::Result<Value> {
    let (status, _headers, created) = app.request(Method::POST, "/api/customers", Some(body)).await?;
    assert_status(status, StatusCode::CREATED, "create customer");
    Ok(created)
}

#[tokio::test]
async fn names_are_unique_per_establishment() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            create_customer(app, customer_body("Bia Souza", app.establishment_id)).await?;

            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/customers",
                    Some(customer_body("Bia Souza", app.establishment_id)),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "same establishment");
            assert_eq!(body["field"], "name");

            let (_status, _headers, other) = app
                .request(
                    Method::POST,
                    "/api/establishments",
                    Some(establishment_body("Hospital Sol", "HS")),
                )
                .await?;
            let other_id: Uuid = serde_json::from_value(other["id"].clone())?;
            let created = create_customer(app, customer_body("Bia Souza", other_id)).await?;
            assert_eq!(created["customerEstablishmentAbbreviation"], "HS");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn update_does_not_collide_with_itself() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let mut body = customer_body("Caio Lima", app.establishment_id);
            body["cpf"] = json!("111.222.333-44");
            let created = create_customer(app, body.clone()).await?;
            let id = created["id"].as_str().unwrap_or_default().to_string();

            body["mainPhone"] = json!("5581999990000");
            let (status, _headers, updated) = app
                .request(Method::PUT, &format!("/api/customers?id={id}"), Some(body))
                .await?;
            assert_status(status, StatusCode::OK, "self update");
            assert_eq!(updated["mainPhone"], "5581999990000");
            assert_eq!(updated["cpf"], "111.222.333-44");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn responsible_links_follow_add_and_remove_lists() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let patient = create_customer(app, customer_body("Duda Reis", app.establishment_id)).await?;
            let patient_id = patient["id"].clone();

            let mut responsible = customer_body("Edu Reis", app.establishment_id);
            responsible["isPatient"] = json!(false);
            responsible["isResponsible"] = json!(true);
            responsible["patientsResponsibleIdList"] = json!([patient_id]);
            let created = create_customer(app, responsible.clone()).await?;
            assert_eq!(created["patientResponsibleList"], json!([patient_id]));

            let id = created["id"].as_str().unwrap_or_default().to_string();
            responsible["patientsResponsibleIdList"] = json!([]);
            responsible["patientsResponsibleIdListToRemove"] = json!([patient_id]);
            let (status, _headers, updated) = app
                .request(Method::PUT, &format!("/api/customers?id={id}"), Some(responsible))
                .await?;
            assert_status(status, StatusCode::OK, "remove link");
            assert_eq!(updated["patientResponsibleList"], json!([]));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn tutor_pets_are_listed_by_owner() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let mut tutor = customer_body("Fabi Melo", app.establishment_id);
            tutor["isPatient"] = json!(false);
            tutor["isTutor"] = json!(true);
            tutor["petsList"] = json!([
                { "petName": "Rex", "specie": "dog", "size": "LARGE", "sex": "MALE" },
                { "petName": "Mia", "specie": "cat", "size": "SMALL", "sex": "FEMALE" },
            ]);
            let created = create_customer(app, tutor).await?;
            let owner = created["id"].as_str().unwrap_or_default().to_string();

            let (status, _headers, pets) = app
                .request(Method::GET, &format!("/api/pets?ownerId={owner}"), None)
                .await?;
            assert_status(status, StatusCode::OK, "pets of tutor");
            assert_eq!(pets.as_array().map(Vec::len), Some(2));

            let (_status, _headers, tutors) =
                app.request(Method::GET, "/api/customers?type=tutor", None).await?;
            assert_eq!(tutors.as_array().map(Vec::len), Some(1));
            assert_eq!(tutors[0]["name"], "Fabi Melo");

            let (status, _headers, _body) =
                app.request(Method::GET, "/api/customers?type=owner", None).await?;
            assert_status(status, StatusCode::BAD_REQUEST, "unknown type");
            Ok(())
        })
    })
    .await
}
