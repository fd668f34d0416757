mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{ADMIN_NAME, Part, TestApp, deposit_fields, spawn_app};

async fn notifications(app: &TestApp, token: &str) -> Vec<Value> {
    let (status, body) = app.get("/notifications", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    body["notifications"].as_array().unwrap().clone()
}

async fn set_status(app: &TestApp, admin: &str, id: &str, body: Value) -> (StatusCode, Value) {
    app.json(
        Method::PUT,
        &format!("/admin/deposits/{}/status", id),
        Some(admin),
        body,
    )
    .await
}

#[tokio::test]
async fn deposit_lifecycle_end_to_end() {
    let app = spawn_app().await;
    let token = app.register("Sari", "sari@sekolah.id").await;
    let admin = app.admin_token().await;

    let (status, body) = app.create_deposit(&token, "organic", "3").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Waste deposit created successfully");
    let id = body["deposit"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get("/deposits", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let deposits = body["deposits"].as_array().unwrap();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0]["status"], "pending");
    assert_eq!(deposits[0]["weight"], Value::Null);
    assert_eq!(deposits[0]["bin_count"], 3);
    assert_eq!(deposits[0]["pickup_date"], "2024-05-20");
    assert!(deposits[0]["created_at"].as_str().unwrap().ends_with("+07:00"));

    // Submission notice
    let before = notifications(&app, &token).await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0]["title"], "Penyetoran Berhasil");

    let (status, body) = set_status(&app, &admin, &id, json!({ "status": "proses" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Deposit updated successfully");
    assert_eq!(body["deposit"]["status"], "proses");
    assert_eq!(body["deposit"]["picker_name"], ADMIN_NAME);

    let after = notifications(&app, &token).await;
    assert_eq!(after.len(), 2);
    assert_eq!(after[0]["type"], "deposit_update");
    assert_eq!(after[0]["deposit_id"], id.as_str());
    assert!(after[0]["message"].as_str().unwrap().contains(ADMIN_NAME));

    let (status, body) = set_status(&app, &admin, &id, json!({ "status": "completed", "weight": 12.5 })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["deposit"]["status"], "completed");
    assert_eq!(body["deposit"]["weight"], 12.5);
    assert_eq!(body["deposit"]["picker_name"], ADMIN_NAME);

    let after = notifications(&app, &token).await;
    assert_eq!(after.len(), 4);
    assert!(after[0]["message"].as_str().unwrap().contains("12.5"));
    assert_eq!(after[1]["title"], "Penyaluran Berhasil");
}

#[tokio::test]
async fn reapplying_a_terminal_status_is_silent() {
    let app = spawn_app().await;
    let token = app.register("Sari", "sari@sekolah.id").await;
    let admin = app.admin_token().await;

    let (_, body) = app.create_deposit(&token, "anorganik", "2").await;
    let id = body["deposit"]["id"].as_str().unwrap().to_string();

    let (status, _) = set_status(&app, &admin, &id, json!({ "status": "rejected" })).await;
    assert_eq!(status, StatusCode::OK);
    let count = notifications(&app, &token).await.len();

    let (status, body) = set_status(&app, &admin, &id, json!({ "status": "rejected" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deposit"]["status"], "rejected");
    assert_eq!(notifications(&app, &token).await.len(), count);
}

#[tokio::test]
async fn status_updates_are_validated() {
    let app = spawn_app().await;
    let token = app.register("Sari", "sari@sekolah.id").await;
    let admin = app.admin_token().await;

    let (_, body) = app.create_deposit(&token, "organic", "1").await;
    let id = body["deposit"]["id"].as_str().unwrap().to_string();

    let (status, body) = set_status(&app, &admin, &id, json!({ "status": "selesai" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid status"));

    // pending cannot skip straight to completed
    let (status, _) = set_status(&app, &admin, &id, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = set_status(&app, &admin, &id, json!({ "weight": -3 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = set_status(&app, &admin, &id, json!({ "weight": "abc" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = set_status(
        &app,
        &admin,
        "00000000-0000-0000-0000-000000000000",
        json!({ "status": "proses" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get(&format!("/deposits/{}", id), Some(&token)).await;
    assert_eq!(body["deposit"]["status"], "pending");

    // unrecognised keys are ignored
    let (status, body) = set_status(
        &app,
        &admin,
        &id,
        json!({ "status": "proses", "note": "truk datang sore" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["deposit"]["status"], "proses");
}

#[tokio::test]
async fn invalid_submissions_create_nothing() {
    let app = spawn_app().await;
    let token = app.register("Sari", "sari@sekolah.id").await;

    let (status, _) = app.create_deposit(&token, "organic", "0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.create_deposit(&token, "organic", "tiga").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .multipart(
            Method::POST,
            "/deposits",
            Some(&token),
            &deposit_fields("organic", "3", "2024-05-20"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use DD/MM/YYYY");

    let mut fields = deposit_fields("organic", "3", "20/05/2024");
    fields.retain(|part| !matches!(part, Part::Text("address", _)));
    let (status, body) = app
        .multipart(Method::POST, "/deposits", Some(&token), &fields)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("address"));

    let (status, body) = app
        .json(
            Method::POST,
            "/deposits",
            Some(&token),
            json!({ "waste_type": "organic", "bin_count": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, body) = app.get("/deposits", Some(&token)).await;
    assert_eq!(body["deposits"], json!([]));
    assert!(notifications(&app, &token).await.is_empty());
}

#[tokio::test]
async fn deposits_are_owner_scoped() {
    let app = spawn_app().await;
    let sari = app.register("Sari", "sari@sekolah.id").await;
    let budi = app.register("Budi", "budi@sekolah.id").await;

    let (_, body) = app.create_deposit(&sari, "organic", "3").await;
    let id = body["deposit"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.get(&format!("/deposits/{}", id), Some(&sari)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/deposits/{}", id), Some(&budi)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Deposit not found");

    let (_, body) = app.get("/deposits", Some(&budi)).await;
    assert_eq!(body["deposits"], json!([]));

    let admin = app.admin_token().await;
    let (_, body) = app.get("/admin/deposits", Some(&admin)).await;
    let all = body["deposits"].as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], id.as_str());
    assert_eq!(all[0]["user"]["email"], "sari@sekolah.id");
}

#[tokio::test]
async fn photo_upload_replaces_the_proof() {
    let app = spawn_app().await;
    let sari = app.register("Sari", "sari@sekolah.id").await;
    let budi = app.register("Budi", "budi@sekolah.id").await;

    let mut fields = deposit_fields("organic", "3", "20/05/2024");
    fields.push(Part::File {
        name: "photo",
        file_name: "awal.jpg",
        data: b"first",
    });
    let (status, body) = app
        .multipart(Method::POST, "/deposits", Some(&sari), &fields)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["deposit"]["id"].as_str().unwrap().to_string();
    let first = body["deposit"]["photo_proof"].as_str().unwrap().to_string();
    assert!(first.starts_with("/uploads/deposits/"));

    let path = format!("/deposits/{}/photo", id);
    let photo = [Part::File {
        name: "photo",
        file_name: "bukti.JPG",
        data: b"second",
    }];

    let (status, _) = app.multipart(Method::POST, &path, Some(&budi), &photo).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .multipart(Method::POST, &path, Some(&sari), &[Part::Text("note", "x")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");

    let (status, body) = app.multipart(Method::POST, &path, Some(&sari), &photo).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Photo uploaded successfully");
    let second = body["photo_path"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let stored = app
        .uploads
        .path()
        .join(second.trim_start_matches("/uploads/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"second");

    let (_, body) = app.get(&format!("/deposits/{}", id), Some(&sari)).await;
    assert_eq!(body["deposit"]["photo_proof"], second.as_str());
}
