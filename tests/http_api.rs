mod common;

use actix_web::{App, http::StatusCode, test, web};
use common::*;
use contest_draw_backend::handlers;
use serde_json::{Value, json};

macro_rules! init_app {
    ($db:expr, $seed:expr) => {{
        let (service, _) = service(&$db, $seed);
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.clone()))
                .app_data(web::Data::new(service))
                .configure(handlers::app_config),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_health_reports_database_up() {
    let db = setup_db().await;
    let app = init_app!(db, 1);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");
}

#[actix_web::test]
async fn test_execute_draw_success() {
    let db = setup_db().await;
    let contest = create_contest(&db, "HTTP Draw").await;
    add_participants(&db, contest, 4, true).await;
    let prize = add_prize(&db, contest, "Keyboard", 3).await;
    let app = init_app!(db, 11);

    let req = test::TestRequest::post()
        .uri("/api/v1/draws/execute")
        .set_json(json!({
            "contestId": contest,
            "executedBy": "admin",
            "numberOfWinners": 2,
            "prizeIds": [prize]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["remaining_slots"], 1);
    assert_eq!(body["data"]["draw"]["total_winners"], 2);
    assert_eq!(body["data"]["draw"]["draw_mode"], "random");
    let winners = body["data"]["winners"].as_array().unwrap();
    assert_eq!(winners.len(), 2);
    assert_eq!(winners[0]["prize"]["id"], prize);
    assert!(winners[1]["prize"].is_null());

    let draw_id = body["data"]["draw"]["id"].as_i64().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/draws/{draw_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["winners"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/contests/{contest}/capacity"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total_slots"], 3);
    assert_eq!(body["data"]["issued_winners"], 2);
    assert_eq!(body["data"]["remaining_slots"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/contests/{contest}/draws?page=1&per_page=10"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], draw_id);
}

#[actix_web::test]
async fn test_invalid_requests_return_400() {
    let db = setup_db().await;
    let contest = create_contest(&db, "Validation").await;
    add_participants(&db, contest, 2, true).await;
    add_prize(&db, contest, "Pen", 2).await;
    let app = init_app!(db, 1);

    for payload in [
        json!({ "contest_id": contest, "requested_winner_count": 0 }),
        json!({ "contest_id": contest }),
        json!({ "contest_id": contest, "requested_winner_count": "two" }),
        json!({ "contest_id": contest, "requested_winner_count": 1.5 }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/draws/execute")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {payload}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    }

    assert_eq!(draw_count(&db, contest).await, 0);
}

#[actix_web::test]
async fn test_business_errors_map_to_status_codes() {
    let db = setup_db().await;
    let contest = create_contest(&db, "Errors").await;
    add_participants(&db, contest, 3, true).await;
    add_prize(&db, contest, "Badge", 1).await;
    let empty = create_contest(&db, "Empty").await;
    let app = init_app!(db, 1);

    let cases = [
        (
            json!({ "contest_id": contest, "requested_winner_count": 2 }),
            StatusCode::CONFLICT,
            "INSUFFICIENT_CAPACITY",
        ),
        (
            json!({ "contest_id": contest, "requested_winner_count": 5 }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "INSUFFICIENT_PARTICIPANTS",
        ),
        (
            json!({ "contest_id": empty, "requested_winner_count": 1 }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "NO_ELIGIBLE_PARTICIPANTS",
        ),
        (
            json!({ "contest_id": 9999, "requested_winner_count": 1 }),
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
        ),
    ];

    for (payload, status, code) in cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/draws/execute")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), status, "payload {payload}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], code);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/contests/9999/draws")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/v1/draws/12345").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
