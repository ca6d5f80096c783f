use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use deployment::Deployment;
use local_deployment::LocalDeployment;
use serde_json::{Value, json};
use server::routes;
use tower::ServiceExt;

async fn setup() -> (Router, LocalDeployment) {
    let deployment = LocalDeployment::in_memory().await.unwrap();
    (routes::router(deployment.clone()), deployment)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn create_location(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/locations",
        Some(json!({ "name": name, "latitude": -34.9, "longitude": -56.16 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_i64().unwrap()
}

async fn create_crop(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/crops",
        Some(json!({
            "name": "Soybean",
            "scientificName": "Glycine max",
            "cropType": "Soybean",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["cropType"], "soybean");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn user_lifecycle() {
    let (app, _) = setup().await;
    let user = json!({
        "username": "grower",
        "password": "correct horse",
        "email": "grower@example.com",
    });

    let (status, body) = send(&app, Method::POST, "/api/users", Some(user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"].get("passwordHash").is_none());
    assert_eq!(body["data"]["preferences"]["temperatureUnit"], "celsius");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::POST, "/api/users", Some(user)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::GET, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "grower");

    let (status, _) = send(&app, Method::GET, "/api/users/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let login = json!({ "username": "grower", "password": "correct horse" });
    let (status, _) = send(&app, Method::POST, "/api/users/login", Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    let login = json!({ "username": "grower", "password": "wrong" });
    let (status, _) = send(&app, Method::POST, "/api/users/login", Some(login)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{id}/preferences"),
        Some(json!({ "temperatureUnit": "fahrenheit", "theme": "dark" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["preferences"]["temperatureUnit"], "fahrenheit");
    assert_eq!(body["data"]["preferences"]["windSpeedUnit"], "kmh");

    let uri = format!("/api/users/{id}/preferences");
    let (_, body) = send(&app, Method::PATCH, &uri, Some(json!({ "defaultLocation": 7 }))).await;
    assert_eq!(body["data"]["preferences"]["defaultLocation"], 7);
    let (status, body) =
        send(&app, Method::PATCH, &uri, Some(json!({ "defaultLocation": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["preferences"]["defaultLocation"].is_null());
    assert_eq!(body["data"]["preferences"]["theme"], "dark");
}

#[tokio::test]
async fn invalid_user_reports_every_field() {
    let (app, _) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "username": "", "password": "123", "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["error_data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "username": "no-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn locations_are_validated_and_listed() {
    let (app, _) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/locations",
        Some(json!({ "name": "Nowhere", "latitude": 95.0, "longitude": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_data"]["errors"][0]["field"], "latitude");

    create_location(&app, "Montevideo").await;
    let (status, body) = send(&app, Method::GET, "/api/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/locations/nearby?lat=-34.8&lng=-56.2&radiusKm=30",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Montevideo");

    let (status, body) = send(&app, Method::GET, "/api/locations/nearby?lat=0&lng=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/locations",
        Some(json!({ "name": "Orphan", "latitude": 0.0, "longitude": 0.0, "userId": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weather_views() {
    let (app, _) = setup().await;

    let (status, _) = send(&app, Method::GET, "/api/weather/current", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let location_id = create_location(&app, "Salto").await;
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/weather/current?locationId={location_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let now = Utc::now();
    let reading = |timestamp: chrono::DateTime<Utc>, data_type: &str| {
        json!({
            "locationId": location_id,
            "timestamp": timestamp,
            "temperature": 24.0,
            "windSpeed": 18.0,
            "windDirection": 180.0,
            "precipitation": 55.0,
            "dataType": data_type,
        })
    };
    for (timestamp, data_type) in [
        (now - Duration::minutes(10), "current"),
        (now + Duration::days(1), "forecast"),
        (now - Duration::days(2), "historical"),
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/weather",
            Some(reading(timestamp, data_type)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/weather/current?locationId={location_id}&temperatureUnit=fahrenheit"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["temperature"], 24.0);
    assert_eq!(body["data"]["display"]["temperature"], "75°F");
    assert_eq!(body["data"]["display"]["windDirection"], "S");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/weather/forecast?locationId={location_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["condition"], "Cloudy");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/weather/forecast?locationId={location_id}&days=0"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::GET, "/api/weather/forecast?days=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/weather/historical?locationId={location_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!(
            "/api/weather/historical?locationId={location_id}&startDate=2024-05-10&endDate=2024-05-01"
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/weather/historical/chart?locationId={location_id}&metric=windSpeed"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["points"][0]["value"], 18.0);
    assert_eq!(body["data"]["color"], "#14b8a6");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/weather/dashboard?locationId={location_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"]["name"], "Salto");
    assert_eq!(body["data"]["forecast"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn export_returns_a_file() {
    let (app, _) = setup().await;
    let location_id = create_location(&app, "Rivera").await;

    let (status, headers, bytes) = send_raw(
        &app,
        Method::GET,
        &format!("/api/weather/export?locationId={location_id}&format=csv"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"weather-rivera-")
    );
    assert!(String::from_utf8(bytes).unwrap().starts_with("location,timestamp"));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/weather/export?locationId={location_id}&format=xlsx"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn crop_stages_risks_and_recommendations() {
    let (app, _) = setup().await;
    let crop_id = create_crop(&app).await;
    let location_id = create_location(&app, "Young").await;

    for (name, start, end, critical, order) in [
        ("VE", 0, 10, false, 1),
        ("R1", 40, 50, true, 2),
        ("R5", 70, 90, true, 3),
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/crops/{crop_id}/stages"),
            Some(json!({
                "name": name,
                "label": name,
                "dayRangeStart": start,
                "dayRangeEnd": end,
                "isCritical": critical,
                "sortOrder": order,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/crops/999/stages",
        Some(json!({
            "name": "X", "label": "X", "dayRangeStart": 0, "dayRangeEnd": 1, "sortOrder": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &format!("/api/crops/{crop_id}/view"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stages"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["currentStage"]["name"], "R5");

    let uri = format!("/api/crops/{crop_id}/view?stageId=9999");
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["currentStage"].is_null());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/risks",
        Some(json!({
            "locationId": location_id,
            "cropId": crop_id,
            "date": "2025-01-15",
            "riskType": "drought",
            "riskLevel": 60,
            "probability": 0.7,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/risks",
        Some(json!({
            "locationId": location_id,
            "cropId": crop_id,
            "date": "2025-01-15",
            "riskType": "drought",
            "riskLevel": 160,
            "probability": 0.7,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/risks?cropId={crop_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/recommendations",
        Some(json!({
            "cropId": crop_id,
            "riskType": "drought",
            "title": "Irrigate",
            "body": "Soil moisture is low.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["priority"], "high");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/crops/{crop_id}/recommendations"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["title"], "Irrigate");
}

#[tokio::test]
async fn fields_and_plantings() {
    let (app, _) = setup().await;
    let crop_id = create_crop(&app).await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "username": "farmer", "password": "secret1", "email": "f@example.com" })),
    )
    .await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/fields",
        Some(json!({ "userId": user_id, "name": "Lote 4", "areaHectares": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/fields",
        Some(json!({ "userId": user_id, "name": "Lote 4", "areaHectares": 35.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let field_id = body["data"]["id"].as_i64().unwrap();

    let planting_date = (Utc::now() - Duration::days(3)).date_naive();
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/fields/{field_id}/plantings"),
        Some(json!({ "cropId": crop_id, "plantingDate": planting_date })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/fields/{field_id}/plantings"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["daysSincePlanting"], 3);
    assert_eq!(body["data"][0]["cropName"], "Soybean");
    assert!(body["data"][0]["currentStage"].is_null());

    let (status, body) = send(&app, Method::GET, &format!("/api/fields?userId={user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (status, _) = send(&app, Method::GET, "/api/fields/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn regional_risk_table() {
    let (app, _) = setup().await;
    for (region, drought, frost) in [("Norte", 70, 5), ("Este", 30, 80), ("Litoral", 65, 10)] {
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/risks/regional",
            Some(json!({
                "regionName": region,
                "drought": drought,
                "frost": frost,
                "hail": 10,
                "flood": 10,
                "heat": 10,
                "disease": 10,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, Method::GET, "/api/risks/regional", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["regionName"], "Este");
    assert_eq!(body["data"][0]["highestRisk"], "frost");
    assert_eq!(body["data"][0]["highestRiskBand"], "high");

    let (status, body) = send(&app, Method::GET, "/api/risks/regional?sort=drought", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["regionName"], "Norte");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/risks/regional?sort=drought&direction=asc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["regionName"], "Este");

    let (status, _) = send(&app, Method::GET, "/api/risks/regional?sort=tornado", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn map_layers_and_markers() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/map/layers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 7);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({ "username": "mapper", "password": "secret1", "email": "m@example.com" })),
    )
    .await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{user_id}/map-layers/clouds"),
        Some(json!({ "isVisible": true, "opacity": 250 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][3]["id"], "clouds");
    assert_eq!(body["data"][3]["isVisible"], true);
    assert_eq!(body["data"][3]["opacity"], 100);

    let (status, body) = send(&app, Method::GET, &format!("/api/map/layers?userId={user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][3]["isVisible"], true);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{user_id}/map-layers/snow"),
        Some(json!({ "toggle": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/users/{user_id}/map-layers/reset"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][3]["isVisible"], false);

    create_location(&app, "Tacuarembó").await;
    let (status, body) = send(&app, Method::GET, "/api/map/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"][0]["current"].is_null());
}

#[tokio::test]
async fn health_and_storage_failures() {
    let (app, deployment) = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isInitialized"], true);

    deployment.db().pool.close().await;
    let (status, body) = send(&app, Method::GET, "/api/locations", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}
