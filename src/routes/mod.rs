use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, trips, vehicles};
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // IP-based governor for public routes
    let public_governor = create_public_governor();
    // Per-user governor for authenticated routes
    let user_governor = create_user_governor();

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Trip search is open to travellers without an account
    let public_routes = Router::new()
        .route("/trips/search", get(trips::search_trips))
        .layer(public_governor);

    // Driver routes (requires auth)
    let driver_routes = Router::new()
        .route("/trips", post(trips::create_trip))
        .route("/trips/planned", get(trips::planned_trips))
        .route("/vehicles", get(vehicles::my_vehicles).post(vehicles::add_vehicle))
        .layer(user_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes.merge(driver_routes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::ConnectInfo,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::repository::memory::InMemoryRepository;
    use crate::services::location::tests::StubGeocoder;
    use crate::utils::jwt::create_token;

    const SECRET: &str = "router-test-secret";

    fn app() -> Router {
        let config = Config {
            database_url: String::new(),
            jwt_secret: SECRET.to_string(),
            jwt_expiration_hours: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            geocoder_url: String::new(),
            geocoder_user_agent: String::new(),
        };

        create_router(AppState::new(
            config,
            Arc::new(InMemoryRepository::new()),
            Arc::new(StubGeocoder::default()),
        ))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let mut request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        // IP governors key on the peer address
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn register(app: &Router, email: &str) -> String {
        let body = json!({ "email": email, "password": "correct horse", "name": "Dana" });
        let (status, json) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(&body.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        json["token"].as_str().unwrap().to_string()
    }

    async fn register_driver(app: &Router, email: &str) -> String {
        let token = register(app, email).await;
        let vehicle = json!({ "make": "VW", "model": "Golf", "license_plate": email });
        let (status, _) = send(
            app,
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(&vehicle.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        token
    }

    fn trip_body(total_seats: i32) -> String {
        json!({
            "start_latitude": 52.52,
            "start_longitude": 13.405,
            "end_latitude": 48.137,
            "end_longitude": 11.575,
            "departure_time": "31.12.2099 10:00",
            "total_seats": total_seats,
            "price_per_seat": 25.0,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_list_and_search_trip() {
        let app = app();
        let token = register_driver(&app, "dana@example.com").await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/trips",
            Some(&token),
            Some(&trip_body(3)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Trip created successfully");
        assert_eq!(created["trip"]["total_seats"], 3);
        assert_eq!(created["trip"]["available_seats"], 3);
        assert_eq!(created["trip"]["departure_time"], "2099-12-31T10:00:00Z");

        let (status, planned) =
            send(&app, Method::GET, "/api/trips/planned", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(planned["trips"].as_array().unwrap().len(), 1);
        assert_eq!(planned["trips"][0]["id"], created["trip"]["id"]);

        // Search needs no token
        let (status, found) = send(
            &app,
            Method::GET,
            "/api/trips/search?start_city=Berlin&end_city=Munich",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["trips"].as_array().unwrap().len(), 1);
        assert_eq!(found["trips"][0]["driver"]["name"], "Dana");

        let (status, found) = send(
            &app,
            Method::GET,
            "/api/trips/search?start_city=berlin&end_city=Munich",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, json!({ "trips": [] }));
    }

    #[tokio::test]
    async fn test_driver_routes_require_token() {
        let app = app();

        let (status, body) =
            send(&app, Method::POST, "/api/trips", None, Some(&trip_body(3))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, body) =
            send(&app, Method::GET, "/api/trips/planned", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let forged = create_token(Uuid::new_v4(), "x@example.com", "other-secret", 1).unwrap();
        let (status, _) = send(&app, Method::GET, "/api/vehicles", Some(&forged), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_driver_without_vehicle_gets_bad_request() {
        let app = app();
        let token = register(&app, "novehicle@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/trips",
            Some(&token),
            Some(&trip_body(3)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Driver must add a vehicle before planning a trip");
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let app = app();
        let token = register_driver(&app, "dana@example.com").await;

        let (status, body) =
            send(&app, Method::POST, "/api/trips", Some(&token), Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/trips",
            Some(&token),
            Some(&trip_body(0)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"][0]["field"], "total_seats");
    }

    #[tokio::test]
    async fn test_unknown_user_with_malformed_body_is_unauthorized() {
        let app = app();
        let token = create_token(Uuid::new_v4(), "gone@example.com", SECRET, 1).unwrap();

        let (status, body) =
            send(&app, Method::POST, "/api/trips", Some(&token), Some("{not json")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized: Invalid driver ID");
    }

    #[tokio::test]
    async fn test_search_query_errors_are_json() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/trips/search?start_city=Berlin",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Start city and end city are required");

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/trips/search?start_city=Berlin&start_city=Bonn&end_city=Munich",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
