//! BDD step definitions for history query feature

use axum::body::Body;
use axum::http::Request;
use cucumber::{given, then, when};
use tokio::sync::watch;
use tower::ServiceExt;

use weather_station::server::{build_router, ApiState};
use weather_station::{new_history, QueryParams, Reading};

use crate::world::WeatherWorld;

fn parse_temperatures(list: &str) -> Vec<f64> {
    list.split(',')
        .map(|t| t.trim().parse().expect("temperature must be a number"))
        .collect()
}

#[given("an empty history")]
fn empty_history(world: &mut WeatherWorld) {
    let (_writer, reader) = new_history(None);
    world.history = Some(reader);
}

#[given(expr = "a history with temperatures {string} recorded every {int} seconds")]
async fn history_with_temperatures(world: &mut WeatherWorld, temps: String, spacing: i64) {
    let (mut writer, reader) = new_history(None);
    for (i, temperature) in parse_temperatures(&temps).into_iter().enumerate() {
        writer
            .append(Reading {
                time: i as i64 * spacing,
                temperature,
                pressure: 1000.0,
                humidity: None,
                board_temperature: None,
            })
            .await;
    }
    world.history = Some(reader);
}

#[when(expr = "I query {int} readings at interval {int}")]
async fn query_history(world: &mut WeatherWorld, readings: i64, interval: i64) {
    let history = world.history.as_ref().expect("history not set");
    match QueryParams::new(readings, interval) {
        Ok(params) => {
            world.buckets = history.query(params).await;
            world.query_error = None;
        }
        Err(e) => {
            world.buckets.clear();
            world.query_error = Some(e);
        }
    }
}

#[when(expr = "the history endpoint is requested with {string}")]
async fn request_history(world: &mut WeatherWorld, query: String) {
    let history = world.history.clone().expect("history not set");
    let (_tx, current) = watch::channel(None);
    let router = build_router(ApiState { history, current }, None);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/history{}", query))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    world.response_status = Some(response.status().as_u16());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.response_json = Some(serde_json::from_slice(&body).unwrap());
}

#[then(expr = "the response has {int} bucket(s)")]
fn bucket_count(world: &mut WeatherWorld, count: usize) {
    assert!(world.query_error.is_none(), "query failed: {:?}", world.query_error);
    assert_eq!(world.buckets.len(), count);
}

#[then(expr = "bucket {int} has time {int} and temperature {float}")]
fn bucket_values(world: &mut WeatherWorld, index: usize, time: i64, temperature: f64) {
    let bucket = &world.buckets[index - 1];
    assert_eq!(bucket.time, time);
    assert!(
        (bucket.temperature - temperature).abs() < 1e-9,
        "expected temperature {}, got {}",
        temperature,
        bucket.temperature
    );
}

#[then(expr = "the query is rejected mentioning {string}")]
fn query_rejected(world: &mut WeatherWorld, name: String) {
    let err = world.query_error.as_ref().expect("query was not rejected");
    assert!(
        err.to_string().contains(&name),
        "error '{}' does not mention '{}'",
        err,
        name
    );
}

#[then(expr = "the response status is {int}")]
fn response_status(world: &mut WeatherWorld, status: u16) {
    assert_eq!(world.response_status, Some(status));
}

#[then(expr = "the response body is a list of {int} bucket(s)")]
fn response_bucket_list(world: &mut WeatherWorld, count: usize) {
    let json = world.response_json.as_ref().expect("no response");
    assert_eq!(json.as_array().map(|a| a.len()), Some(count));
}

#[then(expr = "the response error mentions {string}")]
fn response_error(world: &mut WeatherWorld, text: String) {
    let json = world.response_json.as_ref().expect("no response");
    let message = json["error"].as_str().expect("no error message");
    assert!(message.contains(&text), "'{}' does not mention '{}'", message, text);
}
