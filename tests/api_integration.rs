//! Endpoint behaviour through `Handler`, wired from configuration the same way
//! the binary does it.

use std::path::PathBuf;
use std::sync::Arc;

use matchtags::api::{ApiRequest, ApiResponse, Cors, Handler};
use matchtags::config::Config;
use matchtags::generator::TagGenerator;

fn fixture_path() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/nicknames.json")
        .display()
        .to_string()
}

fn handler_from(vars: &[(&str, &str)]) -> Handler {
    let source = fixture_path();
    let config = Config::from_lookup(|name| {
        if name == "NICKNAMES_SOURCE" {
            return Some(source.clone());
        }
        vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
    })
    .expect("config");

    let cache = config.directory_cache().expect("directory cache");
    let generator = TagGenerator::new(Arc::new(cache), config.tag_policy());
    Handler::new(
        generator,
        Cors {
            allow_origin: config.cors_allow_origin.clone(),
        },
    )
}

fn post(handler: &Handler, body: &str) -> (ApiResponse, serde_json::Value) {
    let response = handler.handle(&ApiRequest::new("POST", body));
    let json = response
        .body
        .as_deref()
        .map(|b| serde_json::from_str(b).expect("json body"))
        .unwrap_or(serde_json::Value::Null);
    (response, json)
}

#[test]
fn full_request_through_fixture_directory() {
    let handler = handler_from(&[]);
    let (response, json) = post(
        &handler,
        r#"{
            "competition": "Copa Libertadores",
            "homeTeam": "millonarios",
            "awayTeam": "xeneizes",
            "homeScore": "3",
            "awayScore": 1,
            "scorers": "Borja 12'\nBorja 80'\nMerentiel (45+1')",
            "matchDate": "2024-09-21",
            "maxLen": 500
        }"#,
    );

    assert_eq!(response.status, 200);
    assert_eq!(json["teams"]["home"]["canonical"], "River Plate");
    assert_eq!(json["teams"]["away"]["canonical"], "Boca Juniors");
    assert_eq!(json["mandatoryCount"], 5);

    let tags = json["tags"].as_str().unwrap();
    assert!(tags.starts_with("River Plate vs Boca Juniors highlights"));
    assert!(tags.contains("River Plate vs Boca Juniors 3-1"));
    assert!(tags.contains("Copa Libertadores 2024"));
    assert!(tags.contains("gol de Borja"));
    assert_eq!(tags.matches("gol de Borja").count(), 1);
    assert!(tags.contains("gol de Merentiel"));
    assert!(tags.chars().count() <= 500);
}

#[test]
fn every_response_carries_configured_cors_origin() {
    let handler = handler_from(&[("CORS_ALLOW_ORIGIN", "https://studio.example.com")]);

    for request in [
        ApiRequest::new("OPTIONS", ""),
        ApiRequest::new("DELETE", ""),
        ApiRequest::new("POST", "nope"),
        ApiRequest::new("POST", r#"{"homeTeam":"a","awayTeam":"b"}"#),
    ] {
        let response = handler.handle(&request);
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("https://studio.example.com"),
            "status {}",
            response.status
        );
    }
}

#[test]
fn status_codes_and_categories() {
    let handler = handler_from(&[]);

    let options = handler.handle(&ApiRequest::new("OPTIONS", ""));
    assert_eq!(options.status, 204);
    assert!(options.body.is_none());

    let (get, json) = {
        let response = handler.handle(&ApiRequest::new("GET", ""));
        let json: serde_json::Value = serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
        (response, json)
    };
    assert_eq!(get.status, 405);
    assert_eq!(json["error"], "method_not_allowed");

    let (response, json) = post(&handler, "");
    assert_eq!(response.status, 400);
    assert_eq!(json["error"], "invalid_json");

    let (response, json) = post(&handler, r#"{"homeTeam":"   ","awayTeam":"boca"}"#);
    assert_eq!(response.status, 400);
    assert_eq!(json["error"], "validation_error");
    assert!(json["detail"].as_str().unwrap().contains("homeTeam"));

    let (response, json) = post(&handler, r#"{"homeTeam":"a","awayTeam":"b","homeScore":"two","awayScore":1}"#);
    assert_eq!(response.status, 400);
    assert_eq!(json["error"], "validation_error");
}

#[test]
fn brand_policy_from_configuration() {
    let handler = handler_from(&[("TAGS_INCLUDE_BRANDS", "true"), ("TAGS_BRANDS", "Star+")]);
    let (response, json) = post(&handler, r#"{"homeTeam":"psg","awayTeam":"bayern münchen","maxLen":10}"#);

    assert_eq!(response.status, 200);
    assert_eq!(json["mandatoryCount"], 6);
    assert_eq!(
        json["tags"],
        "Paris Saint-Germain vs Bayern Munich highlights, Bayern Munich vs Paris Saint-Germain highlights, \
         highlights, Paris Saint-Germain vs Bayern Munich resumen, Bayern Munich vs Paris Saint-Germain resumen, Star+"
    );
}

#[test]
fn default_max_len_is_500() {
    let handler = handler_from(&[]);
    let (_, json) = post(
        &handler,
        r#"{"homeTeam":"river","awayTeam":"boca","contextNotes":"Superclásico del Monumental; noche de Copa"}"#,
    );

    let tags = json["tags"].as_str().unwrap();
    assert!(tags.chars().count() <= 500);
    assert!(tags.contains("Superclásico del Monumental"));
}
