//! Dispatch behaviour of the demo application, driven through `Mux::serve`.

mod common;

use common::{body, demo, demo_with, get, header, json, request, PEOPLE};
use hyper::{Method, StatusCode};
use restmux::demo::{CANNED_BYTES, CANNED_TYPE, ECHO_ORIGIN};
use restmux::{IfRangePolicy, MuxOptions};

const REFERENCE_DATE: &str = "Mon, 14 Apr 2014 10:00:00 GMT";

// ============================================
// Negotiation
// ============================================

#[tokio::test]
async fn test_canned_representation() {
    let (mux, _) = demo();
    let resp = get(&mux, "/people", &[("Accept", CANNED_TYPE)]);
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-type"), Some(CANNED_TYPE));
    assert_eq!(body(resp).await, CANNED_BYTES);
}

#[tokio::test]
async fn test_absent_accept_serves_json() {
    let (mux, _) = demo();
    let resp = get(&mux, "/people", &[]);
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-type"), Some("application/json"));
    assert_eq!(header(&resp, "vary"), Some("Accept"));
    assert_eq!(header(&resp, "server"), Some("restmux"));
    assert_eq!(json(resp).await.as_array().unwrap().len(), PEOPLE);
}

#[test]
fn test_unsupported_accept_is_406() {
    let (mux, _) = demo();
    let resp = get(&mux, "/employers", &[("Accept", "image/png, text/html;q=0.5")]);
    assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);

    let resp = get(&mux, "/employers", &[("Accept", "application/*;q=0.2, */*;q=0.1")]);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_malformed_accept_is_406() {
    let (mux, _) = demo();
    for accept in ["garbage", "application"] {
        let resp = get(&mux, "/employers", &[("Accept", accept)]);
        assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE, "Accept: {accept}");
    }

    let resp = get(&mux, "/employers", &[("Accept", "")]);
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================
// Routing
// ============================================

#[test]
fn test_unknown_person_is_404() {
    let (mux, _) = demo();
    assert_eq!(get(&mux, "/people/42", &[]).status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&mux, "/nowhere", &[]).status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&mux, "/people/", &[]).status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_person_by_id() {
    let (mux, store) = demo();
    let person = store.first().unwrap().unwrap();
    let resp = get(&mux, &format!("/people/{}", person.id), &[]);
    assert_eq!(resp.status(), StatusCode::OK);
    let value = json(resp).await;
    assert_eq!(value["_id"], person.id.as_str());
    assert_eq!(value["firstname"], person.firstname.as_str());
}

#[tokio::test]
async fn test_employer_lookup_ignores_case() {
    let (mux, _) = demo();
    let resp = get(&mux, "/employers/zentix", &[]);
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["company"], "Zentix");
}

#[test]
fn test_method_not_allowed_lists_capabilities() {
    let (mux, _) = demo();
    let resp = mux.serve(&request(Method::DELETE, "/people", &[], ""));
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(header(&resp, "allow"), Some("GET, HEAD, POST, OPTIONS"));

    let resp = mux.serve(&request(Method::PUT, "/echo", &[], ""));
    assert_eq!(header(&resp, "allow"), Some("POST, OPTIONS"));
}

#[test]
fn test_routes_are_deterministic() {
    let (mux, _) = demo();
    let order: Vec<_> = mux.patterns().collect();
    for _ in 0..3 {
        assert_eq!(mux.patterns().collect::<Vec<_>>(), order);
    }
    assert_eq!(
        order,
        ["/echo", "/people", "/employers", "/people/{id}", "/employers/{name}"]
    );
}

// ============================================
// Creation and deletion
// ============================================

#[tokio::test]
async fn test_post_wrong_content_type_is_415() {
    let (mux, store) = demo();
    let body_text = r#"{"_id":"x"}"#;
    let resp = mux.serve(&request(
        Method::POST,
        "/people",
        &[("Content-Type", "text/plain")],
        body_text,
    ));
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(String::from_utf8_lossy(&body(resp).await).contains("application/json"));
    assert_eq!(store.len().unwrap(), PEOPLE);
}

#[tokio::test]
async fn test_post_creates_person() {
    let (mux, store) = demo();
    let new_person = r#"{
        "_id": "0000000000000000000000aa",
        "age": 33,
        "eyeColor": "green",
        "firstname": "Frances",
        "lastname": "Allen",
        "employer": {"company": "Quilch", "continent": "Asia"}
    }"#;
    let resp = mux.serve(&request(
        Method::POST,
        "/people",
        &[("Content-Type", "application/json")],
        new_person,
    ));
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        header(&resp, "location"),
        Some("/people/0000000000000000000000aa")
    );
    assert_eq!(json(resp).await["lastname"], "Allen");
    assert_eq!(store.len().unwrap(), PEOPLE + 1);

    let resp = get(&mux, "/people/0000000000000000000000aa", &[]);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_post_empty_body_returns_first_person() {
    let (mux, store) = demo();
    let first = store.first().unwrap().unwrap();
    let resp = mux.serve(&request(
        Method::POST,
        "/people",
        &[("Content-Type", "application/json")],
        "",
    ));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let expected = format!("/people/{}", first.id);
    assert_eq!(header(&resp, "location"), Some(expected.as_str()));
}

#[test]
fn test_post_invalid_json_is_400() {
    let (mux, _) = demo();
    let resp = mux.serve(&request(
        Method::POST,
        "/people",
        &[("Content-Type", "application/json")],
        "{not json",
    ));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_delete_person() {
    let (mux, store) = demo();
    let id = store.first().unwrap().unwrap().id;
    let uri = format!("/people/{id}");

    let resp = mux.serve(&request(Method::DELETE, &uri, &[], ""));
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(get(&mux, &uri, &[]).status(), StatusCode::NOT_FOUND);

    let resp = mux.serve(&request(Method::DELETE, &uri, &[], ""));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_echo() {
    let (mux, _) = demo();
    let resp = mux.serve(&request(Method::POST, "/echo", &[], "ping"));
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(header(&resp, "content-type"), Some("text/plain"));
    assert_eq!(body(resp).await, "ping");
}

// ============================================
// CORS
// ============================================

#[test]
fn test_preflight_grants_origin() {
    let (mux, _) = demo();
    let resp = mux.serve(&request(
        Method::OPTIONS,
        "/echo",
        &[
            ("Access-Control-Request-Method", "POST"),
            ("Origin", "example.com"),
        ],
        "",
    ));
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(ECHO_ORIGIN));
    assert_eq!(
        header(&resp, "access-control-allow-methods"),
        Some("POST, OPTIONS")
    );
    assert_eq!(header(&resp, "vary"), Some("Origin"));
    assert_eq!(header(&resp, "allow"), Some("POST, OPTIONS"));
}

#[test]
fn test_preflight_for_unimplemented_method() {
    let (mux, _) = demo();
    for method in ["DELETE", "OPTIONS"] {
        let resp = mux.serve(&request(
            Method::OPTIONS,
            "/echo",
            &[
                ("Access-Control-Request-Method", method),
                ("Origin", "example.com"),
            ],
            "",
        ));
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert!(header(&resp, "access-control-allow-origin").is_none());
    }
}

#[test]
fn test_preflight_without_preflighter() {
    let (mux, _) = demo();
    let resp = mux.serve(&request(
        Method::OPTIONS,
        "/people",
        &[("Access-Control-Request-Method", "GET")],
        "",
    ));
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(header(&resp, "access-control-allow-origin").is_none());
    assert_eq!(header(&resp, "allow"), Some("GET, HEAD, POST, OPTIONS"));
}

// ============================================
// Ranges
// ============================================

#[tokio::test]
async fn test_range_first_page() {
    let (mux, _) = demo();
    let resp = get(&mux, "/people", &[("Range", "items=0-9")]);
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&resp, "content-range"), Some("items 0-9/100"));
    assert_eq!(header(&resp, "accept-ranges"), Some("items"));
    assert_eq!(json(resp).await.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_range_whole_collection() {
    let (mux, _) = demo();
    let resp = get(&mux, "/people", &[("Range", "items=0-99")]);
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&resp, "content-range"), Some("items 0-99/100"));
    assert_eq!(json(resp).await.as_array().unwrap().len(), PEOPLE);
}

#[test]
fn test_range_past_end_is_416() {
    let (mux, _) = demo();
    let resp = get(&mux, "/people", &[("Range", "items=100-100")]);
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header(&resp, "content-range"), Some("items */100"));
    assert_eq!(header(&resp, "accept-ranges"), Some("items"));
}

#[test]
fn test_range_wrong_unit_and_malformed() {
    let (mux, _) = demo();
    let resp = get(&mux, "/people", &[("Range", "bytes=0-9")]);
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header(&resp, "accept-ranges"), Some("items"));

    let resp = get(&mux, "/people", &[("Range", "items")]);
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&resp, "accept-ranges"), Some("items"));
}

#[test]
fn test_full_response_advertises_ranges() {
    let (mux, _) = demo();
    let resp = get(&mux, "/employers", &[]);
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "accept-ranges"), Some("items"));
    assert!(header(&resp, "content-range").is_none());
}

#[test]
fn test_if_range_policy() {
    let (mux, _) = demo();
    let stale = [("Range", "items=0-9"), ("If-Range", "\"stale\"")];
    assert_eq!(get(&mux, "/people", &stale).status(), StatusCode::OK);

    let dated = [("Range", "items=0-9"), ("If-Range", REFERENCE_DATE)];
    assert_eq!(get(&mux, "/people", &dated).status(), StatusCode::PARTIAL_CONTENT);

    let (mux, _) = demo_with(MuxOptions {
        if_range: IfRangePolicy::Ignore,
        ..MuxOptions::default()
    });
    assert_eq!(
        get(&mux, "/people", &stale).status(),
        StatusCode::PARTIAL_CONTENT
    );
}

// ============================================
// Conditional requests
// ============================================

#[test]
fn test_cache_headers() {
    let (mux, store) = demo();
    let id = store.first().unwrap().unwrap().id;
    let resp = get(&mux, &format!("/people/{id}"), &[]);
    let etag = format!("\"{id}-1397469600\"");
    assert_eq!(header(&resp, "etag"), Some(etag.as_str()));
    assert_eq!(header(&resp, "last-modified"), Some(REFERENCE_DATE));
    assert_eq!(header(&resp, "cache-control"), Some("max-age=30"));
}

#[tokio::test]
async fn test_if_none_match_is_304() {
    let (mux, store) = demo();
    let id = store.first().unwrap().unwrap().id;
    let etag = format!("\"{id}-1397469600\"");

    let resp = get(&mux, "/people", &[("If-None-Match", etag.as_str())]);
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(header(&resp, "etag"), Some(etag.as_str()));
    assert!(body(resp).await.is_empty());
}

#[tokio::test]
async fn test_not_modified_wins_over_range() {
    let (mux, store) = demo();
    let id = store.first().unwrap().unwrap().id;
    let etag = format!("W/\"{id}-1397469600\"");

    let resp = get(
        &mux,
        "/people",
        &[("If-None-Match", etag.as_str()), ("Range", "items=0-9")],
    );
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert!(header(&resp, "content-range").is_none());
    assert!(body(resp).await.is_empty());
}

#[test]
fn test_if_modified_since() {
    let (mux, _) = demo();
    let resp = get(&mux, "/employers/zentix", &[("If-Modified-Since", REFERENCE_DATE)]);
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

    let earlier = "Sun, 13 Apr 2014 10:00:00 GMT";
    let resp = get(&mux, "/employers/zentix", &[("If-Modified-Since", earlier)]);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_if_match_mismatch_is_412() {
    let (mux, _) = demo();
    let resp = get(&mux, "/employers/zentix", &[("If-Match", "\"other\"")]);
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);

    let resp = get(&mux, "/employers/zentix", &[("If-Match", "*")]);
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================
// HEAD
// ============================================

#[tokio::test]
async fn test_head_matches_get_headers() {
    let (mux, _) = demo();
    let full = get(&mux, "/employers", &[]);
    let head = mux.serve(&request(Method::HEAD, "/employers", &[], ""));
    assert_eq!(head.status(), StatusCode::OK);
    assert_eq!(
        header(&head, "content-length"),
        header(&full, "content-length")
    );
    assert_eq!(header(&head, "etag"), header(&full, "etag"));
    assert!(body(head).await.is_empty());
}
