//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use restmux::demo::{build_mux, PeopleStore};
use restmux::http::response::HttpResponse;
use restmux::{Mux, MuxOptions};

/// Number of people the demo store is seeded with.
pub const PEOPLE: usize = 100;

/// Demo mux over a freshly seeded store, plus the store itself.
pub fn demo() -> (Mux, Arc<PeopleStore>) {
    demo_with(MuxOptions::default())
}

pub fn demo_with(options: MuxOptions) -> (Mux, Arc<PeopleStore>) {
    let store = Arc::new(PeopleStore::seed(PEOPLE));
    let mux = build_mux(Arc::clone(&store), options).unwrap();
    (mux, store)
}

/// Build a request with headers and an optional body.
pub fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::from(body.to_string())).unwrap()
}

pub fn get(mux: &Mux, uri: &str, headers: &[(&str, &str)]) -> HttpResponse {
    mux.serve(&request(Method::GET, uri, headers, ""))
}

/// Header value as a string, if present.
pub fn header<'a, B>(resp: &'a Response<B>, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

pub async fn body(resp: HttpResponse) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

pub async fn json(resp: HttpResponse) -> serde_json::Value {
    serde_json::from_slice(&body(resp).await).unwrap()
}
