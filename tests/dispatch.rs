//! Request dispatch through the full router, over an in-memory store.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use prpl_server::builds::{AllOf, Build, BuildCatalog};
use prpl_server::http::SecureConnection;

mod common;

use common::{
    get, links, router, send, site_store, three_build_catalog, ES5_HTML, ES6_HTML, MODERN_HTML,
    SEEK_FAILURE,
};

#[tokio::test]
async fn test_first_satisfied_build_wins() {
    let app = router(three_build_catalog(), site_store());

    let (res, body) = send(&app, get("/", "es2015, modules")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body, MODERN_HTML);

    let (_, body) = send(&app, get("/", "es2015")).await;
    assert_eq!(body, ES6_HTML);

    let (_, body) = send(&app, get("/", "")).await;
    assert_eq!(body, ES5_HTML);
}

#[tokio::test]
async fn test_unsupported_client_gets_406_without_opening_anything() {
    let catalog = BuildCatalog::new(vec![Build::new(
        "modern",
        "/modern/index.html",
        AllOf::capabilities(["es2015", "modules"]),
    )
    .unwrap()]);
    let store = site_store();
    let counters = store.counters();
    let app = router(catalog, store);

    let (res, body) = send(&app, get("/", "es2015")).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body, "This browser is not supported");
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(counters.opens(), 0);
}

#[tokio::test]
async fn test_app_routes_serve_the_entrypoint() {
    let app = router(three_build_catalog(), site_store());

    for path in ["/", "/app/settings", "/users/42/profile/"] {
        let (res, body) = send(&app, get(path, "es2015")).await;
        assert_eq!(res.status(), StatusCode::OK, "{}", path);
        assert_eq!(body, ES6_HTML, "{}", path);
        assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    }
}

#[tokio::test]
async fn test_paths_with_extensions_are_served_literally() {
    let app = router(three_build_catalog(), site_store());

    let (res, body) = send(&app, get("/es6/app.js", "es2015")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body, "console.log('es6');");
    assert_eq!(res.headers()["content-type"], "text/javascript; charset=utf-8");

    // Literal paths are not confined to the selected build's directory.
    let (res, body) = send(&app, get("/es5/index.html", "es2015, modules")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body, ES5_HTML);
}

#[tokio::test]
async fn test_service_worker_scope_header() {
    let app = router(three_build_catalog(), site_store());

    let (res, _) = send(&app, get("/sw/service-worker.js", "")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["service-worker-allowed"], "/");

    let (res, _) = send(&app, get("/es6/app.js", "")).await;
    assert!(res.headers().get("service-worker-allowed").is_none());
}

#[tokio::test]
async fn test_preload_links_follow_the_scheme() {
    let app = router(three_build_catalog(), site_store());

    let (res, _) = send(&app, get("/", "es2015")).await;
    assert_eq!(
        links(&res),
        vec![
            "<http://example.com/es6/app.js>; rel=preload; as=script",
            "<http://example.com/es6/style.css>; rel=preload; as=style",
        ]
    );

    let mut forwarded = get("/app/route", "es2015");
    forwarded
        .headers_mut()
        .insert("x-forwarded-proto", "https".parse().unwrap());
    let (res, _) = send(&app, forwarded).await;
    assert_eq!(links(&res)[0], "<https://example.com/es6/app.js>; rel=preload; as=script");

    let mut secure = get("/", "es2015");
    secure.extensions_mut().insert(SecureConnection);
    let (res, _) = send(&app, secure).await;
    assert_eq!(links(&res)[1], "<https://example.com/es6/style.css>; rel=preload; as=style");
}

#[tokio::test]
async fn test_no_links_without_manifest_entry() {
    let app = router(three_build_catalog(), site_store());

    // Modern build has no manifest; es6 has none for app.js itself.
    let (res, _) = send(&app, get("/", "es2015, modules")).await;
    assert!(links(&res).is_empty());
    let (res, _) = send(&app, get("/es6/app.js", "es2015")).await;
    assert!(links(&res).is_empty());
}

#[tokio::test]
async fn test_repeated_requests_get_identical_answers() {
    let app = router(three_build_catalog(), site_store());

    let (first, first_body) = send(&app, get("/deep/link", "es2015")).await;
    let (second, second_body) = send(&app, get("/deep/link", "es2015")).await;
    assert_eq!(first.status(), second.status());
    assert_eq!(first_body, second_body);
    assert_eq!(links(&first), links(&second));
    assert_eq!(first.headers()["content-type"], second.headers()["content-type"]);
}

#[tokio::test]
async fn test_failures_are_500_with_message() {
    let store = site_store();
    let counters = store.counters();
    let app = router(three_build_catalog(), store);

    let (res, body) = send(&app, get("/es6/missing.js", "es2015")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("/es6/missing.js"), "{}", body);

    let (res, _) = send(&app, get("/bad%ff.js", "es2015")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let (res, _) = send(&app, get("/nul%00.js", "es2015")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(counters.opens(), 0);
}

#[tokio::test]
async fn test_every_opened_file_is_released_once() {
    let store = site_store();
    let counters = store.counters();
    let app = router(three_build_catalog(), store);

    send(&app, get("/", "es2015")).await;
    send(&app, get("/es6/app.js", "es2015")).await;
    send(&app, get("/es6/missing.js", "es2015")).await;

    let head = Request::builder()
        .method(Method::HEAD)
        .uri("/es6/app.js")
        .header("host", "example.com")
        .body(Body::empty())
        .unwrap();
    let (res, body) = send(&app, head).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body.is_empty());

    let mut cached = get("/es6/style.css", "es2015");
    cached.headers_mut().insert(
        "if-modified-since",
        "Fri, 01 Jan 2100 00:00:00 GMT".parse().unwrap(),
    );
    let (res, _) = send(&app, cached).await;
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);

    let mut ranged = get("/data/digits.txt", "");
    ranged.headers_mut().insert("range", "bytes=2-4".parse().unwrap());
    let (res, body) = send(&app, ranged).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body, "234");
    assert_eq!(res.headers()["content-range"], "bytes 2-4/10");

    assert_eq!(counters.opens(), 5);
    assert_eq!(counters.releases(), counters.opens());
}

#[tokio::test]
async fn test_file_failing_after_open_is_released_once() {
    let store = site_store().with_unseekable("/es6/index.html");
    let counters = store.counters();
    let app = router(three_build_catalog(), store);

    let (res, body) = send(&app, get("/", "es2015")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, SEEK_FAILURE);
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");

    assert_eq!(counters.opens(), 1);
    assert_eq!(counters.releases(), 1);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = router(three_build_catalog(), site_store());

    let mut request = get("/", "");
    request
        .headers_mut()
        .insert("x-request-id", "abc-123".parse().unwrap());
    let (res, _) = send(&app, request).await;
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    let (res, _) = send(&app, get("/", "")).await;
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_non_get_methods_are_rejected() {
    let app = router(three_build_catalog(), site_store());

    let post = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (res, _) = send(&app, post).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}
