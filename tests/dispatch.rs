use actix_web::http::StatusCode;
use actix_web::{test, App};
use ancestry::repository::SCHEMA_VERSION;
use ancestry::{server, IdCodec, NodeRepository, SqliteRepository};

macro_rules! service {
    () => {
        test::init_service(
            App::new()
                .app_data(server::shared(
                    SqliteRepository::in_memory().expect("open in-memory sqlite"),
                    IdCodec::new("t"),
                ))
                .configure(server::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_post_then_query() {
    let app = service!();

    let req = test::TestRequest::post()
        .uri("/tree")
        .set_payload("[15<20>30][10<15>16]")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let id = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(id, "t-1");

    let req = test::TestRequest::get()
        .uri(&format!("/tree/{id}/common-ancestor/10/16"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "15");

    let req = test::TestRequest::get()
        .uri(&format!("/tree/{id}/common-ancestor/16/30"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "20");
}

#[actix_web::test]
async fn test_rejected_notation_is_bad_request() {
    let app = service!();
    let req = test::TestRequest::post()
        .uri("/tree")
        .set_payload("[1<2>3][]")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_query_failures() {
    let app = service!();
    let req = test::TestRequest::post()
        .uri("/tree")
        .set_payload("[10<15>20][110<115>120]")
        .to_request();
    test::call_service(&app, req).await;

    let cases = [
        ("/tree/t-1/common-ancestor/10/120", StatusCode::NOT_FOUND),
        ("/tree/t-1/common-ancestor/10/99", StatusCode::NOT_FOUND),
        ("/tree/other-1/common-ancestor/10/20", StatusCode::NOT_FOUND),
        ("/tree/t-1/common-ancestor/1a/20", StatusCode::BAD_REQUEST),
    ];
    for (uri, expected) in cases {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "{uri}");
    }
}

#[actix_web::test]
async fn test_auxiliary_routes() {
    let app = service!();

    let req = test::TestRequest::get().uri("/test").to_request();
    assert_eq!(test::call_and_read_body(&app, req).await, "OK");

    let req = test::TestRequest::get().uri("/version").to_request();
    assert_eq!(test::call_and_read_body(&app, req).await, SCHEMA_VERSION);

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(test::read_body(resp).await, "Not found");
}

#[actix_web::test]
async fn test_corrupt_links_are_server_errors() {
    let mut repo = SqliteRepository::in_memory().expect("open in-memory sqlite");
    let tree = repo.new_tree().unwrap();
    let a = repo.ensure_node(&tree, 1).unwrap();
    let b = repo.ensure_node(&tree, 2).unwrap();
    repo.bind_left(&a, &b).unwrap();
    repo.bind_left(&b, &a).unwrap();

    let app = test::init_service(
        App::new()
            .app_data(server::shared(repo, IdCodec::new("t")))
            .configure(server::configure),
    )
    .await;
    let req = test::TestRequest::get()
        .uri(&format!("/tree/t-{tree}/common-ancestor/1/2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
