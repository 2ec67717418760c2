use super::*;
use axum::http::{Request, header};

async fn extract(request: Request<()>) -> AccessToken {
    let (mut parts, _) = request.into_parts();
    AccessToken::from_request_parts(&mut parts, &())
        .await
        .unwrap()
}

#[tokio::test]
async fn reads_bearer_header() {
    let request = Request::builder()
        .header(header::AUTHORIZATION, "Bearer header.jwt.token")
        .body(())
        .unwrap();

    assert_eq!(extract(request).await.as_deref(), Some("header.jwt.token"));
}

#[tokio::test]
async fn falls_back_to_session_cookie() {
    let request = Request::builder()
        .header(header::COOKIE, "theme=dark; sb-access-token=cookie.jwt.token")
        .body(())
        .unwrap();

    assert_eq!(extract(request).await.as_deref(), Some("cookie.jwt.token"));
}

#[tokio::test]
async fn header_wins_over_cookie() {
    let request = Request::builder()
        .header(header::AUTHORIZATION, "Bearer from-header")
        .header(header::COOKIE, "sb-access-token=from-cookie")
        .body(())
        .unwrap();

    assert_eq!(extract(request).await.as_deref(), Some("from-header"));
}

#[tokio::test]
async fn non_bearer_scheme_is_ignored() {
    let request = Request::builder()
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(())
        .unwrap();

    assert_eq!(extract(request).await, AccessToken(None));
}

#[tokio::test]
async fn no_credentials_yields_none() {
    let request = Request::builder().body(()).unwrap();

    assert_eq!(extract(request).await, AccessToken(None));
}
