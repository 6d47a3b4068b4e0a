use axum::{
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header::HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// CORS contract for the browser-facing endpoints: the three headers go on
/// every response, and preflight requests short-circuit to an empty 204
/// without reaching a handler.
pub async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut());
    response
}

fn apply_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert("access-control-allow-methods", HeaderValue::from_static("GET, POST, OPTIONS"));
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("authorization, x-client-info, apikey, content-type"),
    );
}
