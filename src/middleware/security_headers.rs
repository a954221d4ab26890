use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Content security policy for API routes: nothing is a document, nothing
/// may be framed.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

/// The Swagger UI bundles inline scripts and styles, so its routes need a
/// policy loose enough to render.
const DOCS_CSP: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     connect-src 'self'";

/// Baseline security headers on every response, with the content security
/// policy and framing rule picked per route class.
pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let path = req.uri().path();
    let is_docs_route = path.starts_with("/docs") || path == "/.well-known/openapi.json";
    let (csp, framing) = if is_docs_route {
        (DOCS_CSP, "SAMEORIGIN")
    } else {
        (API_CSP, "DENY")
    };

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(csp),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static(framing),
    );

    response
}
