use axum::body::Body;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Logs method, path, status, duration and response size of every request.
///
/// The body is not buffered (event streams never end); the size comes from
/// `Content-Length` and is `-` when the response is streamed.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let elapsed_ms = start.elapsed().as_millis();

    if response.status().is_server_error() {
        tracing::warn!("{} {} -> {} | {}ms | {} bytes", method, path, status, elapsed_ms, size);
    } else {
        tracing::info!("{} {} -> {} | {}ms | {} bytes", method, path, status, elapsed_ms, size);
    }

    response
}
