use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;

/// Tiny HTTP server so the hosting platform can probe that the process is
/// alive. It runs on its own task and never waits on quiz or database work.
pub async fn serve(port: u16) -> Result<(), std::io::Error> {
    let app = Router::new().route("/", get(|| async { "OK" }));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
