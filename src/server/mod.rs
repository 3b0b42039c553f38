/// HTTP API Server module
/// Exposes the backup core as REST endpoints for the web dashboard

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub mod handlers;

#[cfg(feature = "server")]
pub use handlers::AppState;

#[cfg(feature = "server")]
pub use routes::create_router;

#[cfg(feature = "server")]
pub async fn run(state: AppState, host: String, port: u16, enable_cors: bool) -> anyhow::Result<()> {
    use std::net::SocketAddr;

    let app = create_router(state, enable_cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("🚀 Backrest Management Server");
    println!("   🔌 API: http://{}/api", addr);
    println!();
    println!("📚 API Endpoints:");
    println!("   GET    /api/instances          - List instances");
    println!("   POST   /api/instances          - Add instance");
    println!("   PUT    /api/instances/:id      - Update instance");
    println!("   DELETE /api/instances/:id      - Remove instance");
    println!("   POST   /api/backup/:id/:type   - Run backup (full|incr|diff)");
    println!("   POST   /api/cleanup/:id        - Expire old backups");
    println!("   POST   /api/check/:id          - Stanza consistency check");
    println!("   GET    /api/info/:id           - Raw info report");
    println!("   GET    /api/history/:id        - Parsed backup history");
    println!("   GET    /api/status/:id         - Backup status summary");
    println!("   GET    /api/logs?tail=N        - Tail of the tool's log file");
    println!("   GET    /api/config             - Tool configuration");
    println!("   PUT    /api/config             - Write tool configuration");
    println!("   GET    /api/health             - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
