use crate::infra::config::{Config, Mode};
use std::net::SocketAddr;

pub async fn run_server() -> anyhow::Result<()> {
    let cfg = Config::from_env();
    tracing::info!(mode = %cfg.mode, port = cfg.port, "BOOT twitter-marketing-mcp");

    let factory = crate::infra::mcp::factory_from_env()?;

    if cfg.mode == Mode::Stdio {
        crate::infra::runtime::mcp_transport::serve_stdio(factory)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(factory);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
