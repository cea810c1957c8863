use pica_mcp::services::config::GatewayConfig;
use pica_mcp::services::logger::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("configuration error: {}", err);
            eprintln!("pica-mcp: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = pica_mcp::mcp::server::run_stdio(config).await {
        tracing::error!("server stopped: {}", err);
        eprintln!("pica-mcp: {}", err);
        std::process::exit(1);
    }
}
