use mock_server::{ServerState, DEFAULT_PASSWORD, DEFAULT_USER};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_server=debug,tower_http=info".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let user = std::env::var("API_USER").unwrap_or_else(|_| DEFAULT_USER.to_string());
    let password = std::env::var("API_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %user, "mock key service listening");
    mock_server::run_with_state(listener, ServerState::new(&user, &password)).await
}
