//! Startup tests with the dev server replaced by a mock.

use async_trait::async_trait;
use devproxy::config::{RawServerConfig, ServerConfig};
use devproxy::error::{AppError, AppResult};
use devproxy::host::DevServerHost;
use devproxy::server::{run_server, serve};
use mockall::mock;

mock! {
    pub DevServer {}

    #[async_trait]
    impl DevServerHost for DevServer {
        async fn serve(&self, config: &ServerConfig) -> AppResult<()>;
    }
}

#[tokio::test]
async fn test_host_receives_bind_settings() {
    let raw = RawServerConfig {
        port: 5173,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };
    let config = ServerConfig::try_from(raw).unwrap();

    let mut host = MockDevServer::new();
    host.expect_serve()
        .withf(|c| c.port() == 5173 && c.host() == "127.0.0.1" && c.proxy_rules().len() == 1)
        .times(1)
        .returning(|_| Ok(()));

    run_server(&config, &host).await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_never_reaches_host() {
    let raw = RawServerConfig {
        port: 80,
        ..Default::default()
    };

    let mut host = MockDevServer::new();
    host.expect_serve().times(0);

    let result = serve(raw, &host).await;
    assert!(matches!(result, Err(AppError::InvalidPort(80))));
}

#[tokio::test]
async fn test_valid_raw_config_reaches_host() {
    let raw = RawServerConfig::from_json(r#"{ "port": 3000, "host": "localhost" }"#).unwrap();

    let mut host = MockDevServer::new();
    host.expect_serve()
        .withf(|c| c.bind_address() == "localhost:3000")
        .times(1)
        .returning(|_| Ok(()));

    serve(raw, &host).await.unwrap();
}

#[tokio::test]
async fn test_host_error_is_reported() {
    let config = ServerConfig::from_defaults().unwrap();

    let mut host = MockDevServer::new();
    host.expect_serve()
        .returning(|_| Err(AppError::Internal("port already in use".to_string())));

    let err = run_server(&config, &host).await.unwrap_err();
    assert!(err.to_string().contains("port already in use"));
}
