use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tequila::api::ApiClient;
use tequila::config::ApiConfig;
use wiremock::MockServer;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Client pointed at a wiremock server
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> Arc<ApiClient> {
    let config = ApiConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        request_timeout_seconds: Some(5),
    };
    Arc::new(ApiClient::new(&config).expect("failed to build client"))
}

/// Full request path for an endpoint
#[allow(dead_code)]
pub fn api_path(endpoint: &str) -> String {
    format!("/api/v1{}", endpoint)
}
