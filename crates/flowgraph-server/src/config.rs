//! Server configuration, read from the environment, mirroring the teacher's
//! `DbConfig::from_env` pattern.

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("FLOWGRAPH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: std::env::var("DATABASE_URL").or_else(|_| std::env::var("FLOWGRAPH_DATABASE_URL")).ok(),
        }
    }
}
