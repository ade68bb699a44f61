const DEFAULT_BIND_ADDR: &str = "localhost:8010";

/// HTTP endpoint
#[derive(Clone, Debug, clap::Parser)]
#[command(
    rename_all_env = "SCREAMING_SNAKE_CASE",
    next_help_heading = "HTTP endpoint"
)]
#[group(id = "http")]
pub struct HttpServerConfig {
    /// Bind address of the API endpoint
    #[arg(long, env, default_value_t = DEFAULT_BIND_ADDR.into())]
    pub http_server_bind_addr: String,
    /// Number of HTTP workers; uses the actix default when absent
    #[arg(long, env)]
    pub http_server_workers: Option<usize>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            http_server_bind_addr: DEFAULT_BIND_ADDR.into(),
            http_server_workers: None,
        }
    }
}
