use serde::Deserialize;

/// Config, from a toml file whose path is the first CLI argument.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// <address>:<port> to serve userfacing endpoints
    pub userfacing_listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max HTTP body size the API accepts
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// connection string for the database.
    pub db_dsn: String,

    /// maximum number of connections maintained by PostgresStore
    pub db_pool_size: u32,

    /// maximum seconds waiting for a database connection
    pub db_connection_timeout: u64,

    /// how many posts each listing page holds
    #[serde(default = "page_size")]
    pub page_size: u32,

    /// directory holding post images
    pub media_root: String,
}

impl Config {
    /// Will crash if file isn't found or config is invalid.
    pub fn from_file(filepath: &str) -> Self {
        let contents = std::fs::read_to_string(filepath).expect("Couldn't read from config file");
        let config: Config = toml::from_str(&contents).expect("couldn't parse config file");
        assert!(config.page_size > 0, "page_size must be at least 1");
        config
    }
}

fn max_body_size() -> usize {
    65536
}

fn page_size() -> u32 {
    crate::feed::DEFAULT_PAGE_SIZE
}
