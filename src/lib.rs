pub mod api;
pub mod config;
pub mod flatten;
pub mod model;
pub mod upstream;

use config::Config;
use upstream::UpstreamClient;

pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let upstream = UpstreamClient::new(
            config.upstream.base_url.as_deref(),
            config.upstream.api_key.clone(),
        );
        Self { config, upstream }
    }
}
