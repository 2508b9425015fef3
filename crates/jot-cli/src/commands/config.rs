use std::path::{Path, PathBuf};

use jot_core::SharedBaseUrl;

use crate::cli::ConfigCommands;
use crate::config_file::CliConfig;
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    config_path: &Path,
    base_url_flag: Option<String>,
    cache_path_flag: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = CliConfig::load_from_path(config_path)?;
    match command {
        ConfigCommands::Show => {
            let client = config.client_config(base_url_flag)?;
            let cache_path = config.cache_path(cache_path_flag)?;
            println!("config file:        {}", config_path.display());
            println!("cache:              {}", cache_path.display());
            println!("base_url:           {}", client.base_url);
            println!("request_timeout_ms: {}", client.request_timeout_ms);
            println!("connect_timeout_ms: {}", client.connect_timeout_ms);
            println!("max_retries:        {}", client.max_retries);
            println!("retry_delay_ms:     {}", client.retry_delay_ms);
            Ok(())
        }
        ConfigCommands::SetUrl { url } => {
            let url = set_base_url(config, config_path, &url)?;
            println!("Saved base URL {url} to {}", config_path.display());
            Ok(())
        }
    }
}

fn set_base_url(mut config: CliConfig, config_path: &Path, url: &str) -> Result<String, CliError> {
    let url = SharedBaseUrl::new(url)?.get();
    config.base_url = Some(url.clone());
    config.save_to_path(config_path)?;
    Ok(url)
}
