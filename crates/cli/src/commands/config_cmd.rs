//! `spiro config`: Print the default configuration.

use spiro_config::AppConfig;

pub fn run() {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("# {}", config_path.display());
    println!("{}", AppConfig::default_toml());
}
