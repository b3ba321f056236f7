use clap::Parser;
use config::{Config, Environment, File};
use schoolmail_core::{MessagingConfig, StoreType};
use serde::{Deserialize, Serialize};

/// Command line arguments. Anything given here wins over the settings file
/// and the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "schoolmail-server")]
#[command(about = "HTTP API for the SchoolMail messaging engine")]
pub struct Args {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Settings file; defaults to an optional `schoolmail.toml`
    #[arg(long)]
    pub config: Option<String>,

    /// Directory of the sled message store
    #[arg(long)]
    pub store_path: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Store, directory and engine limits
    #[serde(default)]
    pub messaging: MessagingConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

const DEFAULT_CONFIG_FILE: &str = "schoolmail";
const ENV_PREFIX: &str = "SCHOOLMAIL";
const DEFAULT_STORE_PATH: &str = "./data/messages";

impl Settings {
    /// Load settings from defaults, the settings file, `SCHOOLMAIL_*`
    /// environment variables and finally the command line
    pub fn load(args: &Args) -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let file = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        let mut settings: Settings = Config::builder()
            .set_default("host", default_host())?
            .set_default("port", i64::from(default_port()))?
            .set_default("messaging.store.store_type", "sled")?
            .set_default("messaging.store.path", DEFAULT_STORE_PATH)?
            .set_default("messaging.store.flush_on_write", true)?
            .set_default("messaging.directory.directory_type", "static")?
            .add_source(File::with_name(file).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.apply_args(args);
        Ok(settings)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(path) = &args.store_path {
            self.messaging.store.store_type = StoreType::Sled;
            self.messaging.store.path = Some(path.clone());
        }
    }

    /// Get the server address as a string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolmail_core::DirectoryType;
    use std::io::Write;

    #[test]
    fn test_settings_file_and_args() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
port = 9100

[messaging]
max_recipients = 40

[messaging.store]
store_type = "memory"

[[messaging.directory.users]]
id = "t1"
name = "Ms. Rivera"
email = "rivera@school.test"
role = "TEACHER"
"#
        )
        .unwrap();

        let args = Args {
            config: Some(file.path().to_string_lossy().to_string()),
            host: Some("127.0.0.1".to_string()),
            ..Args::default()
        };
        let settings = Settings::load(&args).unwrap();
        assert_eq!(settings.server_address(), "127.0.0.1:9100");
        assert_eq!(settings.messaging.max_recipients, 40);
        assert_eq!(settings.messaging.store.store_type, StoreType::Memory);
        assert_eq!(settings.messaging.directory.directory_type, DirectoryType::Static);
        assert_eq!(settings.messaging.directory.users.len(), 1);
    }

    #[test]
    fn test_store_path_flag_selects_sled() {
        let mut settings = Settings {
            host: default_host(),
            port: default_port(),
            messaging: MessagingConfig::default()
                .with_store(schoolmail_core::StoreConfig::memory()),
        };
        settings.apply_args(&Args {
            store_path: Some("/var/lib/schoolmail".to_string()),
            ..Args::default()
        });
        assert_eq!(settings.messaging.store.store_type, StoreType::Sled);
        assert_eq!(settings.messaging.store.path.as_deref(), Some("/var/lib/schoolmail"));
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let args = Args {
            config: Some("/nonexistent/schoolmail-settings.toml".to_string()),
            ..Args::default()
        };
        assert!(Settings::load(&args).is_err());
    }
}
