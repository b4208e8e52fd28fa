use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    mail: Option<Mail>,
    payments: Payments,
    video: Option<Video>,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    public_url: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_session_days")]
    session_days: i64,
    #[serde(default = "default_magic_link_hours")]
    magic_link_hours: i64,
}

/// SMTP relay used for magic links. Without it mail is only logged.
#[derive(Debug, Deserialize)]
pub struct Mail {
    host: String,
    #[serde(default = "default_smtp_port")]
    port: u16,
    username: String,
    password: String,
    from: String,
}

#[derive(Debug, Deserialize)]
pub struct Payments {
    webhook_secret: String,
    #[serde(default = "default_tolerance_secs")]
    tolerance_secs: i64,
}

/// Video hosting credentials (Mux compatible API).
#[derive(Debug, Deserialize)]
pub struct Video {
    token_id: String,
    token_secret: String,
    #[serde(default = "default_video_api_base")]
    api_base: String,
    webhook_secret: Option<String>,
}

fn default_session_days() -> i64 {
    7
}

fn default_magic_link_hours() -> i64 {
    24
}

fn default_smtp_port() -> u16 {
    587
}

fn default_tolerance_secs() -> i64 {
    300
}

fn default_video_api_base() -> String {
    String::from("https://api.mux.com")
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let config: Self = toml::from_slice(&bytes)?;
                    config.validate()?;
                    Ok(config)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if matches!(e, error::ConfigError::ConfigNotFound) {
                            tracing::error!("Config not found.");
                        } else {
                            crate::error::log_error(&e);
                        }
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Signing secrets must not be blank.
    fn validate(&self) -> ConfigResult<()> {
        if self.app.jwt.trim().is_empty() {
            return Err(ConfigError::MissingValue("app.jwt"));
        }
        if self.payments.webhook_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("payments.webhook_secret"));
        }
        Ok(())
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn mail(&self) -> Option<&Mail> {
        self.mail.as_ref()
    }

    #[inline]
    pub fn payments(&self) -> &Payments {
        &self.payments
    }

    #[inline]
    pub fn video(&self) -> Option<&Video> {
        self.video.as_ref()
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn public_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn session_days(&self) -> i64 {
        self.session_days
    }

    #[inline]
    pub fn magic_link_hours(&self) -> i64 {
        self.magic_link_hours
    }
}

impl Mail {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn from(&self) -> &str {
        &self.from
    }
}

impl Payments {
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    pub fn tolerance_secs(&self) -> i64 {
        self.tolerance_secs
    }
}

impl Video {
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }
}
