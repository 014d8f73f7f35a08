use std::env;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_QUESTIONS_FILE: &str = "questions.json";

/// Everything the bot needs from the environment. `.env` is loaded into the
/// process environment before this is read.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    /// Port for the liveness endpoint the hosting platform probes.
    pub port: u16,
    pub questions_file: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = required("BOT_TOKEN")?;
        let database_url = required("DATABASE_URL")?;
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT", value))?,
            Err(_) => DEFAULT_PORT,
        };
        let questions_file =
            env::var("QUESTIONS_FILE").unwrap_or_else(|_| DEFAULT_QUESTIONS_FILE.to_string());

        Ok(Self {
            bot_token,
            database_url,
            port,
            questions_file,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}
