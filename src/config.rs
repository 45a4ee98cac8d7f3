use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::cryptography::generate_secret;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind: SocketAddr,
    pub secret: String,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn load() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database_url = lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        let secret = lookup("FOODGRAM_SECRET").unwrap_or_else(|| {
            log::warn!("FOODGRAM_SECRET not set, sessions will not survive a restart");
            generate_secret()
        });

        Ok(Self {
            database_url,
            bind: try_load(&lookup, "FOODGRAM_BIND", "0.0.0.0:8000")?,
            secret,
            media_root: try_load(&lookup, "FOODGRAM_MEDIA_ROOT", "media")?,
            media_url: try_load(&lookup, "FOODGRAM_MEDIA_URL", "/media/")?,
            max_connections: try_load(&lookup, "FOODGRAM_MAX_CONNECTIONS", "5")?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, String>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| format!("Invalid {key} value: {e}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/foodgram")]))
            .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.secret.len(), 64);
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/foodgram"),
            ("FOODGRAM_BIND", "127.0.0.1:9000"),
            ("FOODGRAM_SECRET", "s3cret"),
            ("FOODGRAM_MAX_CONNECTIONS", "20"),
        ]))
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.max_connections, 20);
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn malformed_values_are_reported() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/foodgram"),
            ("FOODGRAM_MAX_CONNECTIONS", "many"),
        ]));
        assert!(result.unwrap_err().contains("FOODGRAM_MAX_CONNECTIONS"));
    }
}
