//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    /// Tiempo máximo de la unidad atómica de una transición
    pub transition_timeout: Duration,
    /// Espera máxima por el lock de la fila del vehículo
    pub lock_timeout: Duration,
}

impl EnvironmentConfig {
    /// Leer la configuración desde el entorno
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET must be set"))?;

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: parse_var("PORT", 3000)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86_400)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| split_origins(&origins))
                .unwrap_or_default(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            transition_timeout: Duration::from_millis(parse_var("TRANSITION_TIMEOUT_MS", 5_000)?),
            lock_timeout: Duration::from_millis(parse_var("LOCK_TIMEOUT_MS", 3_000)?),
        })
    }

    /// Configuración fija para tests
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            environment: "test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 3600,
            cors_origins: Vec::new(),
            log_level: "debug".to_string(),
            transition_timeout: Duration::from_secs(5),
            lock_timeout: Duration::from_secs(3),
        }
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins() {
        assert_eq!(
            split_origins("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(split_origins("").is_empty());
    }

    #[test]
    fn test_for_tests_config() {
        let config = EnvironmentConfig::for_tests("secret");
        assert_eq!(config.environment, "test");
        assert_eq!(config.server_url(), "127.0.0.1:0");
    }
}
