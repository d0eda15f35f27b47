use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub seed_on_startup: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());
        let seed_on_startup = env::var("SEED_ON_STARTUP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Ok(AppConfig {
            host,
            port,
            environment,
            jwt_secret,
            seed_on_startup,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_address() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "test".to_string(),
            jwt_secret: "secret".to_string(),
            seed_on_startup: false,
        };

        assert_eq!(config.server_address(), "127.0.0.1:8080");
        assert!(!config.is_development());
        assert!(!config.is_production());
    }
}
