use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub cookie_secure: bool,
    pub uploads_dir: String,
    pub max_upload_bytes: usize,
    pub seed_demo_board: bool,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(21547),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:kanban.db".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".into()),
            cookie_secure: env_flag("COOKIE_SECURE")?,
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()),
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(v) => v
                    .parse()
                    .map_err(|e| anyhow::anyhow!("MAX_UPLOAD_BYTES must be a number: {}", e))?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            seed_demo_board: env_flag("SEED_DEMO_BOARD")?,
        })
    }
}

fn env_flag(name: &str) -> Result<bool, anyhow::Error> {
    match std::env::var(name) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("{} must be a boolean, got '{}'", name, other),
        },
        Err(_) => Ok(false),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            database_url: "sqlite:kanban.db".into(),
            cors_origin: "http://localhost:5173,http://127.0.0.1:5173".into(),
            cookie_secure: false,
            uploads_dir: "uploads".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            seed_demo_board: false,
        }
    }
}
