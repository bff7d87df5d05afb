use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub database_url: String,
    /// Scheme and authority used when building share links.
    pub public_base_url: String,
    pub cors_origin: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Folder tree file storage with share links")]
pub struct Args {
    /// Host to bind to (overrides FILE_VAULT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_VAULT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding uploaded files (overrides FILE_VAULT_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Database URL (overrides FILE_VAULT_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL prepended to share links (overrides FILE_VAULT_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Browser origin allowed by CORS (overrides FILE_VAULT_CORS_ORIGIN)
    #[arg(long)]
    pub cors_origin: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::from_sources(args, |key| env::var(key).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge `args` over values found through `lookup` over defaults.
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Environment fallback ---
        let env_host = lookup("FILE_VAULT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("FILE_VAULT_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILE_VAULT_PORT value `{}`", value))?,
            None => 8080,
        };
        let env_upload = lookup("FILE_VAULT_UPLOAD_DIR").unwrap_or_else(|| "./uploads".into());
        let env_db = lookup("FILE_VAULT_DATABASE_URL")
            .unwrap_or_else(|| "sqlite://./data/meta/file_vault.db".into());
        let env_cors =
            lookup("FILE_VAULT_CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".into());

        // --- Merge ---
        let port = args.port.unwrap_or(env_port);
        let public_base_url = args
            .public_base_url
            .or_else(|| lookup("FILE_VAULT_PUBLIC_BASE_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port,
            upload_dir: args.upload_dir.unwrap_or(env_upload),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url,
            cors_origin: args.cors_origin.unwrap_or(env_cors),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload directory resolved against the current working directory.
    pub fn upload_root(&self) -> Result<PathBuf> {
        let dir = PathBuf::from(&self.upload_dir);
        if dir.is_absolute() {
            return Ok(dir);
        }
        let cwd = env::current_dir().context("reading current working directory")?;
        Ok(cwd.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn build(argv: &[&str], env: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let args = Args::parse_from(std::iter::once("file-vault").chain(argv.iter().copied()));
        AppConfig::from_sources(args, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = build(&[], &[]).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:8080");
        assert_eq!(cfg.upload_dir, "./uploads");
        assert_eq!(cfg.database_url, "sqlite://./data/meta/file_vault.db");
        assert_eq!(cfg.public_base_url, "http://localhost:8080");
        assert_eq!(cfg.cors_origin, "http://localhost:3000");
    }

    #[test]
    fn test_flags_override_env() {
        let cfg = build(
            &["--port", "9000", "--upload-dir", "/srv/files"],
            &[
                ("FILE_VAULT_PORT", "7000"),
                ("FILE_VAULT_UPLOAD_DIR", "/env/files"),
                ("FILE_VAULT_HOST", "127.0.0.1"),
            ],
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.upload_dir, "/srv/files");
        assert_eq!(cfg.public_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_public_base_url_from_env() {
        let cfg = build(&[], &[("FILE_VAULT_PUBLIC_BASE_URL", "https://files.example")]).unwrap();
        assert_eq!(cfg.public_base_url, "https://files.example");
    }

    #[test]
    fn test_bad_env_port_is_error() {
        let err = build(&[], &[("FILE_VAULT_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("FILE_VAULT_PORT"));
    }

    #[test]
    fn test_upload_root_is_absolute() {
        let cfg = build(&["--upload-dir", "uploads"], &[]).unwrap();
        let root = cfg.upload_root().unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("uploads"));

        let cfg = build(&["--upload-dir", "/srv/files"], &[]).unwrap();
        assert_eq!(cfg.upload_root().unwrap(), PathBuf::from("/srv/files"));
    }
}
