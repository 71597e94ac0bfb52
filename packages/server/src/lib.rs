#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the SISAGUA water-quality dashboard.
//!
//! Serves the dashboard page, the JSON aggregate endpoints, and the
//! generated collection map from the static directory. Every request
//! re-reads the CSV; the only shared state is the immutable reference
//! table and the configured paths.

mod dashboard;
mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use sisagua_compliance::{ComplianceError, ReferenceTable};
use sisagua_loader::{CsvSource, DEFAULT_CSV_PATH};

/// Default boundary file published by the city of Salvador.
pub const DEFAULT_GEOJSON_PATH: &str = "Delimitação_dos_Bairros_-_Dec._32.791_2020.geojson";

/// Default directory for the generated map and other static files.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5001;

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The reference table could not be loaded.
    #[error("Failed to load reference table: {0}")]
    References(#[from] ComplianceError),

    /// Binding or running the HTTP server failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listening address.
    pub bind_addr: String,
    /// Listening port.
    pub port: u16,
    /// Sample CSV file.
    pub csv_path: PathBuf,
    /// Field delimiter of the CSV file.
    pub csv_delimiter: u8,
    /// Neighborhood boundary `GeoJSON` file.
    pub geojson_path: PathBuf,
    /// Directory the map is written to and served from.
    pub static_dir: PathBuf,
    /// Optional TOML reference table replacing the embedded one.
    pub references_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            csv_delimiter: b',',
            geojson_path: PathBuf::from(DEFAULT_GEOJSON_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            references_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the environment.
    ///
    /// Recognized variables: `BIND_ADDR`, `PORT`, `SISAGUA_CSV`,
    /// `SISAGUA_CSV_DELIMITER`, `SISAGUA_GEOJSON`, `SISAGUA_STATIC_DIR`,
    /// and `SISAGUA_REFERENCES`.
    /// Unset or unparsable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let path_var = |name: &str| std::env::var_os(name).map(PathBuf::from);

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            csv_path: path_var("SISAGUA_CSV").unwrap_or(defaults.csv_path),
            csv_delimiter: std::env::var("SISAGUA_CSV_DELIMITER")
                .ok()
                .and_then(|d| parse_delimiter(&d).ok())
                .unwrap_or(defaults.csv_delimiter),
            geojson_path: path_var("SISAGUA_GEOJSON").unwrap_or(defaults.geojson_path),
            static_dir: path_var("SISAGUA_STATIC_DIR").unwrap_or(defaults.static_dir),
            references_path: path_var("SISAGUA_REFERENCES"),
        }
    }

    /// The configured sample CSV.
    #[must_use]
    pub fn csv_source(&self) -> CsvSource {
        CsvSource::new(&self.csv_path).with_delimiter(self.csv_delimiter)
    }
}

/// Parses a CSV delimiter: a single ASCII character, or `tab`/`\t`.
///
/// # Errors
///
/// Returns a message if `value` is anything else.
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("invalid CSV delimiter {value:?}")),
        },
    }
}

/// Shared application state.
pub struct AppState {
    /// Where samples are read from on every request.
    pub source: CsvSource,
    /// Active compliance thresholds.
    pub table: Arc<ReferenceTable>,
    /// Directory the map is written to.
    pub static_dir: PathBuf,
    /// Neighborhood boundary file for the map overlay.
    pub geojson_path: PathBuf,
}

impl AppState {
    /// Builds the state described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::References`] if a reference table file was
    /// configured and cannot be loaded.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let table = ReferenceTable::load(config.references_path.as_deref())?;
        Ok(Self {
            source: config.csv_source(),
            table: Arc::new(table),
            static_dir: config.static_dir.clone(),
            geojson_path: config.geojson_path.clone(),
        })
    }
}

/// Registers every route. The static file service is rooted at
/// `static_dir`.
pub fn configure(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/atualizar_dados", web::post().to(handlers::update))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/bairros", web::get().to(handlers::neighborhoods))
                .route("/distribuicao_mes", web::get().to(handlers::months))
                .route(
                    "/distribuicao_ponto_coleta",
                    web::get().to(handlers::collection_points),
                )
                .route("/filtrar_dados", web::post().to(handlers::filter)),
        )
        .service(Files::new("/static", static_dir));
}

/// Starts the dashboard server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`). Logging must already be initialized.
///
/// # Errors
///
/// Returns [`ServerError`] if the reference table cannot be loaded, the
/// static directory cannot be created, or the server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = web::Data::new(AppState::from_config(&config)?);
    log::info!(
        "Using reference table '{}' with {} rules",
        state.table.name,
        state.table.parameters.len()
    );

    std::fs::create_dir_all(&config.static_dir)?;
    if !state.source.path().exists() {
        log::warn!(
            "CSV file not found: {}; the dashboard will show no samples",
            state.source.path().display()
        );
    }

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, &static_dir))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_dashboard_layout() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.csv_path, PathBuf::from("dados_sisagua_limpos.csv"));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert!(config.references_path.is_none());
    }

    #[test]
    fn parses_delimiters() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn csv_source_reads_with_configured_delimiter() {
        let dir = std::env::temp_dir().join(format!("sisagua_delim_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("amostras.csv");
        std::fs::write(&path, "bairro;parametro\nBARRA;Turbidez (uT)\n").unwrap();

        let config = ServerConfig {
            csv_path: path.clone(),
            csv_delimiter: b';',
            ..ServerConfig::default()
        };
        let source = config.csv_source();
        let records = source.read();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(source.path(), path.as_path());
        let records = records.unwrap();
        assert_eq!(records[0].neighborhood.as_deref(), Some("BARRA"));
        assert_eq!(records[0].parameter.as_deref(), Some("Turbidez (uT)"));
    }

    #[test]
    fn state_uses_embedded_table_without_file() {
        let state = AppState::from_config(&ServerConfig::default()).unwrap();
        assert_eq!(state.table.name, "Portaria GM/MS 888/2021");
    }

    #[test]
    fn missing_reference_file_is_an_error() {
        let config = ServerConfig {
            references_path: Some(PathBuf::from("no-such-references.toml")),
            ..ServerConfig::default()
        };
        assert!(matches!(
            AppState::from_config(&config),
            Err(ServerError::References(_))
        ));
    }
}
