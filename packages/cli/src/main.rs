#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the SISAGUA dashboard.
//!
//! `serve` starts the HTTP server; `summary`, `map`, and `references` run
//! the same aggregation, map, and reference-table code offline against a
//! CSV file. Settings come from the server's environment variables and
//! are overridden by flags.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sisagua_sample_models::{FilterCriteria, FilterError};
use sisagua_server::ServerConfig;

#[derive(Parser)]
#[command(name = "sisagua", about = "SISAGUA water-quality dashboard")]
struct Cli {
    /// TOML reference table replacing the embedded Portaria 888/2021 rules
    #[arg(long, global = true)]
    references: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve {
        /// Listening address
        #[arg(long)]
        bind_addr: Option<String>,
        /// Listening port
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Print compliance statistics for a CSV as JSON
    Summary {
        /// Sample CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// CSV field delimiter (a single character, or `tab`)
        #[arg(long, value_parser = sisagua_server::parse_delimiter)]
        delimiter: Option<u8>,
        /// Group the statistics instead of reporting overall figures
        #[arg(long, value_enum)]
        by: Option<GroupBy>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Write the collection map for a CSV
    Map {
        #[command(flatten)]
        paths: PathArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the active reference table
    References,
}

/// Input and output locations shared by `serve` and `map`.
#[derive(Args)]
struct PathArgs {
    /// Sample CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
    /// CSV field delimiter (a single character, or `tab`)
    #[arg(long, value_parser = sisagua_server::parse_delimiter)]
    delimiter: Option<u8>,
    /// Neighborhood boundary `GeoJSON` file
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// Directory the map is written to
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

/// Sample filters, `todos` meaning unfiltered.
#[derive(Args)]
struct FilterArgs {
    /// Year
    #[arg(long)]
    ano: Option<String>,
    /// Month number
    #[arg(long)]
    mes: Option<String>,
    /// Neighborhood
    #[arg(long)]
    bairro: Option<String>,
    /// Parameter, as written in the CSV
    #[arg(long)]
    parametro: Option<String>,
}

impl FilterArgs {
    fn to_criteria(&self) -> Result<FilterCriteria, FilterError> {
        FilterCriteria::parse(
            self.ano.as_deref(),
            self.mes.as_deref(),
            self.bairro.as_deref(),
            self.parametro.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupBy {
    Bairro,
    Mes,
    Ponto,
}

/// Applies command-line overrides on top of `config`.
fn apply_overrides(
    mut config: ServerConfig,
    references: Option<PathBuf>,
    paths: PathArgs,
) -> ServerConfig {
    if let Some(csv) = paths.csv {
        config.csv_path = csv;
    }
    if let Some(delimiter) = paths.delimiter {
        config.csv_delimiter = delimiter;
    }
    if let Some(geojson) = paths.geojson {
        config.geojson_path = geojson;
    }
    if let Some(static_dir) = paths.static_dir {
        config.static_dir = static_dir;
    }
    if references.is_some() {
        config.references_path = references;
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = ServerConfig::from_env();

    match cli.command {
        Commands::Serve {
            bind_addr,
            port,
            paths,
        } => {
            let mut config = apply_overrides(config, cli.references, paths);
            if let Some(bind_addr) = bind_addr {
                config.bind_addr = bind_addr;
            }
            if let Some(port) = port {
                config.port = port;
            }
            actix_web::rt::System::new().block_on(sisagua_server::run_server(config))?;
        }
        Commands::Summary {
            csv,
            delimiter,
            by,
            filters,
        } => {
            let config = apply_overrides(
                config,
                cli.references,
                PathArgs {
                    csv,
                    delimiter,
                    geojson: None,
                    static_dir: None,
                },
            );
            let json = commands::summary(&config, &filters.to_criteria()?, by)?;
            println!("{json}");
        }
        Commands::Map { paths, filters } => {
            let config = apply_overrides(config, cli.references, paths);
            let path = commands::map(&config, &filters.to_criteria()?)?;
            println!("{}", path.display());
        }
        Commands::References => {
            let config = apply_overrides(
                config,
                cli.references,
                PathArgs {
                    csv: None,
                    delimiter: None,
                    geojson: None,
                    static_dir: None,
                },
            );
            print!("{}", commands::references(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_summary_with_filters_and_grouping() {
        let cli = Cli::try_parse_from([
            "sisagua", "summary", "--ano", "2023", "--mes", "todos", "--by", "mes",
        ])
        .unwrap();
        let Commands::Summary { by, filters, .. } = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(by, Some(GroupBy::Mes));
        let criteria = filters.to_criteria().unwrap();
        assert_eq!(criteria.year, Some(2023));
        assert_eq!(criteria.month, None);
    }

    #[test]
    fn global_references_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "sisagua",
            "map",
            "--csv",
            "amostras.csv",
            "--references",
            "regras.toml",
        ])
        .unwrap();
        let Commands::Map { paths, .. } = cli.command else {
            panic!("expected map");
        };
        let config = apply_overrides(ServerConfig::default(), cli.references, paths);
        assert_eq!(config.csv_path, PathBuf::from("amostras.csv"));
        assert_eq!(config.references_path, Some(PathBuf::from("regras.toml")));
        assert_eq!(config.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn delimiter_flag_overrides_config() {
        let cli = Cli::try_parse_from(["sisagua", "map", "--delimiter", ";"]).unwrap();
        let Commands::Map { paths, .. } = cli.command else {
            panic!("expected map");
        };
        let config = apply_overrides(ServerConfig::default(), None, paths);
        assert_eq!(config.csv_delimiter, b';');

        assert!(Cli::try_parse_from(["sisagua", "summary", "--delimiter", ";;"]).is_err());
    }

    #[test]
    fn rejects_unknown_grouping() {
        assert!(Cli::try_parse_from(["sisagua", "summary", "--by", "ano"]).is_err());
    }
}
