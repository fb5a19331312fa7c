//! Interface de linha de comando do forecast-bot baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, status, preview)
//! e flags globais (--config, --now, --verbose).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// forecast-bot: publica previsões do tempo e atualiza o painel do live thread.
#[derive(Debug, Parser)]
#[command(name = "forecast-bot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = "forecast.toml")]
    pub config: PathBuf,

    /// Avalia as regras como se fosse este instante (RFC 3339).
    #[arg(long, global = true)]
    pub now: Option<DateTime<Utc>>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa uma rodada: publica e/ou atualiza o painel se as regras mandarem.
    Run,

    /// Mostra o estado persistido, a regra ativa e o que está pendente.
    Status,

    /// Busca os dados e imprime o post e o painel sem publicar nada.
    Preview,
}
