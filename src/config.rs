//! Configuração do forecast-bot carregada a partir de `forecast.toml`.
//!
//! A struct [`ForecastConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `FORECAST_WEATHER_KEY` e `FORECAST_CHANNEL_TOKEN`
//! têm precedência sobre o arquivo.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::orchestrator::RunSettings;

/// Configuração de nível superior carregada de `forecast.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Identificador do live thread onde as atualizações são publicadas.
    #[serde(default = "default_thread_id")]
    pub thread_id: String,

    /// Fuso horário (IANA) usado no carimbo "Last updated" do painel.
    #[serde(default = "default_reference_timezone")]
    pub reference_timezone: String,

    /// Instante assumido para as duas ações antes da primeira execução.
    #[serde(default = "default_epoch")]
    pub default_epoch: DateTime<Utc>,

    /// Arquivo JSON com o estado persistido.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Arquivo TOML com regras e localidades.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,

    /// Chave da API de previsão do tempo.
    #[serde(default)]
    pub weather_api_key: String,

    #[serde(default = "default_channel_base_url")]
    pub channel_base_url: String,

    /// Token OAuth (bearer) para o live thread.
    #[serde(default)]
    pub channel_access_token: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Máximo de localidades incluídas no relatório.
    #[serde(default = "default_max_locations")]
    pub max_locations: usize,

    /// Timeout de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_thread_id() -> String {
    "zersmomw72dw".to_string()
}

fn default_reference_timezone() -> String {
    "America/Los_Angeles".to_string()
}

// Instante padrão: 2017-08-13T00:00:00Z.
fn default_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_502_582_400, 0).unwrap_or_default()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("forecast-state.json")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("schedule.toml")
}

fn default_weather_base_url() -> String {
    "https://api.darksky.net".to_string()
}

fn default_channel_base_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_user_agent() -> String {
    concat!("forecast-bot/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_locations() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            thread_id: default_thread_id(),
            reference_timezone: default_reference_timezone(),
            default_epoch: default_epoch(),
            state_path: default_state_path(),
            catalog_path: default_catalog_path(),
            weather_base_url: default_weather_base_url(),
            weather_api_key: String::new(),
            channel_base_url: default_channel_base_url(),
            channel_access_token: String::new(),
            user_agent: default_user_agent(),
            max_locations: default_max_locations(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ForecastConfig {
    /// Carrega a configuração de `path`.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<ForecastConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo para os segredos.
        if let Ok(key) = std::env::var("FORECAST_WEATHER_KEY")
            && !key.is_empty()
        {
            config.weather_api_key = key;
        }
        if let Ok(token) = std::env::var("FORECAST_CHANNEL_TOKEN")
            && !token.is_empty()
        {
            config.channel_access_token = token;
        }

        Ok(config)
    }

    pub fn reference_tz(&self) -> Result<Tz> {
        self.reference_timezone
            .parse()
            .map_err(|_| anyhow!("unknown reference_timezone `{}`", self.reference_timezone))
    }

    pub fn run_settings(&self) -> Result<RunSettings> {
        Ok(RunSettings {
            default_epoch: self.default_epoch,
            reference_timezone: self.reference_tz()?,
        })
    }
}
