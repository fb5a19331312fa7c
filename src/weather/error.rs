//! Tipos de erro para o cliente de previsão do tempo.
//!
//! Define [`WeatherError`] com variantes para erros da API, respostas
//! malformadas e falhas de rede.

use thiserror::Error;

/// Erros que podem ocorrer ao consultar o provedor de previsão do tempo.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Erro retornado pela API (ex.: 403 chave inválida, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A resposta não contém o bloco `currently` esperado.
    #[error("malformed forecast response: {0}")]
    Malformed(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
