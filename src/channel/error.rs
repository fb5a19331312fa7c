//! Tipos de erro para o cliente do live thread.

use thiserror::Error;

/// Erros que podem ocorrer ao publicar ou editar o live thread.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Erro HTTP retornado pela API (4xx/5xx).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A API respondeu 2xx mas recusou a operação (`json.errors` não vazio).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// O corpo da resposta não tem o formato esperado.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// O cliente HTTP não pôde ser construído (ex.: user agent inválido).
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
