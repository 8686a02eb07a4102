use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VivariaError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(vivaria::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(vivaria::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(vivaria::serde))]
    Serde(#[from] serde_json::Error),

    /// A grant-store fetch failed. This is the one error the authorization
    /// core surfaces: "could not determine" must stay distinct from
    /// "denied".
    #[error("Database error: {0}")]
    #[diagnostic(code(vivaria::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("{0}")]
    #[diagnostic(code(vivaria::other))]
    Other(String),
}
