use thiserror::Error;

/// Failure raised by a connector while resolving a source.
///
/// Every variant ends up as the `message` of an `error` ledger step; the
/// orchestrator never lets one escape to the caller.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source invalide: {0}")]
    Validation(String),

    #[error("URL non définie")]
    MissingUrl,

    #[error("Connexion BDD non définie")]
    MissingConnection,

    #[error("Erreur HTTP {status} sur {url}")]
    Http { status: u16, url: String },

    #[error("Erreur réseau: {0}")]
    Network(String),

    #[error("Réponse illisible: {0}")]
    Parse(String),

    #[error("Requête refusée: {0}")]
    Policy(String),

    #[error("Erreur base de données: {0}")]
    Database(String),

    #[error("Classeur illisible: {0}")]
    Spreadsheet(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}
