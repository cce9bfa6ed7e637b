use std::path::PathBuf;
use thiserror::Error;

/// Hard-failure conditions surfaced by the conversion core. Everything else
/// travels as `anyhow::Error` with context attached at the I/O boundary.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The generated base manifest cannot be constructed without this
    /// directive.
    #[error("required directive '@{field}' is missing from the userscript header")]
    MissingField { field: &'static str },

    /// A `@grant` directive named an API with no helper script in the
    /// configured grants directory.
    #[error("grant helper for '{api}' not found (looked for {})", path.display())]
    GrantNotFound { api: String, path: PathBuf },
}
