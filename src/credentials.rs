//! Credential loading from the environment or a local TOML file.
//!
//! Sources are queried in order until one yields credentials: environment
//! variables first, then the credentials file. Missing credentials are a
//! configuration error reported before any network activity.
//!
//! # File format
//!
//! ```toml
//! server = "https://example.social"
//! access_token = "..."
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

/// Environment variable naming the server base URL.
pub const ENV_SERVER: &str = "TIDYFEED_SERVER";
/// Environment variable holding the access token.
pub const ENV_ACCESS_TOKEN: &str = "TIDYFEED_ACCESS_TOKEN";

/// Resolved credentials for one server.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Base URL of the server, e.g. `https://example.social`.
    pub server: Url,
    pub access_token: String,
}

/// Why credentials could not be loaded. All variants are fatal.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{set} is set but {unset} is not; set both or neither")]
    PartialEnvironment {
        set: &'static str,
        unset: &'static str,
    },

    #[error("failed to read credentials file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("failed to parse credentials file {1}: {0}")]
    Parse(toml::de::Error, PathBuf),

    #[error("invalid server URL {url:?}: {source}")]
    InvalidServer {
        url: String,
        source: url::ParseError,
    },

    #[error(
        "no credentials found: set {ENV_SERVER} and {ENV_ACCESS_TOKEN}, \
         or create {0}"
    )]
    Missing(PathBuf),
}

/// On-disk credentials file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialsFile {
    server: String,
    access_token: String,
}

/// One place credentials may come from.
enum CredentialSource {
    Environment,
    File { path: PathBuf, explicit: bool },
}

impl CredentialSource {
    /// Try this source. `Ok(None)` means "not present here, try the next
    /// one"; errors are terminal (a present-but-broken source must not fall
    /// through to a different one).
    fn resolve(&self) -> Result<Option<Credentials>, CredentialError> {
        match self {
            Self::Environment => {
                let server = std::env::var(ENV_SERVER).ok();
                let token = std::env::var(ENV_ACCESS_TOKEN).ok();
                match (server, token) {
                    (Some(server), Some(token)) => {
                        Ok(Some(build_credentials(&server, token)?))
                    }
                    (Some(_), None) => Err(CredentialError::PartialEnvironment {
                        set: ENV_SERVER,
                        unset: ENV_ACCESS_TOKEN,
                    }),
                    (None, Some(_)) => Err(CredentialError::PartialEnvironment {
                        set: ENV_ACCESS_TOKEN,
                        unset: ENV_SERVER,
                    }),
                    (None, None) => Ok(None),
                }
            }
            Self::File { path, explicit } => {
                if !path.is_file() {
                    // A path the operator asked for must exist; the default
                    // location is allowed to be absent.
                    if *explicit {
                        return Err(CredentialError::Io(
                            std::io::Error::new(
                                std::io::ErrorKind::NotFound,
                                "file not found",
                            ),
                            path.clone(),
                        ));
                    }
                    return Ok(None);
                }

                let contents = std::fs::read_to_string(path)
                    .map_err(|e| CredentialError::Io(e, path.clone()))?;
                let file: CredentialsFile = toml::from_str(&contents)
                    .map_err(|e| CredentialError::Parse(e, path.clone()))?;
                Ok(Some(build_credentials(&file.server, file.access_token)?))
            }
        }
    }
}

fn build_credentials(server: &str, access_token: String) -> Result<Credentials, CredentialError> {
    let server = Url::parse(server).map_err(|source| CredentialError::InvalidServer {
        url: server.to_string(),
        source,
    })?;
    Ok(Credentials {
        server,
        access_token,
    })
}

/// Default credentials file location, `~/.config/tidyfeed/credentials.toml`.
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tidyfeed").join("credentials.toml"))
}

/// Load credentials, trying the environment first and then the file.
///
/// `path_override` replaces the default file location and must exist when
/// given.
pub fn load(path_override: Option<&Path>) -> Result<Credentials, CredentialError> {
    let file_path = match path_override {
        Some(path) => Some(CredentialSource::File {
            path: path.to_path_buf(),
            explicit: true,
        }),
        None => default_credentials_path().map(|path| CredentialSource::File {
            path,
            explicit: false,
        }),
    };

    let sources = std::iter::once(CredentialSource::Environment).chain(file_path);

    for source in sources {
        if let Some(credentials) = source.resolve()? {
            return Ok(credentials);
        }
    }

    Err(CredentialError::Missing(
        default_credentials_path().unwrap_or_else(|| PathBuf::from("credentials.toml")),
    ))
}
