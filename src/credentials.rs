use std::path::Path;

use aws_sdk_sts::{config::Credentials, types};
use aws_smithy_types::{DateTime, date_time::Format};
use configparser::ini::Ini;

use crate::error::{Error, Result};

/// Temporary session credentials issued by the token service. Produced once
/// per run and handed unchanged to the store or the console formatter.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

impl SessionCredentials {
    /// Expiration rendered for operator output. Never written to the file.
    pub fn expiration_timestamp(&self) -> Result<String> {
        Ok(self.expiration.fmt(Format::DateTime)?)
    }
}

impl From<&types::Credentials> for SessionCredentials {
    fn from(credentials: &types::Credentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: credentials.expiration().to_owned(),
        }
    }
}

/// Long-term keys of the source profile, used only to construct the
/// identity-service clients.
#[derive(Debug)]
pub struct SourceCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl SourceCredentials {
    /// Reads the source profile's keys from the credentials file. Profile
    /// names are matched case-sensitively, like the rewrite engine does.
    pub fn load(path: &Path, profile: &str) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingCredentialsFile(path.to_path_buf()));
        }

        let mut ini = Ini::new_cs();
        ini.load(path)
            .map_err(|message| Error::InvalidCredentialsFile {
                path: path.to_path_buf(),
                message,
            })?;
        if !ini.sections().iter().any(|section| section == profile) {
            return Err(Error::UnknownProfile {
                profile: profile.to_string(),
            });
        }

        let get = |key: &'static str| {
            ini.get(profile, key).ok_or_else(|| Error::MissingProfileKey {
                profile: profile.to_string(),
                key,
            })
        };

        Ok(Self {
            access_key_id: get("aws_access_key_id")?,
            secret_access_key: get("aws_secret_access_key")?,
        })
    }

    pub fn into_provider(self) -> Credentials {
        Credentials::new(
            self.access_key_id,
            self.secret_access_key,
            None,
            None,
            "aws-session-token",
        )
    }
}
