use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{AidgeError, Result};

/// Default environment variable holding the access key name.
pub const ACCESS_KEY_ENV: &str = "AIDGE_ACCESS_KEY";

/// Default environment variable holding the access key secret.
pub const ACCESS_SECRET_ENV: &str = "AIDGE_ACCESS_SECRET";

/// Aidge access key credential.
///
/// The `Debug` implementation redacts `access_key_secret` to prevent
/// accidental leakage in logs.
#[derive(Clone)]
pub struct Credential {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl Credential {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    /// Rejects blank key names or secrets.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.access_key_id.trim().is_empty() {
            return Err(AidgeError::Credential("access key id is empty".into()));
        }
        if self.access_key_secret.trim().is_empty() {
            return Err(AidgeError::Credential("access key secret is empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"****")
            .finish()
    }
}

/// Resolves a [`Credential`] from a specific source.
pub trait CredentialProvider {
    /// Attempt to resolve a credential from this provider.
    fn resolve(&self) -> Result<Credential>;
}

/// Provides a credential from explicitly specified values.
pub struct StaticProvider {
    credential: Credential,
}

impl StaticProvider {
    /// Always resolves to the given pair.
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(access_key_id, access_key_secret),
        }
    }
}

impl CredentialProvider for StaticProvider {
    fn resolve(&self) -> Result<Credential> {
        Ok(self.credential.clone())
    }
}

/// Provides a credential from a pair of environment variables.
///
/// Defaults to `AIDGE_ACCESS_KEY` and `AIDGE_ACCESS_SECRET`.
pub struct EnvProvider {
    id_var: String,
    secret_var: String,
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::with_names(ACCESS_KEY_ENV, ACCESS_SECRET_ENV)
    }
}

impl EnvProvider {
    /// Reads the credential from custom variable names.
    pub fn with_names(id_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            id_var: id_var.into(),
            secret_var: secret_var.into(),
        }
    }

    /// Reads `accessKey` and `secret`, the names used by the Aidge sample programs.
    pub fn legacy() -> Self {
        Self::with_names("accessKey", "secret")
    }
}

impl CredentialProvider for EnvProvider {
    fn resolve(&self) -> Result<Credential> {
        let id = env::var(&self.id_var)
            .map_err(|_| AidgeError::Credential(format!("{} not set", self.id_var)))?;
        let secret = env::var(&self.secret_var)
            .map_err(|_| AidgeError::Credential(format!("{} not set", self.secret_var)))?;

        if id.is_empty() || secret.is_empty() {
            return Err(AidgeError::Credential(format!(
                "{} or {} is empty",
                self.id_var, self.secret_var
            )));
        }

        Ok(Credential {
            access_key_id: id,
            access_key_secret: secret,
        })
    }
}

/// Provides a credential from the Aidge credentials profile file.
///
/// Reads `~/.aidge/credentials` in INI format. The default profile
/// name is `default`.
pub struct ProfileProvider {
    profile_name: String,
    file_path: Option<PathBuf>,
}

impl Default for ProfileProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileProvider {
    /// Creates a provider that reads the `default` profile.
    pub fn new() -> Self {
        Self {
            profile_name: "default".to_string(),
            file_path: None,
        }
    }

    /// Specifies a custom profile name.
    pub fn with_profile(mut self, name: impl Into<String>) -> Self {
        self.profile_name = name.into();
        self
    }

    /// Specifies a custom file path instead of the default location.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    fn default_path() -> Result<PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| AidgeError::Config("cannot determine home directory".into()))?;
        Ok(PathBuf::from(home).join(".aidge").join("credentials"))
    }

    fn parse_ini(content: &str, profile: &str) -> Result<Credential> {
        let section_header = format!("[{}]", profile);
        let mut in_section = false;
        let mut access_key_id = None;
        let mut access_key_secret = None;

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('[') {
                in_section = line == section_header;
                continue;
            }
            if !in_section || line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "access_key_id" => access_key_id = Some(value.trim().to_string()),
                    "access_key_secret" => access_key_secret = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        match (access_key_id, access_key_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok(Credential {
                access_key_id: id,
                access_key_secret: secret,
            }),
            _ => Err(AidgeError::Credential(format!(
                "profile '{}' missing access_key_id or access_key_secret",
                profile
            ))),
        }
    }
}

impl CredentialProvider for ProfileProvider {
    fn resolve(&self) -> Result<Credential> {
        let path = match &self.file_path {
            Some(p) => p.clone(),
            None => Self::default_path()?,
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            AidgeError::Credential(format!(
                "cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse_ini(&content, &self.profile_name)
    }
}

/// Tries multiple credential providers in order and returns the first success.
pub struct ChainProvider {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainProvider {
    /// Creates a chain with the given providers.
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Creates the default credential chain: `AIDGE_*` env → legacy env → profile.
    pub fn default_chain() -> Self {
        Self {
            providers: vec![
                Box::new(EnvProvider::default()),
                Box::new(EnvProvider::legacy()),
                Box::new(ProfileProvider::new()),
            ],
        }
    }
}

impl CredentialProvider for ChainProvider {
    fn resolve(&self) -> Result<Credential> {
        let mut last_err = AidgeError::Credential("no credential providers configured".into());
        for provider in &self.providers {
            match provider.resolve() {
                Ok(cred) => return Ok(cred),
                Err(e) => {
                    tracing::debug!(error = %e, "credential provider skipped");
                    last_err = e;
                }
            }
        }
        Err(AidgeError::Credential(format!(
            "all credential providers failed, last error: {}",
            last_err
        )))
    }
}
