//! Provider block configuration with environment variable fallback

use crate::api::{ApiError, Client};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub const ENDPOINT_ENV: &str = "NIOS_HOST";
pub const USERNAME_ENV: &str = "NIOS_USERNAME";
pub const PASSWORD_ENV: &str = "NIOS_PASSWORD";
pub const WAPI_VERSION_ENV: &str = "NIOS_WAPI_VERSION";
pub const INSECURE_ENV: &str = "NIOS_INSECURE";

pub const DEFAULT_WAPI_VERSION: &str = "2.12";

#[derive(Clone)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub wapi_version: String,
    pub insecure: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("wapi_version", &self.wapi_version)
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolves every setting from the provider block, then the environment.
    /// All problems are reported together.
    pub fn resolve(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = vec![];

        let endpoint = required(config, "endpoint", ENDPOINT_ENV, &mut diagnostics);
        let username = required(config, "username", USERNAME_ENV, &mut diagnostics);
        let password = required(config, "password", PASSWORD_ENV, &mut diagnostics);

        let wapi_version = string_setting(config, "wapi_version", WAPI_VERSION_ENV, &mut diagnostics)
            .unwrap_or_else(|| DEFAULT_WAPI_VERSION.to_string());

        let insecure = match config.get_optional_bool(&AttributePath::new("insecure")) {
            Ok(Some(insecure)) => insecure,
            Ok(None) => match std::env::var(INSECURE_ENV) {
                Ok(raw) => raw.parse::<bool>().unwrap_or_else(|_| {
                    diagnostics.push(Diagnostic::error(
                        "Invalid insecure setting",
                        format!("{} must be 'true' or 'false', got '{}'", INSECURE_ENV, raw),
                    ));
                    false
                }),
                Err(_) => false,
            },
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Invalid insecure setting", e.to_string())
                        .with_attribute(AttributePath::new("insecure")),
                );
                false
            }
        };

        if let Some(endpoint) = &endpoint {
            if let Err(e) = url::Url::parse(endpoint) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid endpoint",
                        format!("'{}' is not a valid URL: {}", endpoint, e),
                    )
                    .with_attribute(AttributePath::new("endpoint")),
                );
            }
        }

        match (endpoint, username, password) {
            (Some(endpoint), Some(username), Some(password)) if diagnostics.is_empty() => {
                Ok(Self {
                    endpoint,
                    username,
                    password,
                    wapi_version,
                    insecure,
                })
            }
            _ => Err(diagnostics),
        }
    }

    pub fn client(&self) -> Result<Client, ApiError> {
        Client::new(
            &self.endpoint,
            &self.wapi_version,
            &self.username,
            &self.password,
            self.insecure,
        )
    }
}

fn string_setting(
    config: &DynamicValue,
    name: &str,
    env: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    match config.get_optional_string(&AttributePath::new(name)) {
        Ok(Some(value)) if !value.is_empty() => Some(value),
        Ok(_) => std::env::var(env).ok().filter(|v| !v.is_empty()),
        Err(e) => {
            diagnostics.push(
                Diagnostic::error(format!("Invalid {}", name), e.to_string())
                    .with_attribute(AttributePath::new(name)),
            );
            None
        }
    }
}

fn required(
    config: &DynamicValue,
    name: &str,
    env: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let errors_before = diagnostics.len();
    let value = string_setting(config, name, env, diagnostics);
    if value.is_none() && diagnostics.len() == errors_before {
        diagnostics.push(
            Diagnostic::error(
                format!("Missing {}", name),
                format!(
                    "{} is required (set in provider config or {} env var)",
                    name, env
                ),
            )
            .with_attribute(AttributePath::new(name)),
        );
    }
    value
}
