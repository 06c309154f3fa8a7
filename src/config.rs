/// Configuration: connection string parsing and workflow settings
///
/// The connection string is the only credential input. It is handed to the
/// program explicitly (flag or environment) and parsed once into an
/// immutable `ConnectionConfig`.

use azure_core::Url;
use std::fmt;
use std::path::PathBuf;

use crate::error::{QuickstartError, Result};
use crate::storage::{AccessLevel, ListingMode};

pub const DEFAULT_CONTAINER: &str = "quickstartcontainer";
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

pub const EMULATOR_ACCOUNT: &str = "devstoreaccount1";
pub const EMULATOR_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const EMULATOR_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// Parsed storage connection string
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub protocol: Protocol,
    pub account_name: String,
    pub account_key: String,
    pub endpoint_suffix: String,
    /// Explicit blob endpoint, e.g. a local emulator
    pub blob_endpoint: Option<Url>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("protocol", &self.protocol)
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("endpoint_suffix", &self.endpoint_suffix)
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

impl ConnectionConfig {
    /// Parse a `Key=Value;Key=Value` connection string.
    ///
    /// Keys match case-insensitively and unknown keys are ignored.
    /// `AccountName` and `AccountKey` are required unless the string is
    /// `UseDevelopmentStorage=true`.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;
        let mut development = false;

        for part in connection_string.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part.split_once('=').ok_or_else(|| {
                QuickstartError::Configuration(format!(
                    "Invalid connection string segment '{}': expected Key=Value",
                    part
                ))
            })?;
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = Some(parse_protocol(value)?),
                "accountname" => account_name = Some(value.to_string()),
                "accountkey" => account_key = Some(value.to_string()),
                "endpointsuffix" => endpoint_suffix = Some(value.to_string()),
                "blobendpoint" => {
                    let url = Url::parse(value).map_err(|e| {
                        QuickstartError::Configuration(format!(
                            "Invalid BlobEndpoint '{}': {}",
                            value, e
                        ))
                    })?;
                    blob_endpoint = Some(url);
                }
                "usedevelopmentstorage" => development = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if development {
            return Ok(Self::development_storage());
        }

        let account_name = account_name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| QuickstartError::Configuration("Invalid connection string: missing AccountName".to_string()))?;
        let account_key = account_key
            .filter(|v| !v.is_empty())
            .ok_or_else(|| QuickstartError::Configuration("Invalid connection string: missing AccountKey".to_string()))?;

        Ok(Self {
            protocol: protocol.unwrap_or(Protocol::Https),
            account_name,
            account_key,
            endpoint_suffix: endpoint_suffix.unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string()),
            blob_endpoint,
        })
    }

    /// The well-known local emulator account.
    pub fn development_storage() -> Self {
        Self {
            protocol: Protocol::Http,
            account_name: EMULATOR_ACCOUNT.to_string(),
            account_key: EMULATOR_ACCOUNT_KEY.to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            blob_endpoint: Url::parse(EMULATOR_BLOB_ENDPOINT).ok(),
        }
    }

    /// Base URL of the blob service for this account
    pub fn blob_endpoint(&self) -> String {
        match &self.blob_endpoint {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.blob.{}",
                self.protocol.scheme(),
                self.account_name,
                self.endpoint_suffix
            ),
        }
    }

    /// True when the endpoint is the public cloud default and needs no custom location
    pub fn is_public_cloud(&self) -> bool {
        self.blob_endpoint.is_none()
            && self.protocol == Protocol::Https
            && self.endpoint_suffix == DEFAULT_ENDPOINT_SUFFIX
    }
}

fn parse_protocol(value: &str) -> Result<Protocol> {
    match value.to_ascii_lowercase().as_str() {
        "https" => Ok(Protocol::Https),
        "http" => Ok(Protocol::Http),
        other => Err(QuickstartError::Configuration(format!(
            "Unsupported DefaultEndpointsProtocol '{}'",
            other
        ))),
    }
}

/// Settings for one run of the workflow
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub container_name: String,
    pub access_level: AccessLevel,
    pub listing: ListingMode,
    pub first_payload: String,
    pub second_payload: String,
    pub first_prefix: String,
    pub second_prefix: String,
    pub file_suffix: String,
    pub download_file_name: String,
    /// Parent of the per-run scratch directory; the platform temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            container_name: DEFAULT_CONTAINER.to_string(),
            access_level: AccessLevel::Container,
            listing: ListingMode::Flat,
            first_payload: "Hello Azure!".to_string(),
            second_payload: "Hello Azure Again!".to_string(),
            first_prefix: "sampleFileA".to_string(),
            second_prefix: "sampleFileB".to_string(),
            file_suffix: ".txt".to_string(),
            download_file_name: "downloadedFile.txt".to_string(),
            scratch_dir: None,
        }
    }
}

impl WorkflowConfig {
    pub fn with_container(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    pub fn with_listing(mut self, listing: ListingMode) -> Self {
        self.listing = listing;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "DefaultEndpointsProtocol=https;AccountName=quickstart;AccountKey=c2VjcmV0;";

    #[test]
    fn test_parse_standard_connection_string() {
        let config = ConnectionConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.protocol, Protocol::Https);
        assert_eq!(config.account_name, "quickstart");
        assert_eq!(config.account_key, "c2VjcmV0");
        assert_eq!(config.blob_endpoint(), "https://quickstart.blob.core.windows.net");
        assert!(config.is_public_cloud());
    }

    #[test]
    fn test_keys_are_case_insensitive_and_key_may_contain_equals() {
        let config =
            ConnectionConfig::parse("accountname=acct;ACCOUNTKEY=abc==;defaultendpointsprotocol=HTTP")
                .unwrap();
        assert_eq!(config.account_key, "abc==");
        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.blob_endpoint(), "http://acct.blob.core.windows.net");
        assert!(!config.is_public_cloud());
    }

    #[test]
    fn test_missing_fields_are_configuration_errors() {
        let err = ConnectionConfig::parse("AccountName=acct").unwrap_err();
        assert!(matches!(err, QuickstartError::Configuration(ref m) if m.contains("AccountKey")));

        let err = ConnectionConfig::parse("AccountKey=abc").unwrap_err();
        assert!(matches!(err, QuickstartError::Configuration(ref m) if m.contains("AccountName")));

        let err = ConnectionConfig::parse("").unwrap_err();
        assert!(matches!(err, QuickstartError::Configuration(_)));
    }

    #[test]
    fn test_malformed_segments_are_rejected() {
        assert!(ConnectionConfig::parse("AccountName=a;garbage;AccountKey=b").is_err());
        assert!(ConnectionConfig::parse("DefaultEndpointsProtocol=ftp;AccountName=a;AccountKey=b").is_err());
        assert!(ConnectionConfig::parse("AccountName=a;AccountKey=b;BlobEndpoint=not a url").is_err());
    }

    #[test]
    fn test_explicit_blob_endpoint_wins() {
        let config = ConnectionConfig::parse(
            "AccountName=devstoreaccount1;AccountKey=abc;BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1/",
        )
        .unwrap();
        assert_eq!(config.blob_endpoint(), "http://127.0.0.1:10000/devstoreaccount1");
        assert!(!config.is_public_cloud());
    }

    #[test]
    fn test_development_storage_shortcut() {
        let config = ConnectionConfig::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(config, ConnectionConfig::development_storage());
        assert_eq!(config.account_name, EMULATOR_ACCOUNT);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ConnectionConfig::parse(SAMPLE).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("c2VjcmV0"));
        assert!(printed.contains("quickstart"));
    }

    #[test]
    fn test_workflow_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.container_name, "quickstartcontainer");
        assert_eq!(config.access_level, AccessLevel::Container);
        assert_eq!(config.first_payload, "Hello Azure!");
        assert_eq!(config.second_payload, "Hello Azure Again!");
    }
}
