/// AzureBlobStorage: the storage collaborator backed by a real account
///
/// Thin layer over `azure_storage_blobs`. Each method is one logical
/// service operation; SDK errors are mapped into `QuickstartError` so the
/// workflow sees the HTTP status and service error code.

use async_trait::async_trait;
use azure_core::prelude::Delimiter;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::blob::BlobType;
use azure_storage_blobs::container::operations::list_blobs::BlobItem;
use azure_storage_blobs::container::PublicAccess;
use azure_storage_blobs::prelude::*;
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{QuickstartError, Result};
use crate::storage::{AccessLevel, BlobKind, BlobStorage, ListedItem, ListingMode};

pub struct AzureBlobStorage {
    account_name: String,
    service_client: BlobServiceClient,
}

impl AzureBlobStorage {
    /// Build the account handle. No network call is made here.
    pub fn new(config: &ConnectionConfig) -> Self {
        info!("Initializing blob service client for account {}", config.account_name);

        let credentials =
            StorageCredentials::access_key(config.account_name.clone(), config.account_key.clone());

        let builder = if config.is_public_cloud() {
            ClientBuilder::new(config.account_name.clone(), credentials)
        } else {
            let location = CloudLocation::Custom {
                account: config.account_name.clone(),
                uri: config.blob_endpoint(),
            };
            debug!("Using custom blob endpoint {}", config.blob_endpoint());
            ClientBuilder::with_location(location, credentials)
        };

        Self {
            account_name: config.account_name.clone(),
            service_client: builder.blob_service_client(),
        }
    }

    fn container_client(&self, container: &str) -> ContainerClient {
        self.service_client.container_client(container)
    }
}

impl From<AccessLevel> for PublicAccess {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Private => PublicAccess::None,
            AccessLevel::Blob => PublicAccess::Blob,
            AccessLevel::Container => PublicAccess::Container,
        }
    }
}

impl From<PublicAccess> for AccessLevel {
    fn from(access: PublicAccess) -> Self {
        match access {
            PublicAccess::None => AccessLevel::Private,
            PublicAccess::Blob => AccessLevel::Blob,
            PublicAccess::Container => AccessLevel::Container,
        }
    }
}

/// Nothing left to delete: the container is gone, or a delete of it is
/// already in flight.
fn already_deleted(err: &QuickstartError) -> bool {
    match err {
        QuickstartError::Service { status: 409, code } => code == "ContainerBeingDeleted",
        other => other.is_not_found(),
    }
}

fn blob_kind(blob_type: &BlobType) -> BlobKind {
    match blob_type {
        BlobType::BlockBlob => BlobKind::BlockBlob,
        BlobType::PageBlob => BlobKind::PageBlob,
        BlobType::AppendBlob => BlobKind::AppendBlob,
    }
}

#[async_trait]
impl BlobStorage for AzureBlobStorage {
    fn account_name(&self) -> &str {
        &self.account_name
    }

    async fn create_container_if_absent(&self, container: &str, access: AccessLevel) -> Result<bool> {
        let container_client = self.container_client(container);

        if container_client.exists().await? {
            debug!("Container {} already exists", container);
            return Ok(false);
        }

        match container_client
            .create()
            .public_access(PublicAccess::from(access))
            .await
        {
            Ok(_) => {
                info!("Created container {}", container);
                Ok(true)
            }
            Err(e) => match QuickstartError::from(e) {
                // lost a race with another creator
                QuickstartError::Service { status: 409, ref code } if code == "ContainerAlreadyExists" => {
                    debug!("Container {} created concurrently", container);
                    Ok(false)
                }
                other => Err(other),
            },
        }
    }

    async fn container_access(&self, container: &str) -> Result<Option<AccessLevel>> {
        match self.container_client(container).get_properties().await {
            Ok(response) => Ok(Some(AccessLevel::from(response.container.public_access))),
            Err(e) => match QuickstartError::from(e) {
                err if err.is_not_found() => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn upload_blob(&self, container: &str, blob: &str, data: Bytes) -> Result<()> {
        debug!("Uploading {} bytes to {}/{}", data.len(), container, blob);
        self.container_client(container)
            .blob_client(blob)
            .put_block_blob(data)
            .await?;
        Ok(())
    }

    async fn read_blob(&self, container: &str, blob: &str) -> Result<Bytes> {
        let data = self
            .container_client(container)
            .blob_client(blob)
            .get_content()
            .await?;
        Ok(Bytes::from(data))
    }

    async fn list_blobs(&self, container: &str, mode: ListingMode) -> Result<Vec<ListedItem>> {
        let container_client = self.container_client(container);

        let mut builder = container_client.list_blobs();
        if mode == ListingMode::Hierarchical {
            builder = builder.delimiter(Delimiter::new("/"));
        }

        let mut items = Vec::new();
        let mut stream = builder.into_stream();
        while let Some(page) = stream.next().await {
            let page = page?;
            for item in page.blobs.items {
                match item {
                    BlobItem::Blob(blob) => {
                        let url = container_client.blob_client(&blob.name).url()?.to_string();
                        items.push(ListedItem::Blob {
                            kind: blob_kind(&blob.properties.blob_type),
                            name: blob.name,
                            url,
                        });
                    }
                    BlobItem::BlobPrefix(prefix) => {
                        items.push(ListedItem::Prefix { name: prefix.name });
                    }
                }
            }
        }

        items.sort_by(|a, b| a.name().cmp(b.name()));
        items.dedup_by(|a, b| a.name() == b.name());
        debug!("Listed {} items in container {}", items.len(), container);
        Ok(items)
    }

    async fn delete_container_if_present(&self, container: &str) -> Result<bool> {
        match self.container_client(container).delete().await {
            Ok(_) => {
                info!("Deleted container {}", container);
                Ok(true)
            }
            Err(e) => match QuickstartError::from(e) {
                err if already_deleted(&err) => {
                    debug!("Container {} was already gone ({})", container, err);
                    Ok(false)
                }
                other => Err(other),
            },
        }
    }

    fn blob_url(&self, container: &str, blob: &str) -> Result<String> {
        let url = self.container_client(container).blob_client(blob).url()?;
        Ok(url.to_string())
    }
}
