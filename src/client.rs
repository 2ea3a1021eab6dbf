//! EWS mailbox client
//!
//! One `ExchangeClient` per run: it resolves the endpoint once at
//! startup and then serves the four mailbox operations over a single
//! HTTP client. Every call is a blocking round trip from the caller's
//! point of view; there is no retry logic anywhere.

use crate::autodiscover;
use crate::config::{ConnectConfig, Credentials};
use crate::error::{Error, Result};
use crate::filter::ItemFilter;
use crate::folder::{FolderId, FolderRef, normalize_path};
use crate::item::{Item, PropertyDefinition, Sensitivity};
use crate::{response, soap};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated handle to one remote mailbox.
pub struct ExchangeClient {
    http: reqwest::Client,
    endpoint: Url,
    mailbox: String,
    credentials: Credentials,
    impersonate: bool,
}

impl ExchangeClient {
    /// Establish a session for the configured mailbox.
    ///
    /// The certificate policy is installed on the HTTP client before
    /// anything is sent; the endpoint comes from the explicit URL or
    /// from autodiscovery.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the HTTP client cannot be built,
    /// the endpoint URL is invalid, or autodiscovery fails.
    pub async fn connect(config: &ConnectConfig) -> Result<Self> {
        if config.ignore_certificates {
            warn!("Ignoring TLS certificate errors because --ignorecertificate is set");
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.ignore_certificates)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Connect(format!("failed to build HTTP client: {e}")))?;

        let credentials = config.credentials();
        info!("Connecting to mailbox {}", config.mailbox);

        let endpoint = match &config.url {
            Some(raw) => Url::parse(raw)
                .map_err(|e| Error::Connect(format!("invalid endpoint URL \"{raw}\": {e}")))?,
            None => {
                autodiscover::discover(
                    &http,
                    &credentials,
                    &config.mailbox,
                    config.allow_redirect,
                )
                .await?
            }
        };
        debug!("EWS endpoint: {}", endpoint);

        Ok(Self {
            http,
            endpoint,
            mailbox: config.mailbox.clone(),
            credentials,
            impersonate: config.impersonate,
        })
    }

    /// The mailbox address this session is bound to.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    fn impersonated(&self) -> Option<&str> {
        self.impersonate.then_some(self.mailbox.as_str())
    }

    async fn post_soap(&self, body: String) -> Result<String> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body);
        if let Credentials::Basic { user, password } = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("request failed with status {status}")));
        }
        response.text().await.map_err(|e| Error::Http(e.to_string()))
    }

    /// Deep search for every folder under the message root that holds
    /// at least one item.
    ///
    /// Pages of 100 are fetched until the server reports the range is
    /// exhausted; a failed page discards everything gathered so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FolderSearch`] on any transport or response
    /// failure.
    pub async fn list_folders_with_items(&self) -> Result<Vec<FolderRef>> {
        let mut folders = Vec::new();
        let mut offset = 0;

        loop {
            let request = soap::find_folder(&self.mailbox, self.impersonated(), offset);
            let xml = self
                .post_soap(request)
                .await
                .map_err(|e| Error::FolderSearch(format!("FindFolder failed: {e}")))?;
            let page = response::parse_find_folder(&xml)
                .map_err(|e| Error::FolderSearch(format!("FindFolder response: {e}")))?;

            folders.extend(page.entries);
            if !page.more_available {
                break;
            }
            offset += soap::PAGE_SIZE;
        }

        debug!("Found {} folders holding items", folders.len());
        Ok(folders)
    }

    /// Resolve a folder's full path via the path extended property.
    ///
    /// Returns an empty string when the property is absent; the raw
    /// segment delimiter is normalized to a backslash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FolderPath`] on any transport or response
    /// failure. Callers decide whether that is fatal.
    pub async fn folder_path(&self, folder: &FolderId) -> Result<String> {
        let request = soap::get_folder(folder, self.impersonated());
        let xml = self
            .post_soap(request)
            .await
            .map_err(|e| Error::FolderPath(format!("GetFolder failed: {e}")))?;
        let raw = response::parse_get_folder_path(&xml)
            .map_err(|e| Error::FolderPath(format!("GetFolder response: {e}")))?;

        Ok(raw.map(|path| normalize_path(&path)).unwrap_or_default())
    }

    /// Shallow search for items in one folder matching the filter.
    ///
    /// Same paging discipline as the folder search.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ItemSearch`] on any transport or response
    /// failure.
    pub async fn find_matching_items(
        &self,
        folder: &FolderId,
        filter: &ItemFilter,
    ) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let request = soap::find_item(folder, filter, self.impersonated(), offset);
            let xml = self
                .post_soap(request)
                .await
                .map_err(|e| Error::ItemSearch(format!("FindItem failed: {e}")))?;
            let page = response::parse_find_item(&xml)
                .map_err(|e| Error::ItemSearch(format!("FindItem response: {e}")))?;

            items.extend(page.entries);
            if !page.more_available {
                break;
            }
            offset += soap::PAGE_SIZE;
        }

        Ok(items)
    }

    /// Rewrite the sensitivity extended property (tag `0x36`) on an
    /// item and persist it with last-writer-wins conflict resolution.
    ///
    /// Returns `Ok(false)` without touching the server when the item
    /// carries no extended properties. Every property entry matching
    /// the sensitivity definition is overwritten, not just the first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Update`] when a persist call fails; callers
    /// treat this as recoverable.
    pub async fn set_sensitivity(&self, item: &Item, target: Sensitivity) -> Result<bool> {
        if item.extended_properties.is_empty() {
            debug!(
                "Item \"{}\" carries no extended properties, nothing to change",
                item.subject
            );
            return Ok(false);
        }

        let mut changed = false;
        for property in &item.extended_properties {
            if property.definition == PropertyDefinition::SENSITIVITY {
                info!("Trying to alter the message: {}", item.subject);
                let request = soap::update_item(&item.id, target, self.impersonated());
                let xml = self
                    .post_soap(request)
                    .await
                    .map_err(|e| Error::Update(format!("UpdateItem failed: {e}")))?;
                response::parse_update_item(&xml)
                    .map_err(|e| Error::Update(format!("UpdateItem response: {e}")))?;
                changed = true;
            }
        }

        Ok(changed)
    }
}
