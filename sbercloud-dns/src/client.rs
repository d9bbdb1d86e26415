//! SberCloud DNS client
//!
//! High-level operations for the ACME DNS-01 flow: resolve the tenant
//! project, resolve the zone, create the challenge TXT record, find it again
//! and delete it.

use std::time::Duration;

use reqwest::Client;

use crate::error::{ApiError, Result};
use crate::sign::Signer;
use crate::types::{
    CreateRecordSetRequest, CreateRecordSetResponse, ListProjectsResponse, ListRecordSetsResponse,
    ListZonesResponse,
};
use crate::util::{ensure_trailing_dot, strip_trailing_dot};

/// Default connect timeout (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default request timeout (seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Maximum page size accepted by the DNS list APIs.
const PAGE_SIZE: u32 = 500;
/// Default TTL for challenge TXT records (seconds).
const DEFAULT_TXT_TTL: u32 = 300;

/// Which of the two service endpoints a request goes to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Service {
    /// Identity service (project lookup).
    Iam,
    /// DNS service (zones and recordsets).
    Dns,
}

/// Base URLs for the identity and DNS services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Identity service base URL.
    pub iam: String,
    /// DNS service base URL.
    pub dns: String,
}

impl Endpoints {
    /// Endpoints for a SberCloud region, e.g. `ru-moscow-1`.
    pub fn for_region(region: &str) -> Self {
        Self {
            iam: format!("https://iam.{region}.hc.sbercloud.ru"),
            dns: format!("https://dns.{region}.hc.sbercloud.ru"),
        }
    }
}

/// SberCloud DNS API client.
///
/// Authenticates via AK/SK request signing. Holds no per-request state; the
/// optional project scope is the only mutable piece and is set once after
/// [`find_project_id`](Self::find_project_id).
///
/// # Construction
///
/// ```rust,no_run
/// use sbercloud_dns::SberCloudDns;
///
/// let dns = SberCloudDns::for_region(
///     "your-access-key".to_string(),
///     "your-secret-key".to_string(),
///     "ru-moscow-1",
/// )?;
/// # Ok::<(), sbercloud_dns::ApiError>(())
/// ```
pub struct SberCloudDns {
    pub(crate) client: Client,
    pub(crate) signer: Signer,
    pub(crate) max_retries: u32,
    pub(crate) project_id: Option<String>,
    iam_base: String,
    dns_base: String,
    iam_host: String,
    dns_host: String,
    txt_ttl: u32,
}

/// Builder for [`SberCloudDns`] with configurable endpoints and retries.
pub struct SberCloudDnsBuilder {
    access_key_id: String,
    secret_access_key: String,
    endpoints: Option<Endpoints>,
    max_retries: u32,
    txt_ttl: u32,
}

impl SberCloudDnsBuilder {
    fn new(access_key_id: String, secret_access_key: String) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            endpoints: None,
            max_retries: 2,
            txt_ttl: DEFAULT_TXT_TTL,
        }
    }

    /// Point the client at a SberCloud region.
    #[must_use]
    pub fn region(mut self, region: &str) -> Self {
        self.endpoints = Some(Endpoints::for_region(region));
        self
    }

    /// Override the service endpoints (used by tests against a local mock).
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Set the maximum number of automatic retries for transient errors
    /// (default: 2).
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the TTL for created challenge records (default: 300).
    #[must_use]
    pub fn txt_ttl(mut self, ttl: u32) -> Self {
        self.txt_ttl = ttl;
        self
    }

    /// Build the [`SberCloudDns`] instance.
    ///
    /// Fails when no endpoints were configured or an endpoint URL is
    /// malformed.
    pub fn build(self) -> Result<SberCloudDns> {
        let endpoints = self.endpoints.ok_or_else(|| ApiError::Parse {
            detail: "no region or endpoints configured".to_string(),
        })?;
        let iam_base = endpoints.iam.trim_end_matches('/').to_string();
        let dns_base = endpoints.dns.trim_end_matches('/').to_string();
        let iam_host = host_of(&iam_base)?;
        let dns_host = host_of(&dns_base)?;

        Ok(SberCloudDns {
            client: create_http_client(),
            signer: Signer::new(self.access_key_id, self.secret_access_key),
            max_retries: self.max_retries,
            project_id: None,
            iam_base,
            dns_base,
            iam_host,
            dns_host,
            txt_ttl: self.txt_ttl,
        })
    }
}

impl SberCloudDns {
    /// Returns a builder for customizing the client configuration.
    pub fn builder(access_key_id: String, secret_access_key: String) -> SberCloudDnsBuilder {
        SberCloudDnsBuilder::new(access_key_id, secret_access_key)
    }

    /// Creates a client for a SberCloud region with default settings.
    pub fn for_region(
        access_key_id: String,
        secret_access_key: String,
        region: &str,
    ) -> Result<Self> {
        Self::builder(access_key_id, secret_access_key)
            .region(region)
            .build()
    }

    /// Scope all subsequent DNS calls to a project (sent as `X-Project-Id`).
    pub fn set_project_id(&mut self, project_id: String) {
        self.project_id = Some(project_id);
    }

    pub(crate) fn base(&self, service: Service) -> &str {
        match service {
            Service::Iam => &self.iam_base,
            Service::Dns => &self.dns_base,
        }
    }

    pub(crate) fn host(&self, service: Service) -> &str {
        match service {
            Service::Iam => &self.iam_host,
            Service::Dns => &self.dns_host,
        }
    }

    /// Finds the id of the first enabled project with an exact name match.
    pub async fn find_project_id(&self, project_name: &str) -> Result<String> {
        let response: ListProjectsResponse = self.get(Service::Iam, "/v3/projects", "").await?;

        response
            .projects
            .unwrap_or_default()
            .into_iter()
            .find(|p| p.enabled && p.name == project_name)
            .map(|p| {
                log::debug!("Resolved project '{project_name}' to id {}", p.id);
                p.id
            })
            .ok_or_else(|| ApiError::ProjectNotFound {
                name: project_name.to_string(),
            })
    }

    /// Finds the id of the first ACTIVE zone whose name matches exactly.
    ///
    /// `zone_name` may be given with or without the trailing dot. Pages
    /// through the zone list until the match is found or the list is
    /// exhausted.
    pub async fn find_zone_id(&self, zone_name: &str) -> Result<String> {
        let want = ensure_trailing_dot(zone_name);
        let mut offset: u32 = 0;

        loop {
            let query = format!("limit={PAGE_SIZE}&offset={offset}");
            let response: ListZonesResponse = self.get(Service::Dns, "/v2/zones", &query).await?;
            let zones = response.zones.unwrap_or_default();

            if let Some(zone) = zones
                .iter()
                .find(|z| z.status.as_deref() == Some("ACTIVE") && z.name == want)
            {
                log::debug!("Resolved zone '{want}' to id {}", zone.id);
                return Ok(zone.id.clone());
            }

            let count = u32::try_from(zones.len()).unwrap_or(u32::MAX);
            offset = offset.saturating_add(count);
            let total = response.metadata.and_then(|m| m.total_count);
            if count < PAGE_SIZE || total.is_some_and(|t| offset >= t) {
                break;
            }
        }

        Err(ApiError::ZoneNotFound {
            zone: strip_trailing_dot(&want).to_string(),
        })
    }

    /// Finds the id of the ACTIVE TXT recordset holding exactly the given
    /// challenge value under `fqdn`.
    ///
    /// A record only matches when its values list is exactly
    /// `["\"{challenge}\""]`; extra or missing values do not match. Pages
    /// through the recordset list until exhausted.
    pub async fn find_txt_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        challenge: &str,
    ) -> Result<String> {
        let want_name = ensure_trailing_dot(fqdn);
        let want_values = vec![txt_value(challenge)];
        let path = format!("/v2/zones/{zone_id}/recordsets");
        let mut offset: u32 = 0;

        loop {
            let query = format!("limit={PAGE_SIZE}&offset={offset}");
            let response: ListRecordSetsResponse = self.get(Service::Dns, &path, &query).await?;
            let recordsets = response.recordsets.unwrap_or_default();

            if let Some(record) = recordsets.iter().find(|r| {
                r.status.as_deref() == Some("ACTIVE")
                    && r.name == want_name
                    && r.record_type == "TXT"
                    && r.records.as_deref() == Some(want_values.as_slice())
            }) {
                log::debug!("Found challenge record {} for '{want_name}'", record.id);
                return Ok(record.id.clone());
            }

            let count = u32::try_from(recordsets.len()).unwrap_or(u32::MAX);
            offset = offset.saturating_add(count);
            let total = response.metadata.and_then(|m| m.total_count);
            if count < PAGE_SIZE || total.is_some_and(|t| offset >= t) {
                break;
            }
        }

        Err(ApiError::RecordNotFound {
            name: want_name,
            value: challenge.to_string(),
        })
    }

    /// Creates the challenge TXT recordset and returns the new record id.
    pub async fn present(&self, zone_id: &str, fqdn: &str, challenge: &str) -> Result<String> {
        let request = CreateRecordSetRequest {
            name: ensure_trailing_dot(fqdn),
            record_type: "TXT".to_string(),
            records: vec![txt_value(challenge)],
            ttl: self.txt_ttl,
        };

        let path = format!("/v2/zones/{zone_id}/recordsets");
        let response: CreateRecordSetResponse = self.post(Service::Dns, &path, &request).await?;

        log::info!(
            "Created challenge record {} ({}) in zone {zone_id}",
            response.id,
            response.status.as_deref().unwrap_or("status unknown"),
        );
        Ok(response.id)
    }

    /// Looks up the challenge TXT record and deletes it.
    ///
    /// No DELETE is issued when the lookup fails; the lookup error
    /// propagates.
    pub async fn cleanup(&self, zone_id: &str, fqdn: &str, challenge: &str) -> Result<()> {
        let record_id = self.find_txt_record(zone_id, fqdn, challenge).await?;
        let path = format!("/v2/zones/{zone_id}/recordsets/{record_id}");
        self.delete(Service::Dns, &path).await?;

        log::info!("Deleted challenge record {record_id} from zone {zone_id}");
        Ok(())
    }
}

/// The DNS API wraps TXT string values in literal quote characters.
fn txt_value(challenge: &str) -> String {
    format!("\"{challenge}\"")
}

/// Creates the shared HTTP client with timeouts.
fn create_http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}

/// Host (with port, if any) of an endpoint URL, for the signed `Host` header.
fn host_of(endpoint: &str) -> Result<String> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| ApiError::Parse {
        detail: format!("invalid endpoint '{endpoint}': {e}"),
    })?;
    let host = url.host_str().ok_or_else(|| ApiError::Parse {
        detail: format!("endpoint '{endpoint}' has no host"),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
