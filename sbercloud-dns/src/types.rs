//! SberCloud IAM and DNS API type definitions

use serde::{Deserialize, Serialize};

// ============ IAM API response structure ============

/// Response payload for `ListProjects` (`GET /v3/projects`).
#[derive(Debug, Deserialize)]
pub struct ListProjectsResponse {
    pub projects: Option<Vec<Project>>,
}

/// Project (tenant scope) item returned by the IAM API.
#[derive(Debug, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

// ============ DNS API response structure ============

/// Response payload for `ListPublicZones` (`GET /v2/zones`).
#[derive(Debug, Deserialize)]
pub struct ListZonesResponse {
    pub zones: Option<Vec<Zone>>,
    pub metadata: Option<ListMetadata>,
}

/// Pagination metadata for list APIs.
#[derive(Debug, Deserialize)]
pub struct ListMetadata {
    pub total_count: Option<u32>,
}

/// Public zone item returned by the DNS API.
#[derive(Debug, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
}

/// Response payload for `ListRecordSetsByZone`
/// (`GET /v2/zones/{zone_id}/recordsets`).
#[derive(Debug, Deserialize)]
pub struct ListRecordSetsResponse {
    pub recordsets: Option<Vec<RecordSet>>,
    pub metadata: Option<ListMetadata>,
}

/// Record set item returned by the DNS API.
#[derive(Debug, Deserialize)]
pub struct RecordSet {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub records: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Request payload for `CreateRecordSet`
/// (`POST /v2/zones/{zone_id}/recordsets`).
#[derive(Debug, Serialize)]
pub struct CreateRecordSetRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub records: Vec<String>,
    pub ttl: u32,
}

/// Response payload for `CreateRecordSet`.
#[derive(Debug, Deserialize)]
pub struct CreateRecordSetResponse {
    pub id: String,
    pub status: Option<String>,
}

/// Error payload returned by the IAM and DNS APIs.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: Option<String>,
    pub message: Option<String>,
}
