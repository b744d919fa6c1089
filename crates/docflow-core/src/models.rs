//! Core data models for docflow.
//!
//! Wire names follow the HTTP contract: document and user rows keep their
//! PascalCase column names (`Document_Id`, `Type`, `Status`, ...), while the
//! synthesized response view uses camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENT STATUS
// =============================================================================

/// Workflow status of a document. Exactly one is current at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    utoipa::ToSchema,
)]
pub enum DocumentStatus {
    /// Submitted and awaiting an admin decision
    Pending,
    /// Approved by the department admin, awaiting release
    Approved,
    /// Sent back to the owner for changes
    Revision,
    /// Released to the requester
    Released,
    /// Forwarded into another department's custody
    Received,
    /// Terminal; no further transitions
    Archived,
}

impl DocumentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [DocumentStatus; 6] = [
        Self::Pending,
        Self::Approved,
        Self::Revision,
        Self::Released,
        Self::Received,
        Self::Archived,
    ];

    /// Canonical (stored) spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Revision => "Revision",
            Self::Released => "Released",
            Self::Received => "Received",
            Self::Archived => "Archived",
        }
    }

    /// Whether no transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "revision" => Ok(Self::Revision),
            "released" => Ok(Self::Released),
            "received" => Ok(Self::Received),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid document status: {}", s)),
        }
    }
}

// =============================================================================
// PRIORITY
// =============================================================================

/// Document priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A submitted document and its workflow provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Document {
    #[serde(rename = "Document_Id")]
    pub id: i64,
    /// Free-text category, e.g. "Leave Request"
    #[serde(rename = "Type")]
    pub doc_type: String,
    /// Owning (submitting) user
    #[serde(rename = "User_Id")]
    pub user_id: i64,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[serde(rename = "Status")]
    pub status: DocumentStatus,
    /// File content, base64 encoded on the wire
    #[serde(
        rename = "Document",
        with = "base64_bytes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = Byte)]
    pub payload: Option<Vec<u8>>,
    pub description: Option<String>,
    /// Department currently holding custody of the document
    pub department: Option<String>,
    /// Department the document was forwarded from
    pub forwarded_from: Option<String>,
    /// Name of the admin who forwarded it
    pub forwarded_by_admin: Option<String>,
    pub is_forwarded_request: bool,
    /// Latest note or response text
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Actor of the last status change
    pub updated_by: Option<String>,
    /// Incremented on every write
    pub version: i32,
}

/// Reply from a receiving department back to the forwarding department.
///
/// Never stored; synthesized from the document's `comments` and custody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub document_id: i64,
    pub responder_department: Option<String>,
    pub responder_name: Option<String>,
    pub message: String,
    pub response_date: DateTime<Utc>,
}

impl DocumentResponse {
    /// Rebuild the latest response of an archived forwarded document.
    pub fn from_archived(doc: &Document) -> Option<Self> {
        if doc.status != DocumentStatus::Archived || !doc.is_forwarded_request {
            return None;
        }
        let message = doc.comments.clone()?;
        Some(Self {
            document_id: doc.id,
            responder_department: doc.department.clone(),
            responder_name: doc.updated_by.clone(),
            message,
            response_date: doc.updated_at,
        })
    }
}

/// Per-status document counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DocumentStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub revision: i64,
    pub released: i64,
    pub received: i64,
}

impl DocumentStats {
    /// Add `count` documents of the given status.
    pub fn record(&mut self, status: DocumentStatus, count: i64) {
        self.total += count;
        match status {
            DocumentStatus::Pending => self.pending += count,
            DocumentStatus::Approved => self.approved += count,
            DocumentStatus::Revision => self.revision += count,
            DocumentStatus::Released => self.released += count,
            DocumentStatus::Received => self.received += count,
            DocumentStatus::Archived => {}
        }
    }
}

/// Documents created in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MonthlyCount {
    /// 1 = January
    pub month: u32,
    pub total: i64,
}

/// Twelve months, zeroed then filled from `(month, count)` pairs.
pub fn fill_months(counts: impl IntoIterator<Item = (u32, i64)>) -> Vec<MonthlyCount> {
    let mut months: Vec<MonthlyCount> = (1..=12).map(|month| MonthlyCount { month, total: 0 }).collect();
    for (month, total) in counts {
        if (1..=12).contains(&month) {
            months[(month - 1) as usize].total += total;
        }
    }
    months
}

// =============================================================================
// USERS
// =============================================================================

/// Role of a user in the organization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Employee,
    DepartmentHead,
    DivisionHead,
    OfficerInCharge,
    Releaser,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SuperAdmin",
            Self::Admin => "Admin",
            Self::Employee => "Employee",
            Self::DepartmentHead => "DepartmentHead",
            Self::DivisionHead => "DivisionHead",
            Self::OfficerInCharge => "OfficerInCharge",
            Self::Releaser => "Releaser",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "superadmin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            "departmenthead" => Ok(Self::DepartmentHead),
            "divisionhead" => Ok(Self::DivisionHead),
            "officerincharge" | "oic" => Ok(Self::OfficerInCharge),
            "releaser" => Ok(Self::Releaser),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Account status; only active users can log in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Invalid user status: {}", s)),
        }
    }
}

/// Pre-assigned employee sub-role. Only affects the landing page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
pub enum SubRole {
    Recorder,
    Releaser,
}

impl SubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recorder => "Recorder",
            Self::Releaser => "Releaser",
        }
    }
}

impl std::str::FromStr for SubRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recorder" => Ok(Self::Recorder),
            "releaser" => Ok(Self::Releaser),
            _ => Err(format!("Invalid sub-role: {}", s)),
        }
    }
}

/// A directory user. The password hash never leaves the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct User {
    #[serde(rename = "User_Id")]
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub department: Option<String>,
    pub division: Option<String>,
    pub status: UserStatus,
    pub sub_role: Option<SubRole>,
}

impl User {
    /// Landing page for this user after login.
    pub fn default_route(&self) -> &'static str {
        match (self.role, self.sub_role) {
            (UserRole::SuperAdmin, _) => "/superadmin",
            (UserRole::Admin, _) => "/admin",
            (UserRole::DepartmentHead | UserRole::DivisionHead | UserRole::OfficerInCharge, _) => {
                "/head"
            }
            (UserRole::Releaser, _) | (_, Some(SubRole::Releaser)) => "/releaser",
            (_, Some(SubRole::Recorder)) => "/recorder",
            _ => "/employee",
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

// =============================================================================
// DEPARTMENTS AND DIVISIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Department {
    #[serde(rename = "Department_Id")]
    pub id: i64,
    #[serde(rename = "Department")]
    pub name: String,
}

/// Sub-unit of exactly one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Division {
    #[serde(rename = "Division_Id")]
    pub id: i64,
    #[serde(rename = "Division")]
    pub name: String,
    #[serde(rename = "Department")]
    pub department: String,
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

/// Serde adapter for optional binary payloads carried as base64 strings.
pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer
                .serialize_some(&base64::engine::general_purpose::STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|s| {
                base64::engine::general_purpose::STANDARD
                    .decode(s.trim().as_bytes())
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
