use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_SUSPENDED: &str = "suspended";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

pub const BOOKING_PENDING: &str = "pending";
pub const BOOKING_ACCEPTED: &str = "accepted";
pub const BOOKING_IN_PROGRESS: &str = "in_progress";
pub const BOOKING_COMPLETED: &str = "completed";
pub const BOOKING_CANCELLED: &str = "cancelled";

pub const ACTIVE_BOOKING_STATUSES: [&str; 3] =
    [BOOKING_PENDING, BOOKING_ACCEPTED, BOOKING_IN_PROGRESS];

pub const BOOKING_STATUSES: [&str; 5] = [
    BOOKING_PENDING,
    BOOKING_ACCEPTED,
    BOOKING_IN_PROGRESS,
    BOOKING_COMPLETED,
    BOOKING_CANCELLED,
];

// Timestamps are stored as RFC 3339 text in UTC with second precision, so
// lexical order in SQL matches chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Provider, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 4] = [
        VerificationStatus::Pending,
        VerificationStatus::UnderReview,
        VerificationStatus::Approved,
        VerificationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::UnderReview => "under_review",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn is_reviewed(&self) -> bool {
        matches!(self, VerificationStatus::Approved | VerificationStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_APPROVED => Some(ReviewDecision::Approved),
            STATUS_REJECTED => Some(ReviewDecision::Rejected),
            _ => None,
        }
    }

    pub fn as_status(&self) -> VerificationStatus {
        match self {
            ReviewDecision::Approved => VerificationStatus::Approved,
            ReviewDecision::Rejected => VerificationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub status: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactSummary {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationRow {
    pub id: String,
    pub user_id: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub years_experience: Option<i64>,
    pub government_id_image_url: Option<String>,
    pub professional_license_image_url: Option<String>,
    pub field_of_work: Option<String>,
    pub categories: Json<Vec<String>>,
    pub hourly_rate: Option<f64>,
    pub availability: Option<Json<serde_json::Value>>,
    pub verification_status: VerificationStatus,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
    pub profile_phone: Option<String>,
    pub profile_rating: Option<f64>,
    pub profile_created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationRecord {
    pub id: String,
    pub user_id: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub years_experience: Option<i64>,
    pub government_id_image_url: Option<String>,
    pub professional_license_image_url: Option<String>,
    pub field_of_work: Option<String>,
    pub categories: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub availability: Option<serde_json::Value>,
    pub verification_status: VerificationStatus,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub profile: Option<ProfileSummary>,
}

impl VerificationRecord {
    pub fn documents(&self) -> Vec<String> {
        [
            self.government_id_image_url.as_deref(),
            self.professional_license_image_url.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .collect()
    }

    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|profile| profile.name.as_deref())
            .unwrap_or("Unknown")
    }
}

impl From<VerificationRow> for VerificationRecord {
    fn from(row: VerificationRow) -> Self {
        let profile = row.profile_id.map(|id| ProfileSummary {
            id,
            name: row.profile_name,
            phone: row.profile_phone,
            rating: row.profile_rating,
            created_at: row.profile_created_at.unwrap_or_default(),
        });
        Self {
            id: row.id,
            user_id: row.user_id,
            phone: row.phone,
            address: row.address,
            city: row.city,
            years_experience: row.years_experience,
            government_id_image_url: row.government_id_image_url,
            professional_license_image_url: row.professional_license_image_url,
            field_of_work: row.field_of_work,
            categories: row.categories.0,
            hourly_rate: row.hourly_rate,
            availability: row.availability.map(|value| value.0),
            verification_status: row.verification_status,
            admin_notes: row.admin_notes,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            profile,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: String,
    pub customer_id: Option<String>,
    pub provider_id: Option<String>,
    pub service_category: Option<String>,
    pub service_type: Option<String>,
    pub status: String,
    pub scheduled_time: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
    pub created_at: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub provider_name: Option<String>,
    pub provider_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: String,
    pub customer_id: Option<String>,
    pub provider_id: Option<String>,
    pub service_category: Option<String>,
    pub service_type: Option<String>,
    pub status: String,
    pub scheduled_time: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
    pub created_at: String,
    pub customer: Option<ContactSummary>,
    pub provider: Option<ContactSummary>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        let customer = row.customer_id.as_ref().map(|_| ContactSummary {
            name: row.customer_name,
            phone: row.customer_phone,
        });
        let provider = row.provider_id.as_ref().map(|_| ContactSummary {
            name: row.provider_name,
            phone: row.provider_phone,
        });
        Self {
            id: row.id,
            customer_id: row.customer_id,
            provider_id: row.provider_id,
            service_category: row.service_category,
            service_type: row.service_type,
            status: row.status,
            scheduled_time: row.scheduled_time,
            location: row.location,
            notes: row.notes,
            price: row.price,
            created_at: row.created_at,
            customer,
            provider,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_providers: i64,
    pub total_bookings: i64,
    pub total_revenue: f64,
    pub pending_verifications: i64,
    pub active_bookings: i64,
    pub user_growth: f64,
    pub provider_growth: f64,
    pub booking_growth: f64,
    pub revenue_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBookings {
    pub day: String,
    pub date: String,
    pub bookings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Booking,
    Verification,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub title: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub status: String,
}

impl ActivityItem {
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            ActivityKind::Booking => "booking",
            ActivityKind::Verification => "verification",
            ActivityKind::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub revenue: Vec<RevenuePoint>,
    pub bookings: Vec<DailyBookings>,
    pub categories: Vec<CategoryShare>,
    pub activity: Vec<ActivityItem>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminAccountRow {
    pub id: String,
    pub profile_id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}
