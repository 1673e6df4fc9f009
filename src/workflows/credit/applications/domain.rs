use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for credit applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Identifier wrapper for companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub Uuid);

/// Identifier wrapper for authenticated subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

/// The authenticated actor performing a request. Token verification happens
/// upstream; this core only sees the resolved subject id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub sub: UserId,
}

impl Principal {
    pub fn new(sub: UserId) -> Self {
        Self { sub }
    }
}

/// Roles recognized by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Operator,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Operator => "operator",
            Role::Admin => "admin",
        }
    }

    /// Operators and admins share the review-side permissions.
    pub const fn is_staff(self) -> bool {
        matches!(self, Role::Operator | Role::Admin)
    }
}

/// Lifecycle states of a credit application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    InReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Declared purpose of the requested credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPurpose {
    WorkingCapital,
    Equipment,
    Expansion,
    Inventory,
    Refinancing,
    Other,
}

impl CreditPurpose {
    pub const fn label(self) -> &'static str {
        match self {
            CreditPurpose::WorkingCapital => "working_capital",
            CreditPurpose::Equipment => "equipment",
            CreditPurpose::Expansion => "expansion",
            CreditPurpose::Inventory => "inventory",
            CreditPurpose::Refinancing => "refinancing",
            CreditPurpose::Other => "other",
        }
    }
}

/// The central entity: one company's request for credit, carried through the
/// review lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditApplication {
    pub id: ApplicationId,
    pub company_id: CompanyId,
    pub requested_amount: Decimal,
    pub purpose: CreditPurpose,
    pub purpose_other: Option<String>,
    pub term_months: u16,
    pub status: ApplicationStatus,
    pub risk_score: Option<Decimal>,
    pub approved_amount: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company owning applications; associated to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub user_id: UserId,
    pub legal_name: String,
}

/// Caller-supplied payload for a new application. Review-side fields are not
/// accepted at creation; every application starts in draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub requested_amount: Decimal,
    pub purpose: CreditPurpose,
    #[serde(default)]
    pub purpose_other: Option<String>,
    pub term_months: u16,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn compute(total: usize, page: u32, per_page: u32) -> Self {
        let per = per_page.max(1) as usize;
        let pages = (total.div_ceil(per)).max(1) as u32;
        Self {
            total,
            page,
            per_page,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}

/// A page of items plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta::compute(0, page, per_page),
        }
    }
}
