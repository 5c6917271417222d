use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// unique identifier for a credit application
pub type ApplicationId = Uuid;

/// unique identifier for a platform user (borrower, institution or admin)
pub type UserId = Uuid;

/// unique identifier for a repayment account
pub type AccountId = Uuid;

/// agricultural project category declared by the borrower, drives the risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Cattle,
    Corn,
    Cassava,
    Horticulture,
    Poultry,
    Other,
    /// anything the rate table does not know, priced at the base rate
    #[serde(other)]
    Unknown,
}

impl ProjectType {
    pub const ALL: [ProjectType; 6] = [
        ProjectType::Cattle,
        ProjectType::Corn,
        ProjectType::Cassava,
        ProjectType::Horticulture,
        ProjectType::Poultry,
        ProjectType::Other,
    ];

    /// lenient parse; unrecognised or empty input maps to `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cattle" => ProjectType::Cattle,
            "corn" => ProjectType::Corn,
            "cassava" => ProjectType::Cassava,
            "horticulture" => ProjectType::Horticulture,
            "poultry" => ProjectType::Poultry,
            "other" => ProjectType::Other,
            _ => ProjectType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Cattle => "cattle",
            ProjectType::Corn => "corn",
            ProjectType::Cassava => "cassava",
            ProjectType::Horticulture => "horticulture",
            ProjectType::Poultry => "poultry",
            ProjectType::Other => "other",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ProjectType::parse(s))
    }
}

/// credit application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// submitted by the borrower, visible to every institution
    Pending,
    /// claimed by one reviewing institution
    UnderReview,
    /// credit granted, repayment account follows
    Approved,
    /// declined with a reason
    Rejected,
}

impl ApplicationStatus {
    /// approved and rejected applications cannot move again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// kind of platform user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Farmer,
    Company,
    Cooperative,
    FinancialInstitution,
    Admin,
}

impl UserType {
    /// borrowers submit applications, they never review them
    pub fn is_borrower(&self) -> bool {
        matches!(self, UserType::Farmer | UserType::Company | UserType::Cooperative)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserType::Farmer => "farmer",
            UserType::Company => "company",
            UserType::Cooperative => "cooperative",
            UserType::FinancialInstitution => "financial_institution",
            UserType::Admin => "admin",
        };
        f.write_str(s)
    }
}
