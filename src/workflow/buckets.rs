use serde::{Deserialize, Serialize};

use crate::application::CreditApplication;
use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::types::{ApplicationStatus, UserId};

/// dashboard column an application shows up in for one institution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    New,
    UnderReview,
    Historical,
}

impl Bucket {
    /// which column, if any, `application` belongs to for `institution`
    pub fn classify(application: &CreditApplication, institution: UserId) -> Option<Bucket> {
        match application.status {
            ApplicationStatus::Pending => Some(Bucket::New),
            ApplicationStatus::UnderReview if application.is_reviewed_by(institution) => {
                Some(Bucket::UnderReview)
            }
            status if status.is_terminal() && application.is_reviewed_by(institution) => {
                Some(Bucket::Historical)
            }
            _ => None,
        }
    }
}

/// the three application lists of an institution dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBuckets {
    /// pending, open to every institution; newest submission first
    pub new: Vec<CreditApplication>,
    /// claimed by this institution; most recently touched first
    pub under_review: Vec<CreditApplication>,
    /// decided by this institution; most recently touched first
    pub historical: Vec<CreditApplication>,
}

impl DashboardBuckets {
    pub fn for_institution<'a>(
        applications: impl IntoIterator<Item = &'a CreditApplication>,
        institution: UserId,
    ) -> Self {
        let mut buckets = DashboardBuckets::default();

        for application in applications {
            match Bucket::classify(application, institution) {
                Some(Bucket::New) => buckets.new.push(application.clone()),
                Some(Bucket::UnderReview) => buckets.under_review.push(application.clone()),
                Some(Bucket::Historical) => buckets.historical.push(application.clone()),
                None => {}
            }
        }

        buckets.new.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        buckets.under_review.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        buckets.historical.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        buckets
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            new: self.new.len(),
            under_review: self.under_review.len(),
            historical: self.historical.len(),
        }
    }

    /// total principal this institution has approved
    pub fn approved_volume(&self) -> Result<Money> {
        self.historical
            .iter()
            .filter(|a| a.status == ApplicationStatus::Approved)
            .try_fold(Money::ZERO, |acc, a| {
                acc.checked_add(a.amount)
                    .ok_or_else(|| CreditError::invalid_input("approved volume is not representable"))
            })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CreditError::invalid_input(e.to_string()))
    }
}

/// headline numbers for the dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub new: usize,
    pub under_review: usize,
    pub historical: usize,
}
