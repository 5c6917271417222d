use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Rate;
use crate::errors::{CreditError, Result};
use crate::types::ProjectType;

/// base annual rate, in percentage points, before the project risk adjustment
pub const BASE_RATE_PERCENT: Decimal = dec!(15);

/// longest term the simulator accepts
pub const DEFAULT_MAX_TERM_MONTHS: u32 = 360;

/// risk-tier pricing: base rate plus a per-project-type adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base_rate_percent: Decimal,
    pub adjustments: BTreeMap<ProjectType, Decimal>,
}

impl Default for RateTable {
    fn default() -> Self {
        let adjustments = BTreeMap::from([
            (ProjectType::Cattle, dec!(-2)),
            (ProjectType::Corn, dec!(-1)),
            (ProjectType::Cassava, dec!(0)),
            (ProjectType::Horticulture, dec!(1)),
            (ProjectType::Poultry, dec!(2)),
            (ProjectType::Other, dec!(3)),
        ]);

        Self {
            base_rate_percent: BASE_RATE_PERCENT,
            adjustments,
        }
    }
}

impl RateTable {
    /// adjustment in percentage points; types missing from the table get none
    pub fn adjustment(&self, project_type: ProjectType) -> Decimal {
        self.adjustments
            .get(&project_type)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// annual nominal rate in percentage points, e.g. 14 for corn
    pub fn annual_rate_percent(&self, project_type: ProjectType) -> Decimal {
        self.base_rate_percent + self.adjustment(project_type)
    }

    /// annual nominal rate for a project type
    pub fn annual_rate(&self, project_type: ProjectType) -> Rate {
        Rate::from_percentage(self.annual_rate_percent(project_type))
    }

    /// same lookup keyed by the raw string a form or endpoint receives
    pub fn annual_rate_for(&self, project_type: Option<&str>) -> Rate {
        let project_type = project_type
            .map(ProjectType::parse)
            .unwrap_or(ProjectType::Unknown);
        self.annual_rate(project_type)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_rate_percent < Decimal::ZERO {
            return Err(CreditError::InvalidConfiguration {
                message: format!("base rate must not be negative: {}", self.base_rate_percent),
            });
        }

        for (project_type, adjustment) in &self.adjustments {
            if self.base_rate_percent + adjustment < Decimal::ZERO {
                return Err(CreditError::InvalidConfiguration {
                    message: format!(
                        "adjustment {} for {} yields a negative rate",
                        adjustment, project_type
                    ),
                });
            }
        }

        Ok(())
    }
}

/// deployment configuration for the credit core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub rate_table: RateTable,
    #[serde(default = "default_max_term_months")]
    pub max_term_months: u32,
    /// months between account opening and the first installment
    #[serde(default = "default_first_payment_offset")]
    pub first_payment_offset_months: u32,
}

fn default_max_term_months() -> u32 {
    DEFAULT_MAX_TERM_MONTHS
}

fn default_first_payment_offset() -> u32 {
    1
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            rate_table: RateTable::default(),
            max_term_months: DEFAULT_MAX_TERM_MONTHS,
            first_payment_offset_months: default_first_payment_offset(),
        }
    }
}

impl PlatformConfig {
    /// load from a JSON document; omitted fields take the built-in defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlatformConfig =
            serde_json::from_str(json).map_err(|e| CreditError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CreditError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.rate_table.validate()?;

        if self.max_term_months == 0 {
            return Err(CreditError::InvalidConfiguration {
                message: "max_term_months must be at least 1".to_string(),
            });
        }

        if self.first_payment_offset_months == 0 {
            return Err(CreditError::InvalidConfiguration {
                message: "first_payment_offset_months must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
