pub mod account;
pub mod application;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod permissions;
pub mod simulation;
pub mod store;
pub mod types;
pub mod workflow;

// re-export key types
pub use account::{Payment, RepaymentAccount};
pub use application::{ApplicationBuilder, CreditApplication};
pub use config::{PlatformConfig, RateTable, BASE_RATE_PERCENT};
pub use decimal::{Money, Rate};
pub use errors::{CreditError, Result};
pub use events::{Event, EventStore};
pub use permissions::{Actor, Permission};
pub use simulation::{
    amortize, simulate, AmortizationSchedule, LoanTerms, ScheduledPayment, SimulationResult,
    Simulator,
};
pub use store::{ApplicationStore, InMemoryApplicationStore, ReviewDesk};
pub use types::{AccountId, ApplicationId, ApplicationStatus, ProjectType, UserId, UserType};
pub use workflow::{transition, transition_recorded, Bucket, DashboardBuckets};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
