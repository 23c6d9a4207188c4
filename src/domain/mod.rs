//! Domain models for the minter.
//!
//! Settings, usage records and API contracts.

pub mod dto;
pub mod setting;
pub mod usage;

pub use dto::{
    ApiResponse, CapacityReport, HealthResponse, MintQuery, MintResponse, ReadyComponents,
    ReadyResponse, ResumeRequest, ResumeResponse,
};
pub use setting::{ResolvedSetting, Setting, SettingOverrides};
pub use usage::UsageState;
