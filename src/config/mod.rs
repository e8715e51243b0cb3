//! Configuration module

mod dashboard;
mod site;

pub use dashboard::{DashboardConfig, Language, Profile, Settings, Theme, DASHBOARD_FILE};
pub use site::{HighlightConfig, SiteConfig};
