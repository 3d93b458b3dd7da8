pub mod analytics;
pub mod notifications;
pub mod plan_limits;
