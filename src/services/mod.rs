pub mod checkins;
pub mod dashboard;
pub mod metrics;
pub mod relationships;
pub mod roster;
pub mod status;
