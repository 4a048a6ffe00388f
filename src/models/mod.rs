pub mod auth;
pub mod checkin;
pub mod enrollment;
pub mod identity;
pub mod profile;
pub mod relationship;
pub mod roster;
pub mod session;
