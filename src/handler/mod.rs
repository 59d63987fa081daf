pub mod admin;
pub mod points;
pub mod profile;
pub mod referral;
pub mod tasks;
