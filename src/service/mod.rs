pub mod background_jobs;
pub mod connection_service;
pub mod error;
pub mod points_engine;
pub mod reconciliation;
pub mod referral_service;
pub mod task_service;
pub mod verify;
