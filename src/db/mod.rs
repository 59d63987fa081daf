pub mod db;
pub mod memory;
pub mod pointsdb;
pub mod profiledb;
pub mod referraldb;
pub mod store;
pub mod taskdb;
