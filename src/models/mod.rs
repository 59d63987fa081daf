pub mod pointsmodel;
pub mod profilemodel;
pub mod referralmodel;
pub mod taskmodel;
