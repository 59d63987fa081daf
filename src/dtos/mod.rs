pub mod admindtos;
pub mod profiledtos;
pub mod referraldtos;
pub mod taskdtos;
