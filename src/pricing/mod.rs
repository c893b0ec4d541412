pub mod forward;
pub mod mtm;
pub mod normal;
pub mod options;
