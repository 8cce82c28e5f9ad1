pub mod contractor;
pub mod earnings;
pub mod timeclock;
