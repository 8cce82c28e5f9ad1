pub mod contractor;
pub mod role;
pub mod work_session;
