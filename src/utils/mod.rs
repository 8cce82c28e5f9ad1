pub mod db_utils;
pub mod name_filter;
pub mod profile_cache;
