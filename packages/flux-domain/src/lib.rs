pub mod context;
pub mod ranking;
