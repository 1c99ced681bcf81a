pub mod capture_worker;
pub mod pipeline_logger;
pub mod try_on_session;
