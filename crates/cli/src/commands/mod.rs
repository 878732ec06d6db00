pub mod context;
pub mod resolve;
pub mod transform;
pub mod validate;
pub mod watch;
