pub mod config;
pub mod error;
pub mod frame;
pub mod media;
pub mod request;
pub mod timing;
