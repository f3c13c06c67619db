pub mod binder;
pub mod capture;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod libvlc;
pub mod probe;
pub mod profile;
pub mod seek;
pub mod session;
pub mod thumbnail;
