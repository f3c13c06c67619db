pub mod assertions;
pub mod fake_library;
pub mod fixtures;
pub mod sleeper;
pub mod stub_engine;
