// src/config/mod.rs
pub mod credentials;
pub mod settings;

pub use credentials::ApiCredential;
pub use settings::Settings;
