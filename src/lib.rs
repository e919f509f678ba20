//! Support Intake: step-validated application core for social-support
//! wizards.

pub mod application;
pub mod config;
pub mod error;
pub mod services;
pub mod store;
