//! Client workflows: everything between a user action and the backend.

pub mod auth;
pub mod detail;
pub mod generation;
pub mod inactivity;
pub mod onboarding;
pub mod platforms;
pub mod profile;
pub mod scheduler;
