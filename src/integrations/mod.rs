pub mod ip_service;
pub mod metrics;
pub mod query;
pub mod webhook;
