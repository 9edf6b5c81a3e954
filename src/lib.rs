pub mod api;
pub mod clock;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod error;
pub mod notifications;
pub mod payments;
pub mod pricing;
pub mod repository;
pub mod service;
