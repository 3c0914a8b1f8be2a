//! # Cardiorisk
//!
//! Heart disease risk prediction service.
//!
//! This crate provides:
//! - Validation of the 13 clinical features of a patient record
//! - Inference against a pre-trained, optionally signed, linear classifier
//! - An HTTP API reporting a binary risk level with an optional probability
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (PatientRecord, PredictionResult, validation)
//! - `ports`: Trait definitions for the model collaborator
//! - `adapters`: Concrete implementations (JSON model artifacts, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum transport
//! - `config`: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

#[cfg(test)]
mod testing;

pub use domain::{PatientRecord, PredictionResult, RiskLevel};
