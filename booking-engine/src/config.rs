//! Engine configuration, passed explicitly into the service

use crate::capacity::DEFAULT_THRESHOLD;
use crate::confirmation::{CODE_LENGTH, MAX_ATTEMPTS};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Extra seats a party may take on a larger table
    pub capacity_threshold: i32,
    pub code_length: usize,
    pub code_attempts: u32,
    /// ISO 4217 codes accepted for deposits
    pub allowed_currencies: Vec<String>,
    /// Retries for deposit status reads
    pub verify_retries: u32,
    pub verify_backoff: Duration,
    /// Prefix of management links, e.g. "https://book.example.com"
    pub public_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity_threshold: DEFAULT_THRESHOLD,
            code_length: CODE_LENGTH,
            code_attempts: MAX_ATTEMPTS,
            allowed_currencies: vec!["SGD".into(), "USD".into(), "MYR".into()],
            verify_retries: 2,
            verify_backoff: Duration::from_millis(200),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}
