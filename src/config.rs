//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that consolidates
//! all pipeline settings into a single, structured configuration object.
//! It supports loading from environment variables, validation, and provides
//! a clean interface for accessing configuration throughout the application.

use crate::errors::{AppError, AppResult};
use crate::ocr_config::OcrConfig;
use std::env;

/// Database configuration settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; empty means persistence is disabled
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    pub fn validate(&self) -> AppResult<()> {
        // Persistence is optional; an empty URL disables it
        if self.url.trim().is_empty() {
            return Ok(());
        }

        if !self.url.starts_with("postgresql://") && !self.url.starts_with("postgres://") {
            return Err(AppError::Config(
                "Database URL must start with 'postgresql://' or 'postgres://'".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS cannot be 0".to_string(),
            ));
        }
        if self.max_connections > 100 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS cannot be greater than 100".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 300 {
            return Err(AppError::Config(
                "DATABASE_CONNECT_TIMEOUT_SECS must be between 1 and 300".to_string(),
            ));
        }

        Ok(())
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// OCR acquisition settings
    pub ocr: OcrConfig,
    /// Persistence collaborator settings
    pub database: DatabaseConfig,
    /// Whether the pipeline owns input files and deletes them after processing
    pub delete_after_processing: bool,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(languages) = env::var("OCR_LANGUAGES") {
            config.ocr.languages = languages;
        }
        if let Ok(value) = env::var("OCR_PAGE_CONCURRENCY") {
            config.ocr.page_concurrency = value.parse().map_err(|_| {
                AppError::Config("OCR_PAGE_CONCURRENCY must be a valid number".to_string())
            })?;
        }
        if let Ok(value) = env::var("OCR_MAX_FILE_SIZE_MB") {
            let mb: u64 = value.parse().map_err(|_| {
                AppError::Config("OCR_MAX_FILE_SIZE_MB must be a valid number".to_string())
            })?;
            config.ocr.max_file_size = mb * 1024 * 1024;
        }
        if let Ok(value) = env::var("PDF_RENDER_DPI") {
            config.ocr.pdf_render_dpi = value.parse().map_err(|_| {
                AppError::Config("PDF_RENDER_DPI must be a valid number".to_string())
            })?;
        }
        if let Ok(value) = env::var("OCR_OPERATION_TIMEOUT_SECS") {
            config.ocr.recovery.operation_timeout_secs = value.parse().map_err(|_| {
                AppError::Config("OCR_OPERATION_TIMEOUT_SECS must be a valid number".to_string())
            })?;
        }

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(value) = env::var("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = value.parse().map_err(|_| {
                AppError::Config("DATABASE_MAX_CONNECTIONS must be a valid number".to_string())
            })?;
        }
        if let Ok(value) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            config.database.connect_timeout_secs = value.parse().map_err(|_| {
                AppError::Config(
                    "DATABASE_CONNECT_TIMEOUT_SECS must be a valid number".to_string(),
                )
            })?;
        }

        config.delete_after_processing = env::var("DELETE_AFTER_PROCESSING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> AppResult<()> {
        self.ocr.validate()?;
        self.database.validate()?;
        Ok(())
    }

    /// Whether a persistence collaborator is configured
    pub fn persistence_enabled(&self) -> bool {
        !self.database.url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_database_url_disables_persistence() {
        let config = AppConfig::default();
        assert!(!config.persistence_enabled());
        assert!(config.database.validate().is_ok());
    }

    #[test]
    fn test_bad_database_url_rejected() {
        let config = DatabaseConfig {
            url: "mysql://nope".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
