use std::env;
use std::sync::Arc;

use anyhow::Result;
use mediscan::config::AppConfig;
use mediscan::db;
use mediscan::engine::TesseractEngine;
use mediscan::observability;
use mediscan::pipeline::Pipeline;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    observability::init_tracing()?;

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: mediscan <document> [<document> ...]");
        eprintln!("Supported: .pdf .jpg .jpeg .png .bmp .tiff (max 50MB)");
        std::process::exit(2);
    }

    // Optional persistence collaborator
    let pool = if config.persistence_enabled() {
        info!("Initializing database connection");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database.connect_timeout_secs,
            ))
            .connect(&config.database.url)
            .await?;
        db::init_database_schema(&pool).await?;
        Some(pool)
    } else {
        info!("DATABASE_URL not set; reports are printed without persistence");
        None
    };

    let engine = Arc::new(TesseractEngine::new(&config.ocr));
    let pipeline = Pipeline::new(config, engine);

    let mut failures = 0usize;
    for path in &paths {
        match pipeline.process_document(path).await {
            Ok(outcome) => {
                let mut output = serde_json::json!({
                    "status": "success",
                    "job_id": outcome.report.job_id,
                    "routing": outcome.routing,
                    "ocr_confidence": outcome.report.ocr_confidence,
                    "pages": outcome.pages,
                    "elapsed_ms": outcome.elapsed_ms,
                    "structured_data": outcome.report.sections,
                });

                if let Some(pool) = &pool {
                    match db::insert_report_auto(pool, &outcome.report).await {
                        Ok(report_id) => {
                            info!(job_id = %outcome.report.job_id, report_id, "Report persisted");
                            output["report_id"] = serde_json::json!(report_id);
                        }
                        Err(e) => {
                            error!(job_id = %outcome.report.job_id, error = %e, "Persistence failed");
                            output["db_error"] = serde_json::json!(e.to_string());
                            failures += 1;
                        }
                    }
                }

                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Err(e) => {
                failures += 1;
                let output = serde_json::json!({
                    "status": "error",
                    "file": path,
                    "message": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
