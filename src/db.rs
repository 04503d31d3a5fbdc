//! # Persistence Collaborator
//!
//! Fixed insert contract for structured reports: upsert-by-name for the
//! patient entity, then a category-specific insert selected by the routing
//! decision. This module decides *which* insert to invoke from the routing
//! decision; it performs no extraction logic of its own.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, info};

use crate::classifier::{classify, RoutingDecision};
use crate::errors::{AppError, AppResult};
use crate::extraction::FieldValue;
use crate::parsers::Category;
use crate::report::StructuredReport;

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS patients (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) UNIQUE NOT NULL,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            last_updated TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create patients table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS blood_tests (
            id BIGSERIAL PRIMARY KEY,
            patient_id BIGINT NOT NULL REFERENCES patients(id),
            job_id VARCHAR(64) NOT NULL,
            results JSONB NOT NULL,
            raw_text TEXT NOT NULL,
            ocr_confidence DOUBLE PRECISION,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create blood_tests table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS prescriptions (
            id BIGSERIAL PRIMARY KEY,
            patient_id BIGINT NOT NULL REFERENCES patients(id),
            job_id VARCHAR(64) NOT NULL,
            medications JSONB NOT NULL,
            doctor VARCHAR(255),
            diagnosis TEXT,
            prescription_date VARCHAR(32),
            follow_up VARCHAR(32),
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create prescriptions table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS xray_reports (
            id BIGSERIAL PRIMARY KEY,
            patient_id BIGINT NOT NULL REFERENCES patients(id),
            job_id VARCHAR(64) NOT NULL,
            findings JSONB,
            image_url TEXT,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create xray_reports table")?;

    Ok(())
}

/// Upsert the patient entity by name, returning its id.
///
/// An existing patient gets its `last_updated` stamp refreshed; a new one is
/// created. Reports without an extracted name land under "Unknown".
pub async fn upsert_patient(pool: &PgPool, name: &str) -> Result<i64> {
    let existing = sqlx::query("SELECT id FROM patients WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to query patient by name")?;

    if let Some(row) = existing {
        let id: i64 = row.get("id");
        sqlx::query("UPDATE patients SET last_updated = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to refresh patient record")?;
        debug!(patient_id = id, name = %name, "Updated existing patient");
        return Ok(id);
    }

    let row = sqlx::query("INSERT INTO patients (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to insert patient")?;
    let id: i64 = row.get("id");
    info!(patient_id = id, name = %name, "Created new patient");
    Ok(id)
}

/// Insert a blood test report with its full structured sections
pub async fn insert_blood_test(
    pool: &PgPool,
    patient_id: i64,
    report: &StructuredReport,
) -> Result<i64> {
    let results =
        serde_json::to_value(&report.sections).context("Failed to serialize report sections")?;
    let row = sqlx::query(
        "INSERT INTO blood_tests (patient_id, job_id, results, raw_text, ocr_confidence)
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(patient_id)
    .bind(&report.job_id)
    .bind(results)
    .bind(&report.raw_text)
    .bind(report.ocr_confidence)
    .fetch_one(pool)
    .await
    .context("Failed to insert blood test")?;
    let id: i64 = row.get("id");
    info!(patient_id, report_id = id, "Blood test inserted");
    Ok(id)
}

/// Insert a prescription report
pub async fn insert_prescription(
    pool: &PgPool,
    patient_id: i64,
    report: &StructuredReport,
) -> Result<i64> {
    let prescription = report.section(Category::Prescription);

    let medications = prescription
        .and_then(|s| s.get("medications"))
        .map(|f| serde_json::to_value(&f.value))
        .transpose()
        .context("Failed to serialize medications")?
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

    let text_of = |section: Option<&crate::parsers::ReportSection>, key: &str| {
        section
            .and_then(|s| s.get(key))
            .and_then(|f| match &f.value {
                FieldValue::Text(s) | FieldValue::Date(s) => Some(s.clone()),
                _ => None,
            })
    };

    let metadata = report.section(Category::Metadata);
    let row = sqlx::query(
        "INSERT INTO prescriptions
            (patient_id, job_id, medications, doctor, diagnosis, prescription_date, follow_up)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(patient_id)
    .bind(&report.job_id)
    .bind(medications)
    .bind(text_of(metadata, "doctor_name"))
    .bind(text_of(prescription, "diagnosis"))
    .bind(text_of(prescription, "prescription_date"))
    .bind(text_of(prescription, "follow_up"))
    .fetch_one(pool)
    .await
    .context("Failed to insert prescription")?;
    let id: i64 = row.get("id");
    info!(patient_id, report_id = id, "Prescription inserted");
    Ok(id)
}

/// Insert an x-ray report. Only reachable for reports that carry `findings`
/// or `image_url` sections from an alternative structuring strategy.
pub async fn insert_xray_report(
    pool: &PgPool,
    patient_id: i64,
    report: &StructuredReport,
) -> Result<i64> {
    let findings = report
        .sections
        .get("findings")
        .map(serde_json::to_value)
        .transpose()
        .context("Failed to serialize findings")?;

    let row = sqlx::query(
        "INSERT INTO xray_reports (patient_id, job_id, findings, image_url)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(patient_id)
    .bind(&report.job_id)
    .bind(findings)
    .bind(Option::<String>::None)
    .fetch_one(pool)
    .await
    .context("Failed to insert x-ray report")?;
    let id: i64 = row.get("id");
    info!(patient_id, report_id = id, "X-ray report inserted");
    Ok(id)
}

/// Extract the patient name from the metadata section, defaulting to
/// "Unknown" when absent.
pub fn patient_name(report: &StructuredReport) -> String {
    report
        .section(Category::Metadata)
        .and_then(|s| s.get("patient_name"))
        .and_then(|f| match &f.value {
            FieldValue::Text(name) => Some(name.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Auto-detect the report type and route to the matching insert.
///
/// Returns the inserted report id. An `Unknown` routing decision is an
/// error surfaced to the caller, never a silent default.
pub async fn insert_report_auto(pool: &PgPool, report: &StructuredReport) -> AppResult<i64> {
    let name = patient_name(report);
    let patient_id = upsert_patient(pool, &name)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let routing = classify(report);
    let inserted = match routing {
        RoutingDecision::BloodTest => insert_blood_test(pool, patient_id, report).await,
        RoutingDecision::Prescription => insert_prescription(pool, patient_id, report).await,
        RoutingDecision::Xray => insert_xray_report(pool, patient_id, report).await,
        RoutingDecision::Unknown => {
            return Err(AppError::UnknownReportType(format!(
                "Could not detect report type for {}",
                report.job_id
            )));
        }
    };

    inserted.map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assemble_report;

    #[test]
    fn test_patient_name_from_metadata_section() {
        let report = assemble_report("job_db_test", "Patient Name: Asha Rao", 90.0, None);
        assert_eq!(patient_name(&report), "Asha Rao");
    }

    #[test]
    fn test_patient_name_defaults_to_unknown() {
        let report = assemble_report("job_db_test", "no labels here at all", 90.0, None);
        assert_eq!(patient_name(&report), "Unknown");
    }
}
