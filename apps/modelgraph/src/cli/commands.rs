//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use modelgraph_core::{
    ExportError, ImportError, Model, PositionMap, ValidationReport, auto_layout, coerce, document,
    validate, validate_for_export,
};
use std::path::{Path, PathBuf};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors surfaced to the CLI user.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Io(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Issues were already printed; this only carries the exit status.
    #[error("document failed validation with {count} issue(s)")]
    DocumentInvalid { count: usize },
}

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum document file size (10 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_DOCUMENT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AppError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it
/// exists and is a regular file. This prevents path traversal where a
/// path like "../../../etc/passwd" reaches outside the working tree.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| AppError::Io(format!("Invalid file path '{}': {}", path.display(), e)))?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, AppError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AppError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AppError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AppError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// DOCUMENT LOADING
// =============================================================================

/// Read, parse and validate a document file, refusing on any issue.
///
/// Returns the coerced model and its positions: the deterministic grid
/// as a baseline, overlaid with whatever the file stored.
fn load_document(path: &Path) -> Result<(Model, PositionMap), AppError> {
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, MAX_DOCUMENT_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| AppError::Io(format!("Read file: {}", e)))?;

    let data = document::parse(&text)?;
    let report = validate(&data);
    if !report.ok {
        print_report_text(&report);
        return Err(AppError::DocumentInvalid {
            count: report.issues.len(),
        });
    }

    let model = coerce(&data);
    tracing::debug!(
        "Loaded {:?}: {} objects, {} relationships",
        path,
        model.entities.len(),
        model.relationships.len()
    );
    let mut positions = auto_layout(&model.entities);
    positions.extend(document::read_positions(&data, &model));
    Ok((model, positions))
}

fn write_document(path: &Path, text: &str) -> Result<PathBuf, AppError> {
    let validated_output = validate_output_path(path)?;
    std::fs::write(&validated_output, text)
        .map_err(|e| AppError::Io(format!("Write file: {}", e)))?;
    Ok(validated_output)
}

fn print_report_text(report: &ValidationReport) {
    for issue in &report.issues {
        let mut line = String::new();
        if let Some(path) = &issue.field_path {
            line.push_str(path);
            line.push_str(": ");
        }
        line.push_str(&issue.message);
        if let Some(id) = &issue.id {
            line.push_str(&format!(" [id: {}]", id));
        }
        if let Some(hint) = &issue.suggestion {
            line.push_str(&format!(" (hint: {})", hint));
        }
        println!("{}", line);
    }
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Validate a document and report every issue.
pub fn cmd_validate(file: &Path, strict: bool, json_mode: bool) -> Result<(), AppError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_DOCUMENT_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| AppError::Io(format!("Read file: {}", e)))?;
    let data = document::parse(&text)?;

    let report = if strict {
        validate_for_export(&data)
    } else {
        validate(&data)
    };

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
    } else if report.ok {
        println!("OK: no issues found");
    } else {
        print_report_text(&report);
    }

    if report.ok {
        Ok(())
    } else {
        Err(AppError::DocumentInvalid {
            count: report.issues.len(),
        })
    }
}

// =============================================================================
// FMT COMMAND
// =============================================================================

/// Normalize a document: coerced defaults, schema version stamped,
/// stable field order, every entity positioned.
pub fn cmd_fmt(file: &Path, output: Option<&Path>, quiet: bool) -> Result<(), AppError> {
    let (model, positions) = load_document(file)?;
    let text = document::render(&model, &positions)?;
    let target = write_document(output.unwrap_or(file), &text)?;

    if !quiet {
        println!("Formatted {} objects to {:?}", model.entities.len(), target);
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Re-export a document with the entity-name gate applied.
pub fn cmd_export(file: &Path, output: &Path, quiet: bool) -> Result<(), AppError> {
    let (model, positions) = load_document(file)?;

    let data = document::to_value(&model, &positions)?;
    let report = validate_for_export(&data);
    if !report.ok {
        print_report_text(&report);
        return Err(AppError::DocumentInvalid {
            count: report.issues.len(),
        });
    }

    let text = document::render(&model, &positions)?;
    let target = write_document(output, &text)?;

    if !quiet {
        println!("Exported {} bytes to {:?}", text.len(), target);
    }
    Ok(())
}

// =============================================================================
// LAYOUT COMMAND
// =============================================================================

/// Discard stored positions and assign the deterministic grid layout.
pub fn cmd_layout(file: &Path, output: Option<&Path>, quiet: bool) -> Result<(), AppError> {
    let (model, _) = load_document(file)?;
    let positions = auto_layout(&model.entities);

    let text = document::render(&model, &positions)?;
    let target = write_document(output.unwrap_or(file), &text)?;

    if !quiet {
        println!(
            "Laid out {} objects on the grid, wrote {:?}",
            model.entities.len(),
            target
        );
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show document summary.
pub fn cmd_status(file: &Path, json_mode: bool) -> Result<(), AppError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_DOCUMENT_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| AppError::Io(format!("Read file: {}", e)))?;
    let data = document::parse(&text)?;

    let report = validate(&data);
    let model = coerce(&data);
    let curve_points: usize = model
        .relationships
        .iter()
        .map(modelgraph_core::Relationship::curve_point_count)
        .sum();

    if json_mode {
        let output = serde_json::json!({
            "file": file.to_string_lossy(),
            "valid": report.ok,
            "issue_count": report.issues.len(),
            "object_count": model.entities.len(),
            "relationship_count": model.relationships.len(),
            "curve_point_count": curve_points
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Modelgraph Document Status");
    println!("==========================");
    println!("File: {:?}", file);
    println!();
    println!("Valid:         {}", if report.ok { "yes" } else { "no" });
    println!("Issues:        {}", report.issues.len());
    println!("Objects:       {}", model.entities.len());
    println!("Relationships: {}", model.relationships.len());
    println!("Curve Points:  {}", curve_points);

    Ok(())
}
