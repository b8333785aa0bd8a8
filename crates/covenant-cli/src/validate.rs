//! # Validate Subcommand
//!
//! `covenant validate --schema <file> --document <file>`

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use covenant_core::{CovenantError, ErrorModel};
use covenant_schema::{ValidationMode, Validator};

use crate::document;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON Schema file (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,

    /// Document to validate (JSON or YAML).
    #[arg(long)]
    pub document: PathBuf,

    /// Root location prefixed to every reported error.
    #[arg(long, default_value = "request.body")]
    pub path: String,

    /// Which side of the exchange the document belongs to.
    #[arg(long, value_enum, default_value_t = Mode::Request)]
    pub mode: Mode,
}

/// Validation mode flag.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// `readOnly` properties are not required.
    Request,
    /// `writeOnly` properties are not required.
    Response,
}

impl From<Mode> for ValidationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Request => ValidationMode::Request,
            Mode::Response => ValidationMode::Response,
        }
    }
}

/// Validate the document. Returns the problem body when it has violations.
pub fn run(args: &ValidateArgs) -> Result<Option<ErrorModel>, CovenantError> {
    let schema = document::load_schema(&args.schema)?;
    let value = document::load(&args.document)?;

    let errors = Validator::default()
        .with_mode(args.mode.into())
        .validate(&schema, &value, &args.path);

    tracing::info!(
        document = %args.document.display(),
        errors = errors.len(),
        "validation finished"
    );
    if errors.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ErrorModel::validation_failed(errors)))
    }
}
