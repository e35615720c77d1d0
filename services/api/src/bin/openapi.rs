//! services/api/src/bin/openapi.rs
//!
//! This binary generates the OpenAPI 3.0 specification for the REST API
//! and saves it to a file, `openapi.json` unless another path is given.

use std::path::{Path, PathBuf};

use api_lib::web::rest::ApiDoc;
use clap::Parser;
use utoipa::OpenApi;

#[derive(Parser, Debug)]
#[command(name = "openapi", about = "Write the cats API OpenAPI document")]
struct Cli {
    /// Output file
    #[arg(default_value = "openapi.json")]
    output: PathBuf,
}

/// Generates the OpenAPI specification and writes it to a file.
fn generate_spec(
    api_doc: utoipa::openapi::OpenApi,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!(
        "OpenAPI specification for the cats API generated at {}",
        path.display()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    generate_spec(ApiDoc::openapi(), &cli.output)?;
    Ok(())
}
