//! Write the OpenAPI document to `govgpt-web/docs` as JSON and YAML

use std::fs;
use std::path::Path;
use govgpt_web::openapi::{get_openapi_json, get_openapi_yaml};

fn main() -> anyhow::Result<()> {
    let docs_dir = Path::new("govgpt-web/docs");
    if !docs_dir.exists() {
        fs::create_dir_all(docs_dir)?;
    }

    let json_path = docs_dir.join("openapi.json");
    fs::write(&json_path, get_openapi_json()?)?;
    println!("Generated: {}", json_path.display());

    let yaml_path = docs_dir.join("openapi.yaml");
    fs::write(&yaml_path, get_openapi_yaml()?)?;
    println!("Generated: {}", yaml_path.display());

    Ok(())
}
