use std::path::Path;

use anyhow::bail;
use ctxdoc_core::CompilerConfig;

use crate::OutputFormat;

pub(crate) fn cmd_lookup(
    root: &Path,
    config: &CompilerConfig,
    name: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let db = ctxdoc_core::compile(root, config)?;
    let Some(entry) = db.get(name) else {
        bail!("command not found: {}", name);
    };
    match output {
        OutputFormat::Text => {
            for variant in &entry.variants {
                if variant.elements.is_empty() {
                    println!("\\{}", name);
                } else {
                    println!("\\{} {}", name, variant.render());
                }
            }
            if !entry.files.is_empty() {
                let files: Vec<&str> = entry.files.iter().map(String::as_str).collect();
                println!("files: {}", files.join(", "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entry.to_json_value())?);
        }
    }
    Ok(())
}
