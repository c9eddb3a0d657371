use std::path::Path;

use ctxdoc_core::CompilerConfig;

use crate::OutputFormat;

pub(crate) fn cmd_index(
    root: &Path,
    config: &CompilerConfig,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let db = ctxdoc_core::compile(root, config)?;
    let index = db.to_index();
    match output {
        OutputFormat::Text => {
            for line in &index {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&index)?),
    }
    Ok(())
}
