use std::path::Path;

use anyhow::Context;
use ctxdoc_core::CompilerConfig;

pub(crate) fn cmd_compile(
    root: &Path,
    config: &CompilerConfig,
    out: &Path,
    shard_size: Option<usize>,
    quiet: bool,
) -> anyhow::Result<()> {
    let db = ctxdoc_core::compile(root, config)
        .with_context(|| format!("compiling {}", root.display()))?;
    let threshold = shard_size.unwrap_or(config.shard_threshold);
    tracing::debug!(threshold, commands = db.len(), "sharding database");
    db.write(out, threshold)
        .with_context(|| format!("writing database to {}", out.display()))?;
    if !quiet {
        println!("{} commands written to {}", db.len(), out.display());
    }
    Ok(())
}
