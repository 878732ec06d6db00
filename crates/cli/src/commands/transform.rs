//! `hearth transform`: Resolve a context and apply it to a draft reply.

use super::context::ContextArgs;
use hearth_config::LayerStore;
use std::path::Path;

pub fn run(path: &Path, args: &ContextArgs, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = LayerStore::load(path)?;
    let ctx = args.build()?;

    let config = hearth_resolver::resolve(&store, &ctx);
    let result = hearth_transform::transform(text, &config);

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
