//! `hearth resolve`: Print the effective configuration for a context.

use super::context::ContextArgs;
use hearth_config::LayerStore;
use std::path::Path;

pub fn run(path: &Path, args: &ContextArgs, merged: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = LayerStore::load(path)?;
    let ctx = args.build()?;

    let output = if merged {
        let layers = hearth_resolver::merge_layers(&store, &ctx);
        serde_json::json!({
            "fragment": layers.fragment,
            "trace": layers.trace,
        })
    } else {
        serde_json::to_value(hearth_resolver::resolve(&store, &ctx))?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
