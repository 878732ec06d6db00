//! `hearth validate`: Load the profile document and summarize its layers.

use hearth_config::{Activation, LayerStore};
use std::path::Path;

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating {}...", path.display());

    let store = match LayerStore::load(path) {
        Ok(store) => store,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Document is valid");

    let summary = store.summary();
    println!();
    println!("   Base keys:     {}", summary.base_keys);
    println!(
        "   Time periods:  {} ({} manual)",
        summary.time_periods, summary.manual_periods
    );
    println!("   Rooms:         {}", summary.rooms);
    println!("   Conditions:    {}", summary.conditions);
    println!("   Groups:        {}", summary.family_groups);
    println!("   Members:       {}", summary.family_members);

    if !store.time_periods().is_empty() {
        println!();
        for period in store.time_periods() {
            let when = match &period.activation {
                Activation::Manual => "manual".to_string(),
                Activation::Window { range, days } => format!("{range} ({days})"),
            };
            let state = if period.enabled { "" } else { " [disabled]" };
            println!("   ⏰ {:<16} {when}{state}", period.name);
        }
    }

    for group in store.groups() {
        let members: Vec<&str> = group.members.iter().map(String::as_str).collect();
        println!("   👪 {:<16} {}", group.name, members.join(", "));
    }

    if summary.broken_conditions > 0 {
        println!();
        println!(
            "   ⚠️  {} condition(s) do not compile and will always be false",
            summary.broken_conditions
        );
    }

    Ok(())
}
