//! Vocabulary simplification by level.
//!
//! Each level above `adult` adds its own table on top of every simpler
//! level's table. When two levels list the same word, the stricter one
//! decides the replacement.

use crate::words::WordTable;
use hearth_core::VocabularyLevel;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const SIMPLE: &[(&str, &str)] = &[
    ("additional", "more"),
    ("approximately", "about"),
    ("assist", "help"),
    ("commence", "start"),
    ("demonstrate", "show"),
    ("illuminate", "turn on"),
    ("indicate", "show"),
    ("inquire", "ask"),
    ("numerous", "many"),
    ("obtain", "get"),
    ("purchase", "buy"),
    ("require", "need"),
    ("residence", "home"),
    ("sufficient", "enough"),
    ("terminate", "end"),
    ("utilize", "use"),
];

const VERY_SIMPLE: &[(&str, &str)] = &[
    ("appropriate", "right"),
    ("attempt", "try"),
    ("automobile", "car"),
    ("consume", "eat"),
    ("currently", "now"),
    ("difficult", "hard"),
    ("enormous", "huge"),
    ("frequently", "often"),
    ("however", "but"),
    ("immediately", "right now"),
    ("precipitation", "rain"),
    ("temperature", "how warm it is"),
    ("therefore", "so"),
];

const TODDLER: &[(&str, &str)] = &[
    ("beverage", "drink"),
    ("delicious", "yummy"),
    ("enormous", "really big"),
    ("frightened", "scared"),
    ("large", "big"),
    ("purchase", "get"),
    ("small", "little"),
    ("stomach", "tummy"),
    ("vehicle", "car"),
];

fn own_table(level: VocabularyLevel) -> &'static [(&'static str, &'static str)] {
    match level {
        VocabularyLevel::Adult => &[],
        VocabularyLevel::Simple => SIMPLE,
        VocabularyLevel::VerySimple => VERY_SIMPLE,
        VocabularyLevel::Toddler => TODDLER,
    }
}

/// The combined table for `level`: every level up to and including it,
/// stricter entries overriding.
pub fn combined_table(level: VocabularyLevel) -> BTreeMap<&'static str, &'static str> {
    VocabularyLevel::ORDERED
        .iter()
        .take_while(|l| l.strictness() <= level.strictness())
        .flat_map(|l| own_table(*l).iter().copied())
        .collect()
}

static TABLES: LazyLock<Vec<(VocabularyLevel, Option<WordTable>)>> = LazyLock::new(|| {
    VocabularyLevel::ORDERED
        .iter()
        .map(|level| (*level, WordTable::new(combined_table(*level))))
        .collect()
});

/// Simplify `text` for `level`. Returns `None` when nothing changed.
pub fn simplify(text: &str, level: VocabularyLevel, modifications: &mut Vec<String>) -> Option<String> {
    let table = TABLES
        .iter()
        .find(|(l, _)| *l == level)
        .and_then(|(_, t)| t.as_ref())?;
    let (out, applied) = table.apply(text)?;
    modifications.extend(
        applied
            .into_iter()
            .map(|(from, to)| format!("simplified '{from}' → '{to}'")),
    );
    Some(out)
}
