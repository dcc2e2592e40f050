use std::collections::BTreeSet;

use crate::model::LoadedTables;
use crate::normalize::{is_valid_person_key, sheet_person_key};
use crate::schema::PERSON_KEY_TERM;

/// Every valid person key found in a holder-key column of any loaded table,
/// deduplicated and sorted.
pub fn extract_person_keys(tables: &LoadedTables) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for table in tables.tables.values() {
        let key_columns: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(PERSON_KEY_TERM))
            .map(|(i, _)| i)
            .collect();

        for row in &table.rows {
            for &c in &key_columns {
                let raw = row.get(c).map(String::as_str).unwrap_or("");
                match sheet_person_key(raw) {
                    Some(key) if is_valid_person_key(&key) => {
                        keys.insert(key);
                    }
                    Some(key) if !key.is_empty() => {
                        log::debug!("{}: skipping short key '{key}'", table.kind);
                    }
                    _ => {}
                }
            }
        }
    }
    log::info!("extracted {} person keys", keys.len());
    keys
}
