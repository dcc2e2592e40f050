use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::{RawSheet, ReconciledRecord};
use crate::normalize::roster_person_key;

const TABLE: &str = "roster";

pub const COL_KEY: &str = "CPF";
pub const COL_NAME: &str = "NOME";

/// Person key → display name. The first row for a key wins.
pub fn load_roster(sheet: &RawSheet) -> Result<BTreeMap<String, String>, ReconError> {
    let key_col = sheet.require_column(TABLE, COL_KEY)?;
    let name_col = sheet.require_column(TABLE, COL_NAME)?;

    let mut names = BTreeMap::new();
    for r in 0..sheet.rows.len() {
        let key = roster_person_key(sheet.cell(r, key_col));
        let name = sheet.cell(r, name_col).trim();
        names.entry(key).or_insert_with(|| name.to_string());
    }
    log::info!("roster: {} names", names.len());
    Ok(names)
}

/// Left join of names onto records. Returns how many records got a name.
pub fn attach_names(records: &mut [ReconciledRecord], names: &BTreeMap<String, String>) -> usize {
    let mut attached = 0;
    for record in records.iter_mut() {
        record.name = names.get(&record.key).filter(|n| !n.is_empty()).cloned();
        if record.name.is_some() {
            attached += 1;
        }
    }
    attached
}
