use crate::model::{ProcessedRow, ProcessedSource, SourceTable};
use crate::normalize::convert_to_float;
use crate::schema::{COL_BENEFICIARY_KEY, COL_BRANCH, COL_COST_CENTER, COL_HOLDER_KEY, COL_VALUE};

/// Identifier columns; never deductions even when they sit right of `VALOR`.
const IDENTIFIER_COLUMNS: [&str; 4] = [COL_HOLDER_KEY, COL_BENEFICIARY_KEY, COL_COST_CENTER, COL_BRANCH];

/// Convert `VALOR` and every deduction column to its right to numbers and
/// compute the net amount: `VALOR` minus each deduction, once.
///
/// Tables without a value column pass through with no numbers and no net.
pub fn process_source(table: &SourceTable) -> ProcessedSource {
    let value_index = table.column_index(COL_VALUE);
    let numeric_columns: Vec<usize> = match value_index {
        Some(vi) => std::iter::once(vi)
            .chain(
                (vi + 1..table.columns.len())
                    .filter(|&c| !IDENTIFIER_COLUMNS.contains(&table.columns[c].as_str())),
            )
            .collect(),
        None => Vec::new(),
    };

    let rows = table
        .rows
        .iter()
        .map(|cells| {
            let numbers: Vec<Option<f64>> = numeric_columns
                .iter()
                .map(|&c| convert_to_float(cells.get(c).map(String::as_str).unwrap_or("")))
                .collect();
            let final_amount = net_amount(&numbers);
            ProcessedRow {
                cells: cells.clone(),
                numbers,
                final_amount,
            }
        })
        .collect();

    ProcessedSource {
        kind: table.kind,
        columns: table.columns.clone(),
        value_index,
        rows,
    }
}

/// First value minus the rest. Any unparseable part makes the result `None`.
fn net_amount(numbers: &[Option<f64>]) -> Option<f64> {
    let (first, rest) = numbers.split_first()?;
    rest.iter().try_fold((*first)?, |acc, n| Some(acc - (*n)?))
}
