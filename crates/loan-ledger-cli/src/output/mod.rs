pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Month rows carried by a value: `result.schedule` of a computation
/// envelope, or `schedule` of a stored loan schedule.
pub(crate) fn schedule_rows(value: &Value) -> Option<&[Value]> {
    let holder = match value.get("result") {
        Some(result @ Value::Object(_)) => result,
        _ => value,
    };
    holder.get("schedule")?.as_array().map(Vec::as_slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_rows_from_envelope_and_stored_loan() {
        let envelope = json!({"result": {"schedule": [{"month": 0}, {"month": 1}]}});
        assert_eq!(schedule_rows(&envelope).map(<[Value]>::len), Some(2));

        let stored = json!({"loan_id": 4, "schedule": [{"month": 0}]});
        assert_eq!(schedule_rows(&stored).map(<[Value]>::len), Some(1));

        assert!(schedule_rows(&json!({"result": {"monthly_payment": "1"}})).is_none());
        assert!(schedule_rows(&json!([1, 2])).is_none());
    }
}
