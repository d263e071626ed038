use serde_json::Value;

/// Fields that best answer each command, in priority order.
const PRIORITY_KEYS: [&str; 6] = [
    "monthly_payment",
    "current_principal_balance",
    "token",
    "final_balance",
    "id",
    "email",
];

/// Print just the key answer value from the output.
///
/// Looks inside the `result` envelope when present; arrays print their length.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            let hit = PRIORITY_KEYS
                .iter()
                .find_map(|key| map.get(*key).filter(|v| !v.is_null()));
            match hit {
                Some(val) => println!("{}", format_minimal(val)),
                None => {
                    if let Some((key, val)) = map.iter().next() {
                        println!("{}: {}", key, format_minimal(val));
                    }
                }
            }
        }
        Value::Array(items) => println!("{}", items.len()),
        other => println!("{}", format_minimal(other)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
