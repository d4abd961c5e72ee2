use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. In JSON mode the
/// fields of `data` are merged into the top-level object.
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&success_body(message, data))?),
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("  {}: {}", key, s),
                        other => println!("  {}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}

fn success_body(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    match (response.as_object_mut(), data) {
        (Some(body), Some(Value::Object(fields))) => body.extend(fields),
        (Some(body), Some(other)) => {
            body.insert("data".to_string(), other);
        }
        _ => {}
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_object_data_into_body() {
        let body = success_body("Seeded", Some(json!({"users": 2})));
        assert_eq!(body["success"], true);
        assert_eq!(body["users"], 2);
    }

    #[test]
    fn nests_non_object_data() {
        let body = success_body("Fingerprint", Some(json!("abc")));
        assert_eq!(body["data"], "abc");
        assert!(success_body("ok", None).get("data").is_none());
    }
}
