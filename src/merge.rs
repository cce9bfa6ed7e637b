use serde_json::{Map, Value};

/// Merge `higher` into `lower`, where `higher` wins. Only keys already
/// present in `lower` are touched; the rule is an explicit case match on the
/// list-ness of the two sides:
///
/// - both lists: `higher ++ lower` (higher-priority entries come first)
/// - higher is a list: `higher ++ [lower]`
/// - lower is a list: `[higher] ++ lower`
/// - neither: `higher` replaces `lower`
///
/// This is deliberately not a generic deep merge: it is order-sensitive and
/// not associative, and the manifest pipeline depends on exactly these
/// shapes (e.g. `permissions` unioning `@match` patterns with extra grants).
pub fn merge(lower: &mut Map<String, Value>, higher: &Map<String, Value>) {
    for (key, higher_value) in higher {
        let Some(lower_value) = lower.get_mut(key) else {
            continue;
        };

        let merged = match (lower_value.clone(), higher_value.clone()) {
            (Value::Array(lower_items), Value::Array(mut higher_items)) => {
                higher_items.extend(lower_items);
                Value::Array(higher_items)
            }
            (scalar, Value::Array(mut higher_items)) => {
                higher_items.push(scalar);
                Value::Array(higher_items)
            }
            (Value::Array(lower_items), scalar) => {
                let mut items = vec![scalar];
                items.extend(lower_items);
                Value::Array(items)
            }
            (_, scalar) => scalar,
        };
        *lower_value = merged;
    }
}

/// Keyed merge as [`merge`], then copy every key that only exists in
/// `higher` into `lower` verbatim. Used for the predefined overlay, which
/// may carry keys the generated base knows nothing about (`background`,
/// icon tables, ...).
pub fn merge_with_passthrough(lower: &mut Map<String, Value>, higher: &Map<String, Value>) {
    merge(lower, higher);
    for (key, value) in higher {
        if !lower.contains_key(key) {
            lower.insert(key.clone(), value.clone());
        }
    }
}
