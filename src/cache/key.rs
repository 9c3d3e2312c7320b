//! Cache Key Module
//!
//! Derives deterministic cache keys from an endpoint and its parameters.

use serde_json::Value;

use crate::cache::KEY_PREFIX;

// == Build Key ==
/// Builds the cache key for `endpoint` called with `params`.
///
/// Parameter names are sorted before serialization so that equivalent
/// parameter sets collide regardless of insertion order. Names and values
/// are both encoded as JSON, which keeps `"1"` and `1` distinct and stops a
/// name containing `=` or `&` from forging another parameter set.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use buildtrack_cache::cache::build_key;
/// use serde_json::json;
///
/// let mut params = HashMap::new();
/// params.insert("status".to_string(), json!("active"));
/// params.insert("page".to_string(), json!(2));
///
/// assert_eq!(
///     build_key("/projects", &params),
///     r#"buildtrack:v1:/projects?"page"=2&"status"="active""#
/// );
/// ```
pub fn build_key<'a, I>(endpoint: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut pairs: Vec<(&String, &Value)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut key = String::with_capacity(KEY_PREFIX.len() + endpoint.len());
    key.push_str(KEY_PREFIX);
    key.push_str(endpoint);

    if !pairs.is_empty() {
        let query = pairs
            .iter()
            .map(|(name, value)| format!("{}={value}", Value::from(name.as_str())))
            .collect::<Vec<_>>()
            .join("&");
        key.push('?');
        key.push_str(&query);
    }

    key
}
