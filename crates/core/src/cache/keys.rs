use serde::Serialize;
use serde_json::{Map, Value};

/// Separator between the resource name and its parameter list.
const RESOURCE_SEPARATOR: char = ':';

/// Separator between `name:value` parameter pairs.
const PARAM_SEPARATOR: &str = "|";

/// Builds a canonical cache key from a resource name and its parameters.
///
/// Parameter names are sorted before joining, so the insertion order of
/// `params` never changes the resulting key. Each value is rendered as
/// compact JSON.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Map, Value};
/// use storecache_core::cache::generate;
///
/// let params: Map<String, Value> = json!({ "page": 1, "limit": 20 })
///     .as_object()
///     .cloned()
///     .unwrap();
/// assert_eq!(generate("products", &params), "products:limit:20|page:1");
///
/// assert_eq!(generate("products", &Map::new()), "products");
/// ```
pub fn generate(resource: &str, params: &Map<String, Value>) -> String {
    if params.is_empty() {
        return resource.to_string();
    }

    let mut pairs: Vec<(&String, &Value)> = params.iter().collect();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

    let joined = pairs
        .into_iter()
        .map(|(name, value)| format!("{}:{}", name, canonical_json(value)))
        .collect::<Vec<_>>()
        .join(PARAM_SEPARATOR);

    format!("{resource}{RESOURCE_SEPARATOR}{joined}")
}

/// Builds a cache key from any serializable parameter struct.
///
/// The parameters are converted to JSON first; anything that does not
/// serialize to an object (unit, `null`, scalars) is treated as "no
/// parameters" and yields the bare resource name.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use storecache_core::cache::generate_from;
///
/// #[derive(Serialize)]
/// struct Page {
///     page: u32,
///     limit: u32,
/// }
///
/// let key = generate_from("orders", &Page { page: 2, limit: 50 });
/// assert_eq!(key, "orders:limit:50|page:2");
/// ```
pub fn generate_from<P: Serialize + ?Sized>(resource: &str, params: &P) -> String {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => generate(resource, &map),
        _ => resource.to_string(),
    }
}

/// Renders a JSON value in compact form.
///
/// `serde_json::Map` keeps its keys sorted, so nested objects come out in
/// a stable order as well.
fn canonical_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail: all map keys are strings.
    serde_json::to_string(value).unwrap_or_default()
}
