use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
}

/// Identifiers come back as JSON numbers from some endpoints and as strings
/// from others; both are kept as strings.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Unsigned(n) => n.to_string(),
        StringOrNumber::Signed(n) => n.to_string(),
    })
}

pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            Some(StringOrNumber::String(s)) => Some(s),
            Some(StringOrNumber::Unsigned(n)) => Some(n.to_string()),
            Some(StringOrNumber::Signed(n)) => Some(n.to_string()),
            None => None,
        },
    )
}

/// Flags read from environment strings: `true` in any case or `1` switch
/// them on, any other value switches them off.
pub fn deserialize_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|value| {
        let value = value.trim();
        value.eq_ignore_ascii_case("true") || value == "1"
    }))
}
