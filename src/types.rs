use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Deserializer, Serialize};

/// Account identifier assigned by the blogging API.
///
/// Access tokens carry it either as a JSON number (`id`) or as a numeric
/// string (`user_id`); both deserialize to the same value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    FromStr, From, Into,
)]
#[serde(transparent)]
pub struct UserId(#[serde(deserialize_with = "numeric_id")] pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    FromStr, From, Into,
)]
#[serde(transparent)]
pub struct BlogId(#[serde(deserialize_with = "numeric_id")] pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    FromStr, From, Into,
)]
#[serde(transparent)]
pub struct CategoryId(#[serde(deserialize_with = "numeric_id")] pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    FromStr, From, Into,
)]
#[serde(transparent)]
pub struct CommentId(#[serde(deserialize_with = "numeric_id")] pub u64);

fn numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid numeric id: {s:?}"))),
    }
}
