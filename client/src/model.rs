use serde::{
    de::Error as _,
    Deserialize,
    Deserializer,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
};

/// An organization as returned by the Sentry API.
///
/// The listing endpoint leaves `teams` out, only the detail endpoint fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// One `[timestamp, value]` point of a project stats series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct StatSample {
    /// Unix seconds.
    pub timestamp: i64,
    pub value: f64,
}

impl From<(f64, f64)> for StatSample {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self {
            timestamp: timestamp as i64,
            value,
        }
    }
}

impl From<StatSample> for (f64, f64) {
    fn from(sample: StatSample) -> Self {
        (sample.timestamp as f64, sample.value)
    }
}

/// Value of the `stat` query parameter of the project stats endpoint.
#[derive(Debug, Clone, Copy, Display, EnumIter, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum StatQuery {
    Received,
    Rejected,
    Blacklisted,
}

impl StatQuery {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Sentry encodes ids as strings, older instances and some endpoints as numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid id {text:?}"))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
