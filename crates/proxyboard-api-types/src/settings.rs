use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Global backend setting such as `default-site`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub meta: Map<String, Value>,
}
