//! Content categories.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_via, required, RecordId, Resource};
use crate::error::ValidationError;

/// A category used to group accounts and content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Record id.
    pub id: RecordId,
    /// Category name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Display color, usually a hex string.
    pub color: Option<String>,
}

#[derive(Deserialize)]
struct CategoryWire {
    id: RecordId,
    #[serde(default, alias = "title")]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

impl TryFrom<CategoryWire> for Category {
    type Error = ValidationError;

    fn try_from(wire: CategoryWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            name: required(Self::NAME, "name", wire.name)?,
            description: wire.description,
            color: wire.color,
        })
    }
}

impl Resource for Category {
    const NAME: &'static str = "category";
    const PATH: &'static str = "categories";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<CategoryWire, _>(Self::NAME, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_title_as_name() {
        let category = Category::decode(json!({ "id": 5, "title": "Travel" })).unwrap();
        assert_eq!(category.name, "Travel");
    }
}
