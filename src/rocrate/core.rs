use derive_builder::Builder;
use garde::Validate;
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{borrow::Cow, fmt};

use crate::rocrate::errors::{Error, Result};

/// File name of the manifest at the root of every crate.
pub const METADATA_FILE: &str = "ro-crate-metadata.json";
/// `@id` of the root dataset in freshly created crates.
pub const ROOT_ID: &str = "./";
pub const DEFAULT_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";
pub const CONFORMS_TO: &str = "https://w3id.org/ro/crate/1.1";

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_array() {
        Vec::<T>::deserialize(value).map_err(de::Error::custom)
    } else {
        Ok(vec![T::deserialize(value).map_err(de::Error::custom)?])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct Text(#[garde(length(min = 1))] pub Cow<'static, str>);

impl Text {
    pub fn new(text: impl ToString) -> Self {
        Self(Cow::Owned(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub type Id = Text;

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One node of the crate's `@graph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Validate)]
pub struct Entity {
    #[serde(rename = "@id")]
    #[garde(dive)]
    pub id: Id,
    #[serde(flatten)]
    #[builder(default)]
    #[garde(skip)]
    pub properties: IndexMap<String, Value>,
}

impl Entity {
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Text form of a property, see [`text_value`].
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(text_value)
    }

    /// The `@id` this property points at, if it is a reference.
    pub fn reference(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::Object(object) => object.get("@id").and_then(Value::as_str),
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("@id"))
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Reduce a JSON-LD property value to plain text.
///
/// Literals and references unwrap, arrays use their first element. Returns
/// `None` for anything that carries no text, including empty strings.
pub fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => return items.first().and_then(text_value),
        Value::Object(object) => {
            return object
                .get("@value")
                .or_else(|| object.get("@id"))
                .and_then(text_value);
        }
        Value::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// The parsed `ro-crate-metadata.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Manifest {
    #[serde(rename = "@context")]
    #[garde(skip)]
    pub context: Value,
    #[serde(rename = "@graph", deserialize_with = "one_or_many")]
    #[garde(length(min = 1), dive)]
    pub graph: Vec<Entity>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(text)?;
        manifest.validate()?;
        manifest.root_index()?;
        Ok(manifest)
    }

    /// Manifest of an empty crate: a metadata descriptor and a root dataset.
    pub fn empty(date_published: &str) -> Result<Self> {
        let root = Entity::builder()
            .id(Id::new(ROOT_ID))
            .properties(IndexMap::from([
                ("@type".to_string(), json!("Dataset")),
                ("datePublished".to_string(), json!(date_published)),
            ]))
            .build()
            .map_err(|e| Error::Builder(e.to_string()))?;
        Ok(Self {
            context: json!(DEFAULT_CONTEXT),
            graph: vec![metadata_descriptor(ROOT_ID)?, root],
        })
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.graph.iter().find(|entity| entity.id.as_str() == id)
    }

    pub fn descriptor(&self) -> Option<&Entity> {
        self.entity(METADATA_FILE)
    }

    /// Position of the root dataset in `@graph`, resolved through the
    /// descriptor's `about`.
    pub fn root_index(&self) -> Result<usize> {
        let descriptor = self
            .descriptor()
            .ok_or_else(|| Error::invalid_format(format!("no \"{METADATA_FILE}\" descriptor")))?;
        let root_id = descriptor.reference("about").ok_or_else(|| {
            Error::invalid_format("metadata descriptor does not reference a root dataset")
        })?;
        self.graph
            .iter()
            .position(|entity| entity.id.as_str() == root_id)
            .ok_or_else(|| Error::invalid_format(format!("root dataset {root_id} not in @graph")))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Descriptor entity declaring `about` as the crate root.
pub fn metadata_descriptor(about: &str) -> Result<Entity> {
    Entity::builder()
        .id(Id::new(METADATA_FILE))
        .properties(IndexMap::from([
            ("@type".to_string(), json!("CreativeWork")),
            ("conformsTo".to_string(), json!({ "@id": CONFORMS_TO })),
            ("about".to_string(), json!({ "@id": about })),
        ]))
        .build()
        .map_err(|e| Error::Builder(e.to_string()))
}
