//! Flat node map built from a JSON-LD document
//!
//! Embedded node objects are lifted into the top level and replaced by
//! `{"@id": ...}` references, so every node in the result appears exactly once.
//! The map serializes back out in the `ro-crate-metadata.json` dialect.
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::io::Read;

use crate::rocrate::core::{
    DEFAULT_CONTEXT, Entity, Id, METADATA_FILE, Manifest, ROOT_ID, metadata_descriptor,
};
use crate::rocrate::errors::{Error, Result};

const SCHEMA_ORG: [&str; 2] = ["http://schema.org/", "https://schema.org/"];

type Properties = IndexMap<String, Value>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    context: Option<Value>,
    nodes: IndexMap<String, Properties>,
    blank_nodes: usize,
}

impl Graph {
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let document: Value = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_document(document: Value) -> Result<Self> {
        let mut graph = Self::default();
        match document {
            Value::Object(mut object) => {
                graph.context = object.shift_remove("@context");
                match object.shift_remove("@graph") {
                    Some(Value::Array(nodes)) => graph.insert_all(nodes)?,
                    Some(node @ Value::Object(_)) => {
                        graph.insert_node(node)?;
                    }
                    Some(_) => return Err(Error::invalid_format("@graph must hold node objects")),
                    None => {
                        graph.insert_node(Value::Object(object))?;
                    }
                }
            }
            Value::Array(nodes) => graph.insert_all(nodes)?,
            _ => {
                return Err(Error::invalid_format(
                    "linked-data document must be a JSON object or array",
                ));
            }
        }
        if graph.nodes.is_empty() {
            return Err(Error::invalid_format("linked-data document has no nodes"));
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Properties> {
        self.nodes.get(id)
    }

    fn insert_all(&mut self, nodes: Vec<Value>) -> Result<()> {
        for node in nodes {
            self.insert_node(node)?;
        }
        Ok(())
    }

    /// Add a node object and everything embedded in it, returning its id.
    fn insert_node(&mut self, node: Value) -> Result<String> {
        let mut object = match node {
            Value::Object(object) => object,
            other => {
                return Err(Error::invalid_format(format!("expected a node object, got {other}")));
            }
        };
        object.shift_remove("@context");
        let id = match object.shift_remove("@id") {
            Some(Value::String(id)) => id,
            Some(other) => return Err(Error::invalid_format(format!("invalid @id {other}"))),
            None => self.blank_node_id(),
        };
        // Reserve the slot so a node is listed before the nodes it embeds.
        self.nodes.entry(id.clone()).or_default();

        let mut properties = Vec::with_capacity(object.len());
        for (key, value) in object {
            let key = compact_iri(&key).to_string();
            let value = if key == "@type" {
                compact_types(value)
            } else {
                self.flatten_value(value)?
            };
            properties.push((key, value));
        }

        let target = self.nodes.entry(id.clone()).or_default();
        for (key, value) in properties {
            merge_property(target, key, value);
        }
        Ok(id)
    }

    fn flatten_value(&mut self, value: Value) -> Result<Value> {
        match value {
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|item| self.flatten_value(item))
                    .collect::<Result<_>>()?,
            )),
            Value::Object(mut object) => {
                if object.contains_key("@value") {
                    return Ok(Value::Object(object));
                }
                if let Some(list) = object.shift_remove("@list") {
                    return Ok(json!({ "@list": self.flatten_value(list)? }));
                }
                if is_reference(&object) {
                    return Ok(Value::Object(object));
                }
                let id = self.insert_node(Value::Object(object))?;
                Ok(json!({ "@id": id }))
            }
            other => Ok(other),
        }
    }

    fn blank_node_id(&mut self) -> String {
        let id = format!("_:b{}", self.blank_nodes);
        self.blank_nodes += 1;
        id
    }

    /// Express the graph as a crate manifest.
    ///
    /// Graphs lacking a metadata descriptor get one when a `./` dataset is
    /// present; otherwise there is no root to describe and this fails.
    pub fn to_manifest(&self) -> Result<Manifest> {
        let mut graph = Vec::with_capacity(self.nodes.len() + 1);
        if !self.nodes.contains_key(METADATA_FILE) {
            if !self.nodes.contains_key(ROOT_ID) {
                return Err(Error::invalid_format(format!(
                    "linked-data graph has neither {METADATA_FILE} nor a {ROOT_ID} dataset"
                )));
            }
            graph.push(metadata_descriptor(ROOT_ID)?);
        }
        for (id, properties) in &self.nodes {
            graph.push(
                Entity::builder()
                    .id(Id::new(id))
                    .properties(properties.clone())
                    .build()
                    .map_err(|e| Error::Builder(e.to_string()))?,
            );
        }

        let manifest = Manifest {
            context: self.context.clone().unwrap_or_else(|| json!(DEFAULT_CONTEXT)),
            graph,
        };
        manifest.root_index()?;
        Ok(manifest)
    }
}

fn is_reference(object: &Map<String, Value>) -> bool {
    object.len() == 1 && object.contains_key("@id")
}

fn compact_iri(iri: &str) -> &str {
    SCHEMA_ORG
        .iter()
        .find_map(|prefix| iri.strip_prefix(prefix))
        .filter(|local| !local.is_empty())
        .unwrap_or(iri)
}

fn compact_types(value: Value) -> Value {
    match value {
        Value::String(kind) => Value::String(compact_iri(&kind).to_string()),
        Value::Array(kinds) => Value::Array(kinds.into_iter().map(compact_types).collect()),
        other => other,
    }
}

fn merge_property(properties: &mut Properties, key: String, value: Value) {
    let Some(existing) = properties.get_mut(&key) else {
        properties.insert(key, value);
        return;
    };
    if *existing == value {
        return;
    }
    let mut merged = match existing.take() {
        Value::Array(items) => items,
        single => vec![single],
    };
    let incoming = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    for item in incoming {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    *existing = Value::Array(merged);
}
