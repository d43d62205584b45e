use crate::canonical::CanonicalParams;
use crate::error::GraphError;
use crate::foreign_str::{ForeignStr, NameReader};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadCompression {
    #[default]
    None,
    Lz4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexturePayload {
    pub compression: PayloadCompression,
    pub uncompressed_size: usize,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    pub payload: Option<TexturePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionNode {
    /// Any member of the texture-sample-parameter family.
    TextureSampleParameter {
        parameter_name: ForeignStr,
        texture: Option<ObjectId>,
    },
    Other {
        kind: String,
    },
}

impl ExpressionNode {
    pub fn texture(&self) -> Option<ObjectId> {
        match self {
            Self::TextureSampleParameter { texture, .. } => *texture,
            Self::Other { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialVariant {
    Basic,
    Material3 {
        expressions: Vec<Option<ExpressionNode>>,
        referenced_textures: Vec<Option<ObjectId>>,
    },
    Instance {
        parent: Option<ObjectId>,
        /// Textures bound by the instance's texture parameter overrides.
        texture_parameters: Vec<Option<ObjectId>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialData {
    pub variant: MaterialVariant,
    pub params: CanonicalParams,
    pub textures: Vec<Option<ObjectId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Texture(TextureData),
    TextureCube { faces: Vec<Option<ObjectId>> },
    Material(MaterialData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetObject {
    pub id: ObjectId,
    pub name: ForeignStr,
    pub kind: ObjectKind,
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl AssetObject {
    pub fn class_name(&self) -> &'static str {
        match &self.kind {
            ObjectKind::Texture(_) => "Texture2D",
            ObjectKind::TextureCube { .. } => "TextureCube",
            ObjectKind::Material(m) => match m.variant {
                MaterialVariant::Basic => "Material",
                MaterialVariant::Material3 { .. } => "Material3",
                MaterialVariant::Instance { .. } => "MaterialInstanceConstant",
            },
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(self.kind, ObjectKind::Texture(_))
    }

    pub fn is_texture_cube(&self) -> bool {
        matches!(self.kind, ObjectKind::TextureCube { .. })
    }

    pub fn as_material(&self) -> Option<&MaterialData> {
        match &self.kind {
            ObjectKind::Material(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphDump {
    #[serde(default)]
    objects: Vec<ObjectRecord>,
}

#[derive(Debug, Deserialize)]
struct PayloadRecord {
    #[serde(default)]
    compression: PayloadCompression,
    #[serde(default)]
    uncompressed_size: Option<usize>,
    #[serde(default)]
    data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ExpressionRecord {
    kind: String,
    #[serde(default)]
    parameter_name: ForeignStr,
    #[serde(default)]
    texture: Option<ObjectId>,
}

#[derive(Debug, Deserialize)]
struct TextureParameterRecord {
    #[serde(default)]
    texture: Option<ObjectId>,
}

#[derive(Debug, Deserialize)]
struct ObjectRecord {
    id: ObjectId,
    class: String,
    #[serde(default)]
    name: ForeignStr,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    payload: Option<PayloadRecord>,
    #[serde(default)]
    faces: Vec<Option<ObjectId>>,
    #[serde(default)]
    params: CanonicalParams,
    #[serde(default)]
    textures: Vec<Option<ObjectId>>,
    #[serde(default)]
    referenced_textures: Vec<Option<ObjectId>>,
    #[serde(default)]
    expressions: Vec<Option<ExpressionRecord>>,
    #[serde(default)]
    parent: Option<ObjectId>,
    #[serde(default)]
    texture_parameters: Vec<TextureParameterRecord>,
}

fn is_texture_sample_parameter(kind: &str) -> bool {
    let kind = kind.strip_prefix("MaterialExpression").unwrap_or(kind);
    matches!(
        kind,
        "TextureSampleParameter"
            | "TextureSampleParameter2D"
            | "TextureSampleParameterCube"
            | "TextureSampleParameterNormal"
            | "TextureSampleParameterSubUV"
            | "TextureSampleParameterMovie"
    )
}

fn convert_expression(record: ExpressionRecord) -> ExpressionNode {
    if is_texture_sample_parameter(&record.kind) {
        ExpressionNode::TextureSampleParameter {
            parameter_name: record.parameter_name,
            texture: record.texture,
        }
    } else {
        ExpressionNode::Other { kind: record.kind }
    }
}

fn convert_payload(
    id: ObjectId,
    class: &str,
    record: PayloadRecord,
) -> Result<TexturePayload, GraphError> {
    let uncompressed_size = match record.compression {
        PayloadCompression::None => record.data.len(),
        PayloadCompression::Lz4 => record.uncompressed_size.ok_or_else(|| {
            GraphError::InvalidPayload {
                id,
                class: class.to_string(),
                reason: "lz4 payload without uncompressed_size".to_string(),
            }
        })?,
    };
    Ok(TexturePayload {
        compression: record.compression,
        uncompressed_size,
        data: record.data,
    })
}

fn convert_record(record: ObjectRecord) -> Result<AssetObject, GraphError> {
    let material = |variant| {
        ObjectKind::Material(MaterialData {
            variant,
            params: record.params.clone(),
            textures: record.textures.clone(),
        })
    };

    let kind = match record.class.as_str() {
        "Texture2D" | "Texture" => ObjectKind::Texture(TextureData {
            width: record.width,
            height: record.height,
            format: record.format.clone(),
            payload: None,
        }),
        "TextureCube" => ObjectKind::TextureCube {
            faces: record.faces.clone(),
        },
        "Material" => material(MaterialVariant::Basic),
        "Material3" => material(MaterialVariant::Material3 {
            expressions: Vec::new(),
            referenced_textures: record.referenced_textures.clone(),
        }),
        "MaterialInstanceConstant" => material(MaterialVariant::Instance {
            parent: record.parent,
            texture_parameters: Vec::new(),
        }),
        other => {
            return Err(GraphError::UnknownClass {
                id: record.id,
                class: other.to_string(),
            });
        }
    };

    let ObjectRecord {
        id,
        class,
        name,
        properties,
        payload,
        expressions,
        texture_parameters,
        ..
    } = record;

    let kind = match kind {
        ObjectKind::Texture(mut data) => {
            data.payload = payload
                .map(|p| convert_payload(id, &class, p))
                .transpose()?;
            ObjectKind::Texture(data)
        }
        ObjectKind::Material(mut data) => {
            match &mut data.variant {
                MaterialVariant::Material3 {
                    expressions: nodes, ..
                } => {
                    *nodes = expressions
                        .into_iter()
                        .map(|e| e.map(convert_expression))
                        .collect();
                }
                MaterialVariant::Instance {
                    texture_parameters: values,
                    ..
                } => {
                    *values = texture_parameters.into_iter().map(|p| p.texture).collect();
                }
                MaterialVariant::Basic => {}
            }
            ObjectKind::Material(data)
        }
        other => other,
    };

    Ok(AssetObject {
        id,
        name,
        kind,
        properties,
    })
}

/// Loaded asset graph. Objects keep their dump order.
#[derive(Debug, Clone, Default)]
pub struct AssetGraph {
    objects: Vec<AssetObject>,
    index: HashMap<ObjectId, usize>,
}

impl AssetGraph {
    pub fn from_objects(objects: Vec<AssetObject>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(objects.len());
        for (i, obj) in objects.iter().enumerate() {
            if index.insert(obj.id, i).is_some() {
                return Err(GraphError::DuplicateId(obj.id));
            }
        }
        Ok(Self { objects, index })
    }

    pub fn from_json(raw: &str) -> Result<Self, GraphError> {
        let dump: GraphDump = serde_json::from_str(raw)?;
        let objects = dump
            .objects
            .into_iter()
            .map(convert_record)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_objects(objects)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &AssetObject> {
        self.objects.iter()
    }

    pub fn get(&self, id: ObjectId) -> Option<&AssetObject> {
        self.index.get(&id).map(|&i| &self.objects[i])
    }

    pub fn name_of(&self, id: ObjectId, reader: &NameReader) -> Option<String> {
        self.get(id).and_then(|o| reader.read(&o.name))
    }

    pub fn find_by_name(&self, name: &str, reader: &NameReader) -> Option<&AssetObject> {
        self.objects
            .iter()
            .find(|o| reader.read(&o.name).as_deref() == Some(name))
    }

    pub fn canonical_params(&self, id: ObjectId) -> Option<&CanonicalParams> {
        self.get(id)?.as_material().map(|m| &m.params)
    }

    /// Collects every texture the object references into `out`, skipping objects
    /// already present. Null references from the source lists are kept as `None`.
    pub fn append_referenced_textures(&self, id: ObjectId, out: &mut Vec<Option<ObjectId>>) {
        let mut visited = HashSet::new();
        self.append_textures_inner(id, out, &mut visited);
    }

    fn append_textures_inner(
        &self,
        id: ObjectId,
        out: &mut Vec<Option<ObjectId>>,
        visited: &mut HashSet<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Some(material) = self.get(id).and_then(AssetObject::as_material) else {
            return;
        };

        let mut add = |tex: Option<ObjectId>| match tex {
            Some(t) if out.contains(&Some(t)) => {}
            other => out.push(other),
        };

        match &material.variant {
            MaterialVariant::Basic => material.textures.iter().copied().for_each(&mut add),
            MaterialVariant::Material3 {
                expressions,
                referenced_textures,
            } => {
                material.textures.iter().copied().for_each(&mut add);
                referenced_textures.iter().copied().for_each(&mut add);
                expressions
                    .iter()
                    .flatten()
                    .filter_map(ExpressionNode::texture)
                    .for_each(|t| add(Some(t)));
            }
            MaterialVariant::Instance {
                parent,
                texture_parameters,
            } => {
                material.textures.iter().copied().for_each(&mut add);
                texture_parameters.iter().copied().for_each(&mut add);
                if let Some(parent) = parent {
                    self.append_textures_inner(*parent, out, visited);
                }
            }
        }
    }
}

pub fn load_graph(path: &Path) -> Result<AssetGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed reading asset graph {}", path.display()))?;
    let graph = AssetGraph::from_json(&raw)
        .with_context(|| format!("Failed loading asset graph {}", path.display()))?;
    log::info!("loaded {} objects from {}", graph.len(), path.display());
    Ok(graph)
}
