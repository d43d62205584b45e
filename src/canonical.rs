use crate::asset_graph::{AssetGraph, ObjectId};
use crate::foreign_str::NameReader;
use serde::{Deserialize, Serialize};

/// Slot names in output order.
pub const CANONICAL_SLOTS: [&str; 23] = [
    "Diffuse",
    "Normal",
    "Specular",
    "SpecPower",
    "Opacity",
    "Emissive",
    "Cube",
    "Mask",
    "Detail",
    "AO",
    "GlowMap",
    "PaintMask",
    "TeamColor",
    "ColorLookup",
    "DecalTexture",
    "TilingPattern",
    "HexMask",
    "Environment",
    "Reflection",
    "Overlay",
    "Noise",
    "Roughness",
    "Metallic",
];

/// Resolved material parameters as reported by the object model: textures wired
/// directly into well-known shader inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CanonicalParams {
    pub diffuse: Option<ObjectId>,
    pub normal: Option<ObjectId>,
    pub specular: Option<ObjectId>,
    pub spec_power: Option<ObjectId>,
    pub opacity: Option<ObjectId>,
    pub emissive: Option<ObjectId>,
    pub cube: Option<ObjectId>,
    pub mask: Option<ObjectId>,
    pub detail: Option<ObjectId>,
    #[serde(rename = "AO")]
    pub ao: Option<ObjectId>,
    pub glow_map: Option<ObjectId>,
    pub paint_mask: Option<ObjectId>,
    pub team_color: Option<ObjectId>,
    pub color_lookup: Option<ObjectId>,
    pub decal_texture: Option<ObjectId>,
    pub tiling_pattern: Option<ObjectId>,
    pub hex_mask: Option<ObjectId>,
    pub environment: Option<ObjectId>,
    pub reflection: Option<ObjectId>,
    pub overlay: Option<ObjectId>,
    pub noise: Option<ObjectId>,
    pub roughness: Option<ObjectId>,
    pub metallic: Option<ObjectId>,
}

impl CanonicalParams {
    /// Slot values paired with their names, in `CANONICAL_SLOTS` order.
    pub fn slots(&self) -> [(&'static str, Option<ObjectId>); 23] {
        let values = [
            self.diffuse,
            self.normal,
            self.specular,
            self.spec_power,
            self.opacity,
            self.emissive,
            self.cube,
            self.mask,
            self.detail,
            self.ao,
            self.glow_map,
            self.paint_mask,
            self.team_color,
            self.color_lookup,
            self.decal_texture,
            self.tiling_pattern,
            self.hex_mask,
            self.environment,
            self.reflection,
            self.overlay,
            self.noise,
            self.roughness,
            self.metallic,
        ];
        let mut out = [("", None); 23];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (CANONICAL_SLOTS[i], value);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalLine {
    pub slot: &'static str,
    pub texture: ObjectId,
    /// `None` when the texture's name did not validate; such slots are queued for
    /// export but not written.
    pub texture_name: Option<String>,
}

impl CanonicalLine {
    pub fn render(&self) -> Option<String> {
        self.texture_name
            .as_ref()
            .map(|name| format!("{}={}", self.slot, name))
    }
}

pub fn canonical_lines(
    graph: &AssetGraph,
    params: &CanonicalParams,
    reader: &NameReader,
) -> Vec<CanonicalLine> {
    params
        .slots()
        .into_iter()
        .filter_map(|(slot, id)| {
            let id = id?;
            // A dangling reference is the same as an empty slot.
            let object = graph.get(id)?;
            Some(CanonicalLine {
                slot,
                texture: id,
                texture_name: reader.read(&object.name),
            })
        })
        .collect()
}
