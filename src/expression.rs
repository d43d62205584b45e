use crate::asset_graph::{AssetGraph, ExpressionNode, ObjectId};
use crate::foreign_str::NameReader;
use serde::Serialize;

/// A texture bound to a named parameter by a texture-sample-parameter node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterBinding {
    pub parameter: String,
    pub texture: ObjectId,
    pub texture_name: String,
}

/// Walks material expression nodes in order and collects parameter bindings.
///
/// Null nodes and nodes without a texture are skipped, which is how every
/// non-parameter node kind drops out. A texture whose name does not validate is
/// skipped too; the rest of the scan carries on.
pub fn scan_texture_parameters(
    graph: &AssetGraph,
    nodes: &[Option<ExpressionNode>],
    reader: &NameReader,
) -> Vec<ParameterBinding> {
    let mut out = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        let (parameter_name, texture) = match node {
            Some(ExpressionNode::TextureSampleParameter {
                parameter_name,
                texture,
            }) => (parameter_name, texture),
            Some(ExpressionNode::Other { kind }) => {
                log::trace!("expression [{}] {} skipped", index, kind);
                continue;
            }
            None => continue,
        };
        let Some(texture) = *texture else {
            continue;
        };
        let Some(object) = graph.get(texture) else {
            log::debug!("expression [{}] references missing texture {}", index, texture);
            continue;
        };
        let Some(texture_name) = reader.read(&object.name) else {
            log::warn!(
                "expression [{}] texture {} has an unreadable name, skipped",
                index,
                texture
            );
            continue;
        };
        let parameter = reader.read(parameter_name).unwrap_or_default();
        log::debug!("expression [{}] {} -> {}", index, parameter, texture_name);
        out.push(ParameterBinding {
            parameter,
            texture,
            texture_name,
        });
    }
    out
}
