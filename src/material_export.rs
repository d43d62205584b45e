use crate::asset_graph::{AssetGraph, AssetObject, MaterialVariant, ObjectId};
use crate::canonical::{CanonicalLine, canonical_lines};
use crate::expression::{ParameterBinding, scan_texture_parameters};
use crate::foreign_str::NameReader;
use crate::resolve::ResolutionMap;
use crate::session::ExportSession;
use crate::suffix::SuffixClassifier;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{self, Write};

/// Objects to hand to the session after the sidecar is written, unique by
/// identity and in first-insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ExportQueue {
    items: Vec<ObjectId>,
    #[serde(skip)]
    seen: HashSet<ObjectId>,
}

impl ExportQueue {
    pub fn add_unique(&mut self, id: ObjectId) -> bool {
        if self.seen.insert(id) {
            self.items.push(id);
            true
        } else {
            false
        }
    }

    pub fn items(&self) -> &[ObjectId] {
        &self.items
    }
}

/// Everything written for one material, computed before any file is touched.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialSidecar {
    pub material: ObjectId,
    pub name: Option<String>,
    pub class: &'static str,
    pub canonical: Vec<CanonicalLine>,
    pub bindings: Vec<ParameterBinding>,
    pub resolution: ResolutionMap,
    pub export_queue: ExportQueue,
    pub parent: Option<ObjectId>,
}

impl MaterialSidecar {
    /// Lines of the `.mat` file: canonical slots first, then the resolved map.
    pub fn mat_lines(&self) -> Vec<String> {
        self.canonical
            .iter()
            .filter_map(CanonicalLine::render)
            .chain(self.resolution.emitted().map(|e| e.render()))
            .collect()
    }
}

pub fn build_sidecar(
    graph: &AssetGraph,
    id: ObjectId,
    reader: &NameReader,
    classifier: &SuffixClassifier,
) -> Option<MaterialSidecar> {
    let object = graph.get(id)?;
    let material = object.as_material()?;

    let mut all_textures = Vec::new();
    graph.append_referenced_textures(id, &mut all_textures);

    let mut queue = ExportQueue::default();

    let canonical = canonical_lines(graph, &material.params, reader);
    for line in &canonical {
        queue.add_unique(line.texture);
    }

    let (bindings, parent) = match &material.variant {
        MaterialVariant::Material3 {
            expressions,
            referenced_textures,
        } => {
            for (i, tex) in referenced_textures.iter().enumerate() {
                let Some(tex) = *tex else { continue };
                if graph.get(tex).is_none() {
                    continue;
                }
                log::debug!(
                    "raw texture [{}]: {}",
                    i,
                    graph
                        .name_of(tex, reader)
                        .unwrap_or_else(|| tex.to_string())
                );
                queue.add_unique(tex);
            }
            (scan_texture_parameters(graph, expressions, reader), None)
        }
        MaterialVariant::Instance { parent, .. } => (Vec::new(), *parent),
        MaterialVariant::Basic => (Vec::new(), None),
    };

    let textures: Vec<ObjectId> = all_textures
        .into_iter()
        .flatten()
        .filter(|t| graph.get(*t).is_some())
        .collect();
    let names: Vec<Option<String>> = textures
        .iter()
        .map(|t| graph.name_of(*t, reader))
        .collect();
    let resolution = ResolutionMap::resolve(names.iter().map(Option::as_deref), classifier, &bindings);

    for tex in textures.iter().chain(bindings.iter().map(|b| &b.texture)) {
        queue.add_unique(*tex);
    }

    Some(MaterialSidecar {
        material: id,
        name: reader.read(&object.name),
        class: object.class_name(),
        canonical,
        bindings,
        resolution,
        export_queue: queue,
        parent,
    })
}

fn write_props<W: Write>(out: &mut W, object: &AssetObject) -> io::Result<()> {
    for (key, value) in &object.properties {
        match value {
            serde_json::Value::String(s) => writeln!(out, "{} = {}", key, s)?,
            other => writeln!(out, "{} = {}", key, other)?,
        }
    }
    Ok(())
}

fn write_props_file(session: &mut ExportSession<'_>, object: &AssetObject) -> Result<()> {
    let Some(mut props) = session.create_archive(object, ".props.txt") else {
        return Ok(());
    };
    write_props(&mut props, object)
        .with_context(|| format!("Failed writing {}", props.path().display()))?;
    props.finish()?;
    Ok(())
}

/// Exports a material: `.mat` sidecar, `.props.txt` dump, every referenced object,
/// and for material instances the parent chain. `chain` holds the materials already
/// visited on the way up from the one the export started at.
pub(crate) fn export_material(
    session: &mut ExportSession<'_>,
    id: ObjectId,
    chain: &mut Vec<ObjectId>,
) -> Result<()> {
    let graph = session.graph();
    let Some(object) = graph.get(id) else {
        return Ok(());
    };
    let Some(sidecar) = build_sidecar(graph, id, session.reader(), session.classifier()) else {
        return Ok(());
    };

    let Some(mut mat) = session.create_archive(object, ".mat") else {
        return Ok(());
    };
    for line in sidecar.canonical.iter().filter_map(CanonicalLine::render) {
        mat.write_line(&line)?;
    }

    if session.config().write_props
        && let Err(err) = write_props_file(session, object)
    {
        log::warn!("props for {} not written: {:#}", id, err);
        session.record_failure(object, &err);
    }

    for entry in sidecar.resolution.emitted() {
        mat.write_line(&entry.render())?;
    }
    let path = mat
        .finish()
        .with_context(|| format!("Failed closing sidecar for {}", id))?;
    session.note_material_written();
    log::info!("exported material {}", path.display());

    for obj in sidecar.export_queue.items() {
        // A cubemap's params can name the cubemap itself.
        if *obj != id {
            session.export_object(*obj);
        }
    }

    let Some(parent) = sidecar.parent else {
        return Ok(());
    };
    chain.push(id);
    if chain.contains(&parent) {
        log::warn!("material parent cycle at {} -> {}, stopping", id, parent);
        return Ok(());
    }
    if chain.len() > session.config().max_parent_depth {
        log::warn!(
            "material parent chain deeper than {} at {}, stopping",
            session.config().max_parent_depth,
            id
        );
        return Ok(());
    }
    session.export_in_chain(parent, chain);
    Ok(())
}
