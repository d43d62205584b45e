use crate::asset_graph::{AssetGraph, AssetObject, ObjectId, ObjectKind};
use crate::config::ExportConfig;
use crate::foreign_str::NameReader;
use crate::material_export::export_material;
use crate::suffix::SuffixClassifier;
use crate::texture_export::{export_cubemap, export_texture};
use crate::types::{ExportFailure, ExportReport};
use anyhow::{Context, Result, bail};
use chrono::Local;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output file for one artifact of one object.
pub struct Archive {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .with_context(|| format!("Failed writing {}", self.path.display()))
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("Failed flushing {}", self.path.display()))?;
        Ok(self.path)
    }
}

impl Write for Archive {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches('.')
        .to_string()
}

/// State shared by every export started from one command: which objects are
/// already done, where files go, and what happened.
pub struct ExportSession<'g> {
    graph: &'g AssetGraph,
    config: ExportConfig,
    reader: NameReader,
    classifier: SuffixClassifier,
    exported: HashSet<ObjectId>,
    objects_exported: usize,
    materials_exported: usize,
    files: Vec<String>,
    failures: Vec<ExportFailure>,
}

impl<'g> ExportSession<'g> {
    pub fn new(graph: &'g AssetGraph, config: ExportConfig) -> Self {
        let reader = NameReader::new(config.name_scan_limit);
        Self {
            graph,
            config,
            reader,
            classifier: SuffixClassifier::default(),
            exported: HashSet::new(),
            objects_exported: 0,
            materials_exported: 0,
            files: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn graph(&self) -> &'g AssetGraph {
        self.graph
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn reader(&self) -> &NameReader {
        &self.reader
    }

    pub fn classifier(&self) -> &SuffixClassifier {
        &self.classifier
    }

    /// Records `id` as handled. Returns false when it already was.
    fn mark_exported(&mut self, id: ObjectId) -> bool {
        self.exported.insert(id)
    }

    pub(crate) fn note_material_written(&mut self) {
        self.materials_exported += 1;
    }

    /// File stem for an object; corrupt or unusable names fall back to class and id.
    pub fn file_stem(&self, object: &AssetObject) -> String {
        self.reader
            .read(&object.name)
            .map(|n| sanitize_file_name(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{}_{}", object.class_name(), object.id.0))
    }

    /// Opens `<out_dir>/<Class>/<Name><ext>`. A failure is logged and reported as
    /// `None` so the caller can give up on this object only.
    pub fn create_archive(&mut self, object: &AssetObject, ext: &str) -> Option<Archive> {
        let dir = self.config.out_dir.join(object.class_name());
        let path = dir.join(format!("{}{}", self.file_stem(object), ext));
        let opened = fs::create_dir_all(&dir)
            .with_context(|| format!("Failed creating {}", dir.display()))
            .and_then(|_| {
                File::create(&path).with_context(|| format!("Failed creating {}", path.display()))
            });
        match opened {
            Ok(file) => {
                self.files.push(path.to_string_lossy().to_string());
                Some(Archive {
                    path,
                    writer: BufWriter::new(file),
                })
            }
            Err(err) => {
                log::warn!("{:#}", err);
                self.record_failure(object, &err);
                None
            }
        }
    }

    pub(crate) fn record_failure(&mut self, object: &AssetObject, err: &anyhow::Error) {
        self.failures.push(ExportFailure {
            object: object.id,
            class: object.class_name().to_string(),
            error: format!("{:#}", err),
        });
    }

    /// Exports one object unless this session already did. Failures are logged and
    /// collected; they never stop the caller's remaining work.
    pub fn export_object(&mut self, id: ObjectId) {
        self.export_in_chain(id, &mut Vec::new());
    }

    /// Same as `export_object`, for a material parent reached through `chain`.
    pub(crate) fn export_in_chain(&mut self, id: ObjectId, chain: &mut Vec<ObjectId>) {
        if !self.mark_exported(id) {
            log::debug!("{} already exported", id);
            return;
        }
        let graph = self.graph;
        let Some(object) = graph.get(id) else {
            log::warn!("cannot export {}: not in asset graph", id);
            return;
        };
        self.objects_exported += 1;

        let result = match &object.kind {
            ObjectKind::Texture(data) => export_texture(self, object, data),
            ObjectKind::TextureCube { faces } => export_cubemap(self, object, faces),
            ObjectKind::Material(_) => export_material(self, id, chain),
        };
        if let Err(err) = result {
            log::warn!(
                "failed exporting {} {}: {:#}",
                object.class_name(),
                self.file_stem(object),
                err
            );
            self.record_failure(object, &err);
        }
    }

    pub fn export_named(&mut self, name: &str) -> Result<()> {
        let graph = self.graph;
        let Some(object) = graph.find_by_name(name, &self.reader) else {
            bail!("No object named '{}' in asset graph", name);
        };
        self.export_object(object.id);
        Ok(())
    }

    pub fn export_all_materials(&mut self) {
        let graph = self.graph;
        for object in graph.objects().filter(|o| o.as_material().is_some()) {
            self.export_object(object.id);
        }
    }

    pub fn finish(self) -> ExportReport {
        ExportReport {
            generated_at: Local::now().to_rfc3339(),
            out_dir: self.config.out_dir.to_string_lossy().to_string(),
            objects_exported: self.objects_exported,
            materials_exported: self.materials_exported,
            files: self.files,
            failures: self.failures,
        }
    }
}
