//! Texture to parameter-name resolution.
//!
//! Two sources name a material's textures: the filename suffix heuristic, which
//! always has an answer, and texture-sample-parameter nodes, which carry the
//! artist-assigned name but only for textures wired through the expression graph.
//! Heuristic labels go in first; expression names then overwrite the label of the
//! first entry holding the same texture name, or are appended when nothing matches.
//!
//! Entries are an ordered list, not a map. Two different texture objects with the
//! same name produce two entries, and only the first of them is ever renamed.

use crate::expression::ParameterBinding;
use crate::suffix::{OtherCounter, SuffixClassifier};
use serde::Serialize;

/// Parameter key that is never written out.
pub const SKIPPED_KEY: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionEntry {
    pub key: String,
    pub value: String,
}

impl ResolutionEntry {
    pub fn render(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolutionMap {
    entries: Vec<ResolutionEntry>,
}

impl ResolutionMap {
    /// `texture_names` is the material's full texture list with names already
    /// validated; `None` marks a texture whose name could not be read.
    pub fn resolve<'a, I>(
        texture_names: I,
        classifier: &SuffixClassifier,
        bindings: &[ParameterBinding],
    ) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut map = Self::provisional(texture_names, classifier);
        for binding in bindings {
            map.bind(&binding.parameter, &binding.texture_name);
        }
        map
    }

    fn provisional<'a, I>(texture_names: I, classifier: &SuffixClassifier) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut others = OtherCounter::default();
        let entries = texture_names
            .into_iter()
            .flatten()
            .map(|name| {
                let key = match classifier.classify(name) {
                    Some(category) => category.to_string(),
                    None => others.next_label(),
                };
                ResolutionEntry {
                    key,
                    value: name.to_string(),
                }
            })
            .collect();
        Self { entries }
    }

    /// Renames the first entry holding `texture_name`, or appends a new one.
    pub fn bind(&mut self, parameter: &str, texture_name: &str) {
        match self.entries.iter_mut().find(|e| e.value == texture_name) {
            Some(entry) => {
                log::debug!("{} renamed to {} for {}", entry.key, parameter, texture_name);
                entry.key = parameter.to_string();
            }
            None => self.entries.push(ResolutionEntry {
                key: parameter.to_string(),
                value: texture_name.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that make it into the sidecar file.
    pub fn emitted(&self) -> impl Iterator<Item = &ResolutionEntry> {
        self.entries.iter().filter(|e| e.key != SKIPPED_KEY)
    }
}
