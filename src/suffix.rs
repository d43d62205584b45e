/// Texture naming conventions, in priority order. The first matching suffix wins,
/// so reordering this table changes exported output.
pub const DEFAULT_SUFFIXES: [(&str, &str); 6] = [
    ("_D", "Diffuse"),
    // common in custom materials
    ("_pack", "Diffuse"),
    ("_N", "Normal"),
    ("_MASK", "Mask"),
    ("_Cube", "Cubemap"),
    ("_crl", "Detail"),
];

#[derive(Debug, Clone)]
pub struct SuffixClassifier {
    table: Vec<(String, String)>,
}

impl Default for SuffixClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIXES)
    }
}

impl SuffixClassifier {
    pub fn new<I, S, C>(table: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            table: table
                .into_iter()
                .map(|(s, c)| (s.into(), c.into()))
                .collect(),
        }
    }

    /// Category for a texture name, by case-insensitive suffix.
    pub fn classify(&self, name: &str) -> Option<&str> {
        let hit = self
            .table
            .iter()
            .find(|(suffix, _)| ends_with_ignore_ascii_case(name, suffix))?;
        log::debug!("type {} for texture {}", hit.1, name);
        Some(hit.1.as_str())
    }
}

fn ends_with_ignore_ascii_case(name: &str, suffix: &str) -> bool {
    let name = name.as_bytes();
    let suffix = suffix.as_bytes();
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Ordinal labels for textures no suffix matched. One counter per material.
#[derive(Debug, Default)]
pub struct OtherCounter {
    next: usize,
}

impl OtherCounter {
    pub fn next_label(&mut self) -> String {
        let label = format!("Other[{}]", self.next);
        self.next += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_entry_matches_its_suffix() {
        let classifier = SuffixClassifier::default();
        for (suffix, category) in DEFAULT_SUFFIXES {
            let name = format!("Tex{}", suffix);
            assert_eq!(classifier.classify(&name), Some(category), "{}", name);
            let lower = name.to_ascii_lowercase();
            assert_eq!(classifier.classify(&lower), Some(category), "{}", lower);
            let upper = name.to_ascii_uppercase();
            assert_eq!(classifier.classify(&upper), Some(category), "{}", upper);
        }
    }

    #[test]
    fn first_entry_in_table_order_wins() {
        let classifier = SuffixClassifier::new([("_N", "Normal"), ("Rock_N", "RockNormal")]);
        assert_eq!(classifier.classify("Rock_N"), Some("Normal"));

        let reversed = SuffixClassifier::new([("Rock_N", "RockNormal"), ("_N", "Normal")]);
        assert_eq!(reversed.classify("Rock_N"), Some("RockNormal"));
        assert_eq!(reversed.classify("Sand_N"), Some("Normal"));
    }

    #[test]
    fn suffix_must_be_at_the_tail() {
        let classifier = SuffixClassifier::default();
        assert_eq!(classifier.classify("Wall_D_Old"), None);
        assert_eq!(classifier.classify("_"), None);
        assert_eq!(classifier.classify(""), None);
        assert_eq!(classifier.classify("Grime_mask"), Some("Mask"));
    }

    #[test]
    fn non_ascii_names_do_not_panic() {
        let classifier = SuffixClassifier::default();
        assert_eq!(classifier.classify("Текстура_d"), Some("Diffuse"));
        assert_eq!(classifier.classify("é"), None);
    }

    #[test]
    fn other_labels_increase_from_zero() {
        let mut counter = OtherCounter::default();
        assert_eq!(counter.next_label(), "Other[0]");
        assert_eq!(counter.next_label(), "Other[1]");
        assert_eq!(counter.next_label(), "Other[2]");
    }
}
