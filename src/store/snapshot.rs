//! @acp:module "Element Store Snapshot"
//! @acp:summary "Nested JSON export and its exact inverse import"
//! @acp:domain store
//! @acp:layer io
//!
//! Layout: `domains -> category -> element name -> element`, plus a flat
//! tag index and the source-text list. Element records carry their tags and
//! declared variables so an import restores everything an export saw.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::{Element, ElementVariable, SourcePrompt};
use super::{
    insert_domain, insert_element, insert_variable, source_prompt_known, upsert_source_prompt,
    validate_element, ElementStore, CLEAR_SQL,
};
use crate::error::{PromptError, Result};

pub const LIBRARY_NAME: &str = "Universal Elements Library";
pub const SNAPSHOT_VERSION: &str = "2.0";

/// Header describing one export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub name: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub total_elements: u32,
    pub total_domains: u32,
}

/// One domain's slice of the export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSnapshot {
    pub domain_metadata: DomainMetadata,
    /// category id -> element key -> record
    #[serde(default)]
    pub categories: IndexMap<String, IndexMap<String, ElementRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_elements: u32,
}

/// An element together with its variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(flatten)]
    pub element: Element,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<ElementVariable>,
}

/// @acp:summary "Serializable image of the whole element library"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub library_metadata: LibraryMetadata,
    pub domains: IndexMap<String, DomainSnapshot>,
    /// tag -> element ids
    #[serde(default)]
    pub tag_index: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub source_prompts: Vec<SourcePrompt>,
}

impl LibrarySnapshot {
    /// All element records in export order
    pub fn records(&self) -> impl Iterator<Item = &ElementRecord> {
        self.domains
            .values()
            .flat_map(|d| d.categories.values())
            .flat_map(|c| c.values())
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl ElementStore {
    /// @acp:summary "Export every domain, element, tag link and source text"
    pub fn export_all(&self) -> Result<LibrarySnapshot> {
        let mut domains = IndexMap::new();
        let mut tag_index: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut total_elements = 0u32;

        for domain in self.domains()? {
            let mut snapshot = DomainSnapshot {
                domain_metadata: DomainMetadata {
                    name: domain.name.clone(),
                    description: domain.description.clone(),
                    total_elements: domain.total_elements,
                },
                categories: IndexMap::new(),
            };

            for element in self.search_by_domain(&domain.id, None, None, None)? {
                for tag in &element.tags {
                    tag_index
                        .entry(tag.clone())
                        .or_default()
                        .push(element.id.clone());
                }
                let variables = self.variables(&element.id)?;
                let category = snapshot
                    .categories
                    .entry(element.category_id.clone())
                    .or_default();
                let key = record_key(category, &element);
                category.insert(key, ElementRecord { element, variables });
                total_elements += 1;
            }

            domains.insert(domain.id, snapshot);
        }

        tag_index.sort_keys();

        let snapshot = LibrarySnapshot {
            library_metadata: LibraryMetadata {
                name: LIBRARY_NAME.to_string(),
                version: SNAPSHOT_VERSION.to_string(),
                exported_at: Utc::now(),
                total_elements,
                total_domains: domains.len() as u32,
            },
            domains,
            tag_index,
            source_prompts: self.source_prompts()?,
        };
        info!(total_elements, "Exported element library");
        Ok(snapshot)
    }

    /// @acp:summary "Load a snapshot, optionally clearing first; returns elements inserted"
    ///
    /// Elements whose id is already present are skipped. Clearing and every
    /// insert share one transaction, so any other failure leaves the library
    /// exactly as it was.
    pub fn import_all(&mut self, snapshot: &LibrarySnapshot, clear_first: bool) -> Result<usize> {
        let tx = self.conn.transaction()?;
        if clear_first {
            tx.execute_batch(CLEAR_SQL)?;
        }

        for (domain_id, domain) in &snapshot.domains {
            insert_domain(
                &tx,
                domain_id,
                &domain.domain_metadata.name,
                &domain.domain_metadata.description,
            )?;
        }

        let mut imported = 0usize;
        for record in snapshot.records() {
            validate_element(&record.element)?;
            match insert_element(&tx, &record.element) {
                Ok(()) => {}
                Err(PromptError::DuplicateElement(id)) => {
                    warn!(element_id = %id, "Skipping element already in library");
                    continue;
                }
                Err(e) => return Err(e),
            }
            for variable in &record.variables {
                insert_variable(&tx, &record.element.id, variable)?;
            }
            imported += 1;
        }

        for record in &snapshot.source_prompts {
            // Upsert accumulates counts; importing the same record twice must not double it
            if !clear_first && source_prompt_known(&tx, record.prompt_id)? {
                let mut fresh = record.clone();
                fresh.extracted_elements_count = 0;
                upsert_source_prompt(&tx, &fresh)?;
            } else {
                upsert_source_prompt(&tx, record)?;
            }
        }

        tx.commit()?;
        info!(imported, clear_first, "Imported element library");
        Ok(imported)
    }

    /// Export straight to a JSON file
    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> Result<LibrarySnapshot> {
        let snapshot = self.export_all()?;
        snapshot.write_json(path)?;
        Ok(snapshot)
    }

    pub fn import_from_file<P: AsRef<Path>>(&mut self, path: P, clear_first: bool) -> Result<usize> {
        let snapshot = LibrarySnapshot::from_json(path)?;
        self.import_all(&snapshot, clear_first)
    }
}

/// Element name when free, else `name#id`, else a numbered variant of that
fn record_key(category: &IndexMap<String, ElementRecord>, element: &Element) -> String {
    if !category.contains_key(&element.name) {
        return element.name.clone();
    }
    let base = format!("{}#{}", element.name, element.id);
    let mut key = base.clone();
    let mut n = 2;
    while category.contains_key(&key) {
        key = format!("{}-{}", base, n);
        n += 1;
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> ElementStore {
        let mut store = ElementStore::in_memory().unwrap();
        store
            .add_element(
                &Element::new("p1", "portrait", "gender", "female", "young woman")
                    .with_keywords(["woman", "female"])
                    .with_quality(9.0)
                    .with_tags(["subject", "gender"]),
            )
            .unwrap();
        // Same name in the same category
        store
            .add_element(
                &Element::new("p2", "portrait", "gender", "female", "graceful lady")
                    .with_quality(7.5)
                    .with_tags(["subject"]),
            )
            .unwrap();
        store
            .add_element(
                &Element::new("c1", "common", "lighting_techniques", "rim", "{strength} rim light")
                    .with_keywords(["rim light", "edge lighting", "backlight"])
                    .with_quality(8.0),
            )
            .unwrap();
        store
            .add_variable("c1", &ElementVariable::enumeration("strength", ["soft", "hard"]))
            .unwrap();
        store
            .save_source_prompt(&SourcePrompt::new(7, "cinematic portrait of a young woman"))
            .unwrap();
        store
    }

    #[test]
    fn test_export_layout() {
        let snapshot = seeded().export_all().unwrap();
        assert_eq!(snapshot.library_metadata.name, LIBRARY_NAME);
        assert_eq!(snapshot.library_metadata.total_elements, 3);

        let gender = &snapshot.domains["portrait"].categories["gender"];
        let keys: Vec<_> = gender.keys().cloned().collect();
        assert_eq!(keys, vec!["female".to_string(), "female#p2".to_string()]);

        assert_eq!(snapshot.tag_index["subject"], vec!["p1", "p2"]);
        assert_eq!(snapshot.source_prompts.len(), 1);
    }

    #[test]
    fn test_round_trip_through_file() {
        let source = seeded();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        let exported = source.export_to_file(&path).unwrap();

        let mut target = ElementStore::in_memory().unwrap();
        let count = target.import_from_file(&path, true).unwrap();
        assert_eq!(count, 3);

        for record in exported.records() {
            let restored = target.get_element(&record.element.id).unwrap().unwrap();
            assert_eq!(restored, record.element);
        }
        assert_eq!(
            target.variables("c1").unwrap(),
            source.variables("c1").unwrap()
        );
        assert_eq!(target.source_prompts().unwrap(), source.source_prompts().unwrap());
    }

    #[test]
    fn test_import_without_clear_skips_existing() {
        let mut store = seeded();
        let snapshot = store.export_all().unwrap();
        let count = store.import_all(&snapshot, false).unwrap();
        assert_eq!(count, 0);
        assert_eq!(store.stats().unwrap().total_elements, 3);
        assert_eq!(store.source_prompts().unwrap()[0].extracted_elements_count, 0);
    }

    #[test]
    fn test_failed_import_leaves_library_untouched() {
        let mut store = seeded();
        let mut snapshot = store.export_all().unwrap();
        let mut good = snapshot.records().next().unwrap().clone();
        good.element.id = "fresh".to_string();
        let mut bad = good.clone();
        bad.element.id = "blank".to_string();
        bad.element.template = "   ".to_string();
        let gender = snapshot
            .domains
            .get_mut("portrait")
            .unwrap()
            .categories
            .get_mut("gender")
            .unwrap();
        gender.insert("fresh".to_string(), good);
        gender.insert("blank".to_string(), bad);

        assert!(matches!(
            store.import_all(&snapshot, true),
            Err(PromptError::InvalidElement(_))
        ));
        assert_eq!(store.stats().unwrap().total_elements, 3);
        assert!(store.get_element("p1").unwrap().is_some());
        assert!(store.get_element("fresh").unwrap().is_none());
        assert_eq!(store.variables("c1").unwrap().len(), 1);
        assert_eq!(store.source_prompts().unwrap().len(), 1);
    }

    #[test]
    fn test_export_keeps_every_element_when_ids_shadow_names() {
        let mut store = ElementStore::in_memory().unwrap();
        for (id, name) in [("x1", "k"), ("x2", "n"), ("k", "n"), ("n#k", "n")] {
            store
                .add_element(&Element::new(id, "art", "styles", name, format!("style {}", id)))
                .unwrap();
        }

        let snapshot = store.export_all().unwrap();
        assert_eq!(snapshot.library_metadata.total_elements, 4);
        assert_eq!(snapshot.records().count(), 4);

        let mut target = ElementStore::in_memory().unwrap();
        assert_eq!(target.import_all(&snapshot, true).unwrap(), 4);
        for id in ["x1", "x2", "k", "n#k"] {
            assert!(target.get_element(id).unwrap().is_some(), "{} missing", id);
        }
    }
}
