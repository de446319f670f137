//! @acp:module "Element Store"
//! @acp:summary "SQLite library of reusable prompt elements organized by domain and category"
//! @acp:domain store
//! @acp:layer data
//!
//! Elements are read-only during generation. Writes happen through
//! [`ElementStore::add_element`] and snapshot import, each in its own
//! transaction so that tag links and the denormalized domain/category
//! counts never drift from the element rows.

pub mod schema;
pub mod snapshot;
pub mod types;

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use tracing::{debug, info, warn};

use crate::error::{PromptError, Result};

pub use snapshot::{DomainSnapshot, LibraryMetadata, LibrarySnapshot};
pub use types::{
    Category, Domain, Element, ElementVariable, LibraryStats, SourcePrompt, VariableKind,
};

const ELEMENT_COLUMNS: &str = "e.element_id, e.domain_id, e.category_id, e.name, e.chinese_name, \
     e.ai_prompt_template, e.keywords, e.reusability_score, e.source_prompts, e.learned_from, \
     e.metadata";

const CLEAR_SQL: &str = r#"
    DELETE FROM element_tags;
    DELETE FROM element_variables;
    DELETE FROM elements;
    DELETE FROM tags;
    DELETE FROM categories;
    DELETE FROM source_prompts;
    UPDATE domains SET total_elements = 0, updated_at = datetime('now');
"#;

/// @acp:summary "Handle on one element library database"
/// @acp:lock normal
pub struct ElementStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ElementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementStore").field("path", &self.path).finish()
    }
}

impl ElementStore {
    /// Open an existing library. Fails with `StoreUnavailable` if the file is missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PromptError::StoreUnavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let conn = Connection::open(path)
            .map_err(|e| PromptError::StoreUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Create (or open) a library file, creating parent directories as needed
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        schema::run_migrations(&conn)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// @acp:summary "Insert one element with its tags and refresh counts"
    ///
    /// Duplicate ids fail with `DuplicateElement` and leave the library untouched.
    pub fn add_element(&mut self, element: &Element) -> Result<()> {
        validate_element(element)?;

        let tx = self.conn.transaction()?;
        insert_element(&tx, element)?;
        tx.commit()?;

        info!(
            element_id = %element.id,
            domain = %element.domain_id,
            category = %element.category_id,
            "Added element"
        );
        Ok(())
    }

    /// Register a domain that is not part of the seeded list
    pub fn ensure_domain(&self, id: &str, name: &str, description: &str) -> Result<()> {
        insert_domain(&self.conn, id, name, description)
    }

    /// Attach a parametric variable to an element
    pub fn add_variable(&mut self, element_id: &str, variable: &ElementVariable) -> Result<()> {
        let tx = self.conn.transaction()?;
        insert_variable(&tx, element_id, variable)?;
        tx.commit()?;
        debug!(element_id, variable = %variable.name, "Added element variable");
        Ok(())
    }

    /// Upsert a source text; repeated saves accumulate the extracted count
    pub fn save_source_prompt(&self, record: &SourcePrompt) -> Result<()> {
        upsert_source_prompt(&self.conn, record)
    }

    /// Remove every element, tag, variable and source text; domains stay
    pub fn clear_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(CLEAR_SQL)?;
        tx.commit()?;
        info!("Cleared element library");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get_element(&self, id: &str) -> Result<Option<Element>> {
        let sql = format!("SELECT {} FROM elements e WHERE e.element_id = ?1", ELEMENT_COLUMNS);
        let element = self
            .conn
            .query_row(&sql, params![id], read_element)
            .optional()?;
        match element {
            Some(mut element) => {
                element.tags = self.element_tags(&element.id)?;
                Ok(Some(element))
            }
            None => Ok(None),
        }
    }

    /// Elements of a domain, ordered by quality descending then insertion order
    pub fn search_by_domain(
        &self,
        domain_id: &str,
        category_id: Option<&str>,
        min_quality: Option<f64>,
        limit: Option<usize>,
    ) -> Result<Vec<Element>> {
        let mut sql = format!("SELECT {} FROM elements e WHERE e.domain_id = ?", ELEMENT_COLUMNS);
        let mut args: Vec<Value> = vec![Value::Text(domain_id.to_string())];

        if let Some(category) = category_id {
            sql.push_str(" AND e.category_id = ?");
            args.push(Value::Text(category.to_string()));
        }
        if let Some(min) = min_quality {
            sql.push_str(" AND e.reusability_score >= ?");
            args.push(Value::Real(min));
        }
        sql.push_str(" ORDER BY e.reusability_score DESC, e.rowid ASC");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(limit as i64));
        }

        self.query_elements(&sql, args)
    }

    /// Elements carrying any (or, with `match_all`, every) of the tags
    pub fn search_by_tags(&self, tags: &[&str], match_all: bool) -> Result<Vec<Element>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; tags.len()].join(", ");
        let mut sql = format!(
            "SELECT {} FROM elements e \
             JOIN element_tags et ON et.element_id = e.element_id \
             JOIN tags t ON t.tag_id = et.tag_id \
             WHERE t.tag_name IN ({}) \
             GROUP BY e.element_id",
            ELEMENT_COLUMNS, placeholders
        );
        let mut args: Vec<Value> = tags.iter().map(|t| Value::Text(t.to_string())).collect();
        if match_all {
            sql.push_str(" HAVING COUNT(DISTINCT t.tag_name) = ?");
            args.push(Value::Integer(tags.len() as i64));
        }
        sql.push_str(" ORDER BY e.reusability_score DESC, e.rowid ASC");

        self.query_elements(&sql, args)
    }

    /// Elements whose template contains any keyword, best quality first
    pub fn search_by_text(&self, keywords: &[String], limit: usize) -> Result<Vec<Element>> {
        let keywords: Vec<&String> = keywords.iter().filter(|k| !k.trim().is_empty()).collect();
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let conditions = vec!["e.ai_prompt_template LIKE ?"; keywords.len()].join(" OR ");
        let sql = format!(
            "SELECT {} FROM elements e WHERE ({}) \
             ORDER BY e.reusability_score DESC, e.rowid ASC LIMIT ?",
            ELEMENT_COLUMNS, conditions
        );
        let mut args: Vec<Value> = keywords
            .iter()
            .map(|k| Value::Text(format!("%{}%", k.trim())))
            .collect();
        args.push(Value::Integer(limit as i64));

        self.query_elements(&sql, args)
    }

    pub fn element_tags(&self, element_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.tag_name FROM tags t \
             JOIN element_tags et ON et.tag_id = t.tag_id \
             WHERE et.element_id = ?1 ORDER BY t.tag_name",
        )?;
        let tags = stmt
            .query_map(params![element_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Declared variables of one element, in declaration order
    pub fn variables(&self, element_id: &str) -> Result<Vec<ElementVariable>> {
        let mut stmt = self.conn.prepare(
            "SELECT parameter_name, parameter_type, possible_values, default_value, description \
             FROM element_variables WHERE element_id = ?1 ORDER BY variable_id",
        )?;
        let rows = stmt
            .query_map(params![element_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut variables = Vec::with_capacity(rows.len());
        for (name, kind, values, default_value, description) in rows {
            let kind = match kind.parse::<VariableKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(element_id, variable = %name, "Skipping variable: {}", e);
                    continue;
                }
            };
            variables.push(ElementVariable {
                name,
                kind,
                possible_values: decode_json_list(values.as_deref()),
                default_value,
                description,
            });
        }
        Ok(variables)
    }

    pub fn domains(&self) -> Result<Vec<Domain>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain_id, name, description, total_elements FROM domains ORDER BY rowid",
        )?;
        let domains = stmt
            .query_map([], |row| {
                Ok(Domain {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    total_elements: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(domains)
    }

    pub fn categories(&self, domain_id: &str) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT category_id, domain_id, name, total_elements FROM categories \
             WHERE domain_id = ?1 ORDER BY category_id",
        )?;
        let categories = stmt
            .query_map(params![domain_id], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    domain_id: row.get(1)?,
                    name: row.get(2)?,
                    total_elements: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn source_prompts(&self) -> Result<Vec<SourcePrompt>> {
        let mut stmt = self.conn.prepare(
            "SELECT prompt_id, original_prompt, theme, domain_classification, quality_score, \
             complexity, learning_status, extracted_elements_count \
             FROM source_prompts ORDER BY prompt_id",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(SourcePrompt {
                    prompt_id: row.get(0)?,
                    original_prompt: row.get(1)?,
                    theme: row.get(2)?,
                    domain_classification: row.get(3)?,
                    quality_score: row.get(4)?,
                    complexity: row.get(5)?,
                    learning_status: row.get(6)?,
                    extracted_elements_count: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// @acp:summary "Library totals, per-domain counts and the 20 most used tags"
    pub fn stats(&self) -> Result<LibraryStats> {
        let total_elements: u32 =
            self.conn
                .query_row("SELECT COUNT(*) FROM elements", [], |r| r.get(0))?;
        let total_tags: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT domain_id, total_elements FROM domains \
             ORDER BY total_elements DESC, rowid ASC",
        )?;
        let domains = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT tag_name, usage_count FROM tags \
             ORDER BY usage_count DESC, tag_name ASC LIMIT 20",
        )?;
        let top_tags = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(LibraryStats {
            total_elements,
            total_tags,
            domains,
            top_tags,
        })
    }

    fn query_elements(&self, sql: &str, args: Vec<Value>) -> Result<Vec<Element>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut elements = stmt
            .query_map(params_from_iter(args), read_element)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for element in &mut elements {
            element.tags = self.element_tags(&element.id)?;
        }
        Ok(elements)
    }
}

fn validate_element(element: &Element) -> Result<()> {
    if element.id.trim().is_empty() {
        return Err(PromptError::InvalidElement("element id is empty".to_string()));
    }
    if element.template.trim().is_empty() {
        return Err(PromptError::InvalidElement(format!(
            "{}: template text is empty",
            element.id
        )));
    }
    if !(0.0..=10.0).contains(&element.quality) {
        return Err(PromptError::InvalidElement(format!(
            "{}: quality {} outside [0, 10]",
            element.id, element.quality
        )));
    }
    Ok(())
}

fn insert_domain(conn: &Connection, id: &str, name: &str, description: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO domains (domain_id, name, description) VALUES (?1, ?2, ?3)",
        params![id, name, description],
    )?;
    Ok(())
}

fn upsert_source_prompt(conn: &Connection, record: &SourcePrompt) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO source_prompts (
            prompt_id, original_prompt, prompt_length, theme, domain_classification,
            quality_score, complexity, learning_status, extracted_elements_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(prompt_id) DO UPDATE SET
            learning_status = excluded.learning_status,
            extracted_elements_count =
                source_prompts.extracted_elements_count + excluded.extracted_elements_count
        "#,
        params![
            record.prompt_id,
            record.original_prompt,
            record.original_prompt.chars().count() as i64,
            record.theme,
            record.domain_classification,
            record.quality_score,
            record.complexity,
            record.learning_status,
            record.extracted_elements_count,
        ],
    )?;
    Ok(())
}

fn source_prompt_known(conn: &Connection, prompt_id: i64) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM source_prompts WHERE prompt_id = ?1",
            params![prompt_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Insert inside an open transaction; the caller commits
fn insert_element(tx: &Transaction<'_>, element: &Element) -> Result<()> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM elements WHERE element_id = ?1",
            params![element.id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if exists {
        return Err(PromptError::DuplicateElement(element.id.clone()));
    }

    let domain_known = tx
        .query_row(
            "SELECT 1 FROM domains WHERE domain_id = ?1",
            params![element.domain_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !domain_known {
        return Err(PromptError::InvalidElement(format!(
            "{}: unknown domain '{}'",
            element.id, element.domain_id
        )));
    }

    tx.execute(
        "INSERT OR IGNORE INTO categories (category_id, domain_id, name) VALUES (?1, ?2, ?3)",
        params![
            element.category_id,
            element.domain_id,
            schema::category_display_name(&element.category_id)
        ],
    )?;

    tx.execute(
        r#"
        INSERT INTO elements (
            element_id, domain_id, category_id, name, chinese_name, ai_prompt_template,
            keywords, reusability_score, source_prompts, learned_from, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            element.id,
            element.domain_id,
            element.category_id,
            element.name,
            element.display_name,
            element.template,
            serde_json::to_string(&element.keywords)?,
            element.quality,
            serde_json::to_string(&element.source_prompts)?,
            element.learned_from,
            element
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        ],
    )?;

    let mut seen: Vec<&str> = Vec::new();
    for tag in &element.tags {
        let tag = tag.trim();
        if tag.is_empty() || seen.contains(&tag) {
            continue;
        }
        seen.push(tag);
        tx.execute(
            "INSERT INTO tags (tag_name, usage_count) VALUES (?1, 1) \
             ON CONFLICT(tag_name) DO UPDATE SET usage_count = usage_count + 1",
            params![tag],
        )?;
        let tag_id: i64 = tx.query_row(
            "SELECT tag_id FROM tags WHERE tag_name = ?1",
            params![tag],
            |r| r.get(0),
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO element_tags (element_id, tag_id) VALUES (?1, ?2)",
            params![element.id, tag_id],
        )?;
    }

    tx.execute(
        "UPDATE domains SET total_elements = \
            (SELECT COUNT(*) FROM elements WHERE domain_id = ?1), updated_at = datetime('now') \
         WHERE domain_id = ?1",
        params![element.domain_id],
    )?;
    tx.execute(
        "UPDATE categories SET total_elements = \
            (SELECT COUNT(*) FROM elements WHERE domain_id = ?1 AND category_id = ?2) \
         WHERE domain_id = ?1 AND category_id = ?2",
        params![element.domain_id, element.category_id],
    )?;

    Ok(())
}

fn insert_variable(tx: &Transaction<'_>, element_id: &str, variable: &ElementVariable) -> Result<()> {
    let element_known = tx
        .query_row(
            "SELECT 1 FROM elements WHERE element_id = ?1",
            params![element_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !element_known {
        return Err(PromptError::InvalidElement(format!(
            "variable '{}' targets unknown element {}",
            variable.name, element_id
        )));
    }

    let declared = tx
        .query_row(
            "SELECT 1 FROM element_variables WHERE element_id = ?1 AND parameter_name = ?2",
            params![element_id, variable.name],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if declared {
        return Err(PromptError::InvalidElement(format!(
            "{}: variable '{}' already declared",
            element_id, variable.name
        )));
    }

    tx.execute(
        "INSERT INTO element_variables \
         (element_id, parameter_name, parameter_type, possible_values, default_value, description) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            element_id,
            variable.name,
            variable.kind.as_str(),
            serde_json::to_string(&variable.possible_values)?,
            variable.default_value,
            variable.description,
        ],
    )?;
    Ok(())
}

/// Row to element. JSON columns that fail to decode are treated as absent.
fn read_element(row: &Row<'_>) -> rusqlite::Result<Element> {
    let id: String = row.get(0)?;
    let keywords: Option<String> = row.get(6)?;
    let source_prompts: Option<String> = row.get(8)?;
    let metadata: Option<String> = row.get(10)?;

    Ok(Element {
        keywords: decode_json(&id, "keywords", keywords.as_deref()).unwrap_or_default(),
        source_prompts: decode_json(&id, "source_prompts", source_prompts.as_deref())
            .unwrap_or_default(),
        metadata: decode_json(&id, "metadata", metadata.as_deref()),
        domain_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        display_name: row.get(4)?,
        template: row.get(5)?,
        quality: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
        tags: Vec::new(),
        learned_from: row
            .get::<_, Option<String>>(9)?
            .unwrap_or_else(|| "manual".to_string()),
        id,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    element_id: &str,
    column: &str,
    raw: Option<&str>,
) -> Option<T> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(element_id, column, "Ignoring malformed JSON column: {}", e);
            None
        }
    }
}

fn decode_json_list(raw: Option<&str>) -> Vec<serde_json::Value> {
    raw.and_then(|r| serde_json::from_str(r).ok())
        .unwrap_or_default()
}
