//! @acp:module "Element Store Schema"
//! @acp:summary "Versioned SQLite schema and seeded domains"
//! @acp:domain store
//! @acp:layer data

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 2;

/// (id, display name, description)
pub const SEEDED_DOMAINS: &[(&str, &str, &str)] = &[
    ("portrait", "人像摄影", "Portrait photography: subject attributes, styling, expression"),
    ("interior", "室内设计", "Interior design: spaces, furniture, materials"),
    ("product", "产品摄影", "Product photography: setups, staging, lighting"),
    ("design", "平面设计", "Graphic design: layouts, visual styles, composition"),
    ("art", "艺术风格", "Art styles: rendering, media, special effects"),
    ("video", "视频生成", "Video generation: scenes, motion, camera work"),
    ("common", "通用元素", "Shared lighting, photography technique and quality terms"),
];

const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS domains (
    domain_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    total_elements INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT NOT NULL,
    domain_id TEXT NOT NULL REFERENCES domains(domain_id),
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    total_elements INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (domain_id, category_id)
);

CREATE TABLE IF NOT EXISTS elements (
    element_id TEXT PRIMARY KEY,
    domain_id TEXT NOT NULL REFERENCES domains(domain_id),
    category_id TEXT NOT NULL,
    name TEXT NOT NULL,
    chinese_name TEXT,
    ai_prompt_template TEXT NOT NULL CHECK (length(ai_prompt_template) > 0),
    keywords TEXT,
    reusability_score REAL NOT NULL DEFAULT 0 CHECK (reusability_score >= 0 AND reusability_score <= 10),
    source_prompts TEXT,
    learned_from TEXT NOT NULL DEFAULT 'manual',
    metadata TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_elements_domain_category
    ON elements(domain_id, category_id, reusability_score DESC);

CREATE TABLE IF NOT EXISTS tags (
    tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_name TEXT NOT NULL UNIQUE,
    tag_type TEXT,
    usage_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS element_tags (
    element_id TEXT NOT NULL REFERENCES elements(element_id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(tag_id),
    PRIMARY KEY (element_id, tag_id)
);

CREATE TABLE IF NOT EXISTS source_prompts (
    prompt_id INTEGER PRIMARY KEY,
    original_prompt TEXT NOT NULL,
    prompt_length INTEGER NOT NULL DEFAULT 0,
    theme TEXT,
    domain_classification TEXT,
    quality_score REAL,
    complexity TEXT,
    learning_status TEXT NOT NULL DEFAULT 'pending',
    extracted_elements_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const MIGRATION_V2: &str = r#"
CREATE TABLE IF NOT EXISTS element_variables (
    variable_id INTEGER PRIMARY KEY AUTOINCREMENT,
    element_id TEXT NOT NULL REFERENCES elements(element_id) ON DELETE CASCADE,
    parameter_name TEXT NOT NULL,
    parameter_type TEXT NOT NULL CHECK (parameter_type IN ('enum', 'range', 'boolean')),
    possible_values TEXT,
    default_value TEXT,
    description TEXT,
    UNIQUE (element_id, parameter_name)
);
"#;

/// Run all pending migrations and seed the fixed domain list
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    let current_version: i32 = conn
        .query_row("SELECT MAX(version) FROM _migrations", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0);

    if current_version < SCHEMA_VERSION {
        info!(
            current_version,
            target_version = SCHEMA_VERSION,
            "Running element store migrations"
        );
        for version in (current_version + 1)..=SCHEMA_VERSION {
            let (name, sql) = match version {
                1 => ("initial_schema", MIGRATION_V1),
                2 => ("element_variables", MIGRATION_V2),
                _ => continue,
            };
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
                params![version, name],
            )?;
        }
    }

    for (id, name, description) in SEEDED_DOMAINS {
        conn.execute(
            "INSERT OR IGNORE INTO domains (domain_id, name, description) VALUES (?1, ?2, ?3)",
            params![id, name, description],
        )?;
    }

    Ok(())
}

/// Display name derived from a category id: `eye_types` -> `Eye Types`
pub fn category_display_name(category_id: &str) -> String {
    category_id
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let domains: i64 = conn
            .query_row("SELECT COUNT(*) FROM domains", [], |r| r.get(0))
            .unwrap();
        assert_eq!(domains, SEEDED_DOMAINS.len() as i64);
    }

    #[test]
    fn test_category_display_name() {
        assert_eq!(category_display_name("eye_types"), "Eye Types");
        assert_eq!(category_display_name("poses"), "Poses");
    }
}
