//! Language, template and translation tables shipped alongside marker data.

use std::sync::Arc;

use rusqlite::{Row, params};
use seamark_core::{Language, Template, Translation};

use crate::database::Database;
use crate::error::StoreError;

const LANGUAGES: &str = "languages";
const TEMPLATES: &str = "templates";
const TRANSLATIONS: &str = "translations";

/// Supported interface languages.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    db: Arc<Database>,
}

impl LanguageTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every language ordered by code.
    pub fn all(&self) -> Result<Vec<Language>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached("SELECT code, name FROM languages ORDER BY code")
            .map_err(StoreError::sqlite(LANGUAGES, "prepare scan"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Language {
                    code: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(StoreError::sqlite(LANGUAGES, "scan rows"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(LANGUAGES, "decode rows"))
    }

    /// Insert or replace a language.
    pub fn write(&self, language: &Language) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO languages (code, name) VALUES (?1, ?2)",
                params![language.code, language.name],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(LANGUAGES, "write row"))
    }

    /// Remove the language with `code`.
    pub fn delete(&self, code: &str) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM languages WHERE code = ?1", [code])
            .map(|_| ())
            .map_err(StoreError::sqlite(LANGUAGES, "delete row"))
    }
}

/// Message templates.
#[derive(Debug, Clone)]
pub struct TemplateTable {
    db: Arc<Database>,
}

impl TemplateTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every template ordered by id.
    pub fn all(&self) -> Result<Vec<Template>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached("SELECT id, language, name, body FROM templates ORDER BY id")
            .map_err(StoreError::sqlite(TEMPLATES, "prepare scan"))?;
        let rows = stmt
            .query_map([], template_from_row)
            .map_err(StoreError::sqlite(TEMPLATES, "scan rows"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(TEMPLATES, "decode rows"))
    }

    /// Insert or replace a template.
    pub fn write(&self, template: &Template) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO templates (id, language, name, body) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![template.id, template.language, template.name, template.body],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(TEMPLATES, "write row"))
    }

    /// Remove the template with `id`.
    pub fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM templates WHERE id = ?1", [id])
            .map(|_| ())
            .map_err(StoreError::sqlite(TEMPLATES, "delete row"))
    }
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        language: row.get(1)?,
        name: row.get(2)?,
        body: row.get(3)?,
    })
}

/// Localised strings keyed by string key and language.
#[derive(Debug, Clone)]
pub struct TranslationTable {
    db: Arc<Database>,
}

impl TranslationTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every translation ordered by key then language.
    pub fn all(&self) -> Result<Vec<Translation>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT string_key, language, text FROM translations \
                 ORDER BY string_key, language",
            )
            .map_err(StoreError::sqlite(TRANSLATIONS, "prepare scan"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Translation {
                    key: row.get(0)?,
                    language: row.get(1)?,
                    text: row.get(2)?,
                })
            })
            .map_err(StoreError::sqlite(TRANSLATIONS, "scan rows"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(TRANSLATIONS, "decode rows"))
    }

    /// Insert or replace a translation.
    pub fn write(&self, translation: &Translation) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO translations (string_key, language, text) \
                 VALUES (?1, ?2, ?3)",
                params![translation.key, translation.language, translation.text],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(TRANSLATIONS, "write row"))
    }

    /// Remove the translation of `key` into `language`.
    pub fn delete(&self, key: &str, language: &str) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "DELETE FROM translations WHERE string_key = ?1 AND language = ?2",
                [key, language],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(TRANSLATIONS, "delete row"))
    }
}
