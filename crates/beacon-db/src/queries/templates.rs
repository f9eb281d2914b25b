//! Template registry queries.

use beacon_types::record::Template;
use beacon_types::TemplateId;
use rusqlite::Connection;

use crate::Result;

/// A raw template row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRow {
    pub template_id: Vec<u8>,
    pub reporter: Vec<u8>,
    pub endpoint_id: Vec<u8>,
    pub parameters: Vec<u8>,
}

/// Insert or overwrite a template.
pub fn upsert(conn: &Connection, template_id: &TemplateId, template: &Template) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO templates (template_id, reporter, endpoint_id, parameters)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            template_id.as_slice(),
            template.reporter.as_slice(),
            template.endpoint_id.as_slice(),
            template.parameters.as_slice(),
        ],
    )?;
    Ok(())
}

/// List every registered template.
pub fn list(conn: &Connection) -> Result<Vec<TemplateRow>> {
    let mut stmt =
        conn.prepare("SELECT template_id, reporter, endpoint_id, parameters FROM templates")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TemplateRow {
                template_id: row.get(0)?,
                reporter: row.get(1)?,
                endpoint_id: row.get(2)?,
                parameters: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
