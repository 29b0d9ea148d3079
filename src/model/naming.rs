use super::IndexKind;

/// Entity kinds that have a deterministic default name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConventionKind {
    Primary,
    Unique,
    Index,
    Foreign,
}

impl From<IndexKind> for ConventionKind {
    fn from(kind: IndexKind) -> Self {
        match kind {
            IndexKind::Primary => ConventionKind::Primary,
            IndexKind::Unique => ConventionKind::Unique,
            IndexKind::Index => ConventionKind::Index,
        }
    }
}

/// Name the database or the migration framework assigns when none is given.
///
/// Primary keys are always `PRIMARY`. Everything else is `{table}_{columns}_{kind}`, lower-cased,
/// with `-` and `.` replaced by `_`.
pub fn convention_name(table: &str, columns: &[String], kind: ConventionKind) -> String {
    let suffix = match kind {
        ConventionKind::Primary => return "PRIMARY".to_string(),
        ConventionKind::Unique => "unique",
        ConventionKind::Index => "index",
        ConventionKind::Foreign => "foreign",
    };

    format!("{}_{}_{}", table, columns.join("_"), suffix)
        .to_lowercase()
        .replace(['-', '.'], "_")
}
