//! Environment sanitisation for the Launcher (spec §4.1 step 5).
//!
//! The table file lists one entry per line: a bare name copies the
//! inherited value through unchanged; a `NAME=value` line is a literal
//! override. A missing table defaults to permitting only `PATH`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{io_err, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvEntry {
    /// Copy the named variable through from the inherited environment, if
    /// present there.
    Inherited(String),
    /// Set the variable to this literal value regardless of what the
    /// inherited environment contains.
    Literal(String, String),
}

/// Parse an environment table file. A missing file is not an error: it is
/// treated as the default table, permitting only `PATH`.
pub fn load_table(path: &Path) -> CoreResult<Vec<EnvEntry>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(vec![EnvEntry::Inherited("PATH".to_string())]);
        }
        Err(e) => return Err(io_err(path, e)),
    };
    Ok(parse_table(&contents))
}

fn parse_table(contents: &str) -> Vec<EnvEntry> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('=') {
            Some((name, value)) => EnvEntry::Literal(name.to_string(), value.to_string()),
            None => EnvEntry::Inherited(line.to_string()),
        })
        .collect()
}

/// Clear the process environment entirely and repopulate it from `table`,
/// copying inherited values for plain-name entries and applying literal
/// overrides verbatim.
///
/// # Safety
///
/// Mutating the process environment is inherently racy with respect to
/// other threads reading it; this must be called before any other thread
/// is spawned, which holds for every tier (it runs at the very start of
/// `main`).
pub unsafe fn sanitise(table: &[EnvEntry]) {
    let inherited: HashMap<String, String> = std::env::vars().collect();
    let resolved = resolve(table, &inherited);

    for (key, _) in std::env::vars() {
        std::env::remove_var(key);
    }
    for (key, value) in resolved {
        std::env::set_var(key, value);
    }
}

fn resolve(table: &[EnvEntry], inherited: &HashMap<String, String>) -> Vec<(String, String)> {
    table
        .iter()
        .filter_map(|entry| match entry {
            EnvEntry::Inherited(name) => inherited.get(name).map(|v| (name.clone(), v.clone())),
            EnvEntry::Literal(name, value) => Some((name.clone(), value.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_permits_only_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("environtab");
        let table = load_table(&path).unwrap();
        assert_eq!(table, vec![EnvEntry::Inherited("PATH".to_string())]);
    }

    #[test]
    fn parses_plain_names_and_literal_overrides() {
        let table = parse_table("PATH\nHOME\nFOO=bar\n\n  TERM  \n");
        assert_eq!(
            table,
            vec![
                EnvEntry::Inherited("PATH".to_string()),
                EnvEntry::Inherited("HOME".to_string()),
                EnvEntry::Literal("FOO".to_string(), "bar".to_string()),
                EnvEntry::Inherited("TERM".to_string()),
            ]
        );
    }

    #[test]
    fn resolve_drops_inherited_names_absent_from_the_environment() {
        let table = vec![
            EnvEntry::Inherited("PRESENT".to_string()),
            EnvEntry::Inherited("ABSENT".to_string()),
            EnvEntry::Literal("SET".to_string(), "1".to_string()),
        ];
        let mut inherited = HashMap::new();
        inherited.insert("PRESENT".to_string(), "yes".to_string());

        let mut resolved = resolve(&table, &inherited);
        resolved.sort();
        assert_eq!(
            resolved,
            vec![
                ("PRESENT".to_string(), "yes".to_string()),
                ("SET".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn literal_override_wins_even_when_name_also_present_in_environment() {
        let table = vec![EnvEntry::Literal("PATH".to_string(), "/custom".to_string())];
        let mut inherited = HashMap::new();
        inherited.insert("PATH".to_string(), "/usr/bin".to_string());

        let resolved = resolve(&table, &inherited);
        assert_eq!(resolved, vec![("PATH".to_string(), "/custom".to_string())]);
    }
}
