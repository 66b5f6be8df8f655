//! Alias Resolver

use std::collections::HashMap;

/// Logical field name → ordered physical column name variants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    entries: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the variants for a logical field (replaces earlier ones)
    pub fn insert(&mut self, logical: impl Into<String>, variants: Vec<String>) {
        self.entries.insert(logical.into(), variants);
    }

    pub fn aliases(&self, logical: &str) -> &[String] {
        self.entries.get(logical).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L, V> FromIterator<(L, Vec<V>)> for AliasTable
where
    L: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, Vec<V>)>>(iter: I) -> Self {
        let mut table = AliasTable::new();
        for (logical, variants) in iter {
            table.insert(logical, variants.into_iter().map(Into::into).collect());
        }
        table
    }
}

/// Find the physical column carrying `logical` among `present` columns.
///
/// The logical name itself wins when present verbatim; otherwise the first
/// alias (in declared order) that is present; otherwise `None`.
pub fn resolve_column<'a, S: AsRef<str>>(
    present: &'a [S],
    logical: &str,
    aliases: &AliasTable,
) -> Option<&'a str> {
    let find = |name: &str| {
        present
            .iter()
            .map(|c| c.as_ref())
            .find(|column| *column == name)
    };

    find(logical).or_else(|| {
        aliases
            .aliases(logical)
            .iter()
            .find_map(|alias| find(alias))
    })
}
