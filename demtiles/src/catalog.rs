//! Registry of archive sets and the quadkeys of their archives.
//!
//! Each archive covers exactly the region of one quadkey. Within a set the
//! regions must be disjoint, so that at most one archive covers any tile; this
//! is checked when a set is built.
//!
//! # Catalog file format
//!
//! ```json
//! {
//!   "archive_sets": {
//!     "Taranaki2021": [[11, 2012, 1267], "31133231132"]
//!   }
//! }
//! ```
//!
//! Entries are either `[z, x, y]` triples or quadkey strings.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};
use crate::quadkey::{QuadKey, TileCoord};

const BUILTIN_CATALOG: &str = include_str!("../catalogs/builtin.json");

/// Validated archive set name.
///
/// Names are non-empty and contain no whitespace, `/`, `#` or `@`, the
/// separators of tile-source URLs and storage paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchiveSetName(String);

impl ArchiveSetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ArchiveSetName {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && !s
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '/' | '#' | '@'));
        if !valid {
            return Err(TileError::InvalidCatalog(format!(
                "invalid archive set name '{s}'"
            )));
        }
        Ok(ArchiveSetName(s.to_string()))
    }
}

impl TryFrom<String> for ArchiveSetName {
    type Error = TileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ArchiveSetName> for String {
    fn from(name: ArchiveSetName) -> Self {
        name.0
    }
}

impl Borrow<str> for ArchiveSetName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage path of an archive: `<set>/<z>-<x>-<y>.tiff`.
pub fn archive_path(set: &ArchiveSetName, archive: &QuadKey) -> String {
    format!("{}/{}.tiff", set, archive.to_path_key())
}

/// The archives making up one archive set.
#[derive(Debug, Clone)]
pub struct ArchiveSet {
    name: ArchiveSetName,
    /// Quadkeys in catalog order.
    quadkeys: Vec<QuadKey>,
    /// Same quadkeys, sorted for prefix search.
    sorted: Vec<QuadKey>,
}

impl ArchiveSet {
    /// Build an archive set, checking that no archive region contains another.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidCatalog`] on duplicate or nested quadkeys.
    pub fn new(name: ArchiveSetName, quadkeys: Vec<QuadKey>) -> Result<Self> {
        let mut sorted = quadkeys.clone();
        sorted.sort();

        // A nested pair always shows up as a nested adjacent pair once sorted
        for pair in sorted.windows(2) {
            if pair[0].covers(&pair[1]) {
                return Err(TileError::InvalidCatalog(format!(
                    "archive set {name}: archive {} overlaps archive {}",
                    pair[0].to_path_key(),
                    pair[1].to_path_key()
                )));
            }
        }

        Ok(Self {
            name,
            quadkeys,
            sorted,
        })
    }

    pub fn name(&self) -> &ArchiveSetName {
        &self.name
    }

    /// Quadkeys of the set's archives, in catalog order.
    pub fn quadkeys(&self) -> &[QuadKey] {
        &self.quadkeys
    }

    pub fn len(&self) -> usize {
        self.quadkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quadkeys.is_empty()
    }

    /// Find the archive whose region contains `target`.
    ///
    /// Any covering key is a prefix of `target` and therefore sorts at or
    /// before it; with disjoint keys it is the greatest key `<= target`.
    pub fn find_covering(&self, target: &QuadKey) -> Option<&QuadKey> {
        let idx = self.sorted.partition_point(|qk| qk <= target);
        let candidate = self.sorted[..idx].last()?;
        candidate.covers(target).then_some(candidate)
    }

    /// Storage path for one of this set's archives.
    pub fn archive_path(&self, archive: &QuadKey) -> String {
        archive_path(&self.name, archive)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogEntry {
    QuadKey(QuadKey),
    Tile(u8, u32, u32),
}

#[derive(Deserialize)]
struct CatalogFile {
    archive_sets: BTreeMap<ArchiveSetName, Vec<CatalogEntry>>,
}

/// Immutable mapping from archive set name to its archives.
#[derive(Debug, Clone, Default)]
pub struct ArchiveCatalog {
    sets: BTreeMap<ArchiveSetName, ArchiveSet>,
}

impl ArchiveCatalog {
    /// Build a catalog from archive sets.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidCatalog`] if two sets share a name.
    pub fn new(sets: impl IntoIterator<Item = ArchiveSet>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for set in sets {
            let name = set.name.clone();
            if map.insert(name.clone(), set).is_some() {
                return Err(TileError::InvalidCatalog(format!(
                    "duplicate archive set {name}"
                )));
            }
        }
        Ok(Self { sets: map })
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| TileError::InvalidCatalog(e.to_string()))?;

        let mut sets = Vec::with_capacity(file.archive_sets.len());
        for (name, entries) in file.archive_sets {
            let quadkeys = entries
                .into_iter()
                .map(|entry| match entry {
                    CatalogEntry::QuadKey(qk) => Ok(qk),
                    CatalogEntry::Tile(z, x, y) => QuadKey::from_zxy(z, x, y),
                })
                .collect::<Result<Vec<_>>>()?;
            sets.push(ArchiveSet::new(name, quadkeys)?);
        }

        let catalog = Self::new(sets)?;
        tracing::debug!(
            sets = catalog.len(),
            archives = catalog.sets().map(ArchiveSet::len).sum::<usize>(),
            "Loaded archive catalog"
        );
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Reading archive catalog");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The catalog compiled into the library (`Taranaki2021`).
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_CATALOG).expect("built-in catalog is valid")
    }

    /// Look up an archive set by name.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::UnknownArchiveSet`] if no set has that name.
    pub fn lookup(&self, name: &str) -> Result<&ArchiveSet> {
        self.sets
            .get(name)
            .ok_or_else(|| TileError::UnknownArchiveSet {
                name: name.to_string(),
            })
    }

    /// Find the archive of `name` covering `tile`.
    pub fn find_covering(&self, name: &str, tile: TileCoord) -> Result<(&ArchiveSet, &QuadKey)> {
        let set = self.lookup(name)?;
        let target = QuadKey::from_tile(tile);
        set.find_covering(&target)
            .map(|qk| (set, qk))
            .ok_or_else(|| TileError::NoCoveringArchive {
                archive_set: name.to_string(),
                tile,
            })
    }

    pub fn sets(&self) -> impl Iterator<Item = &ArchiveSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn qk(z: u8, x: u32, y: u32) -> QuadKey {
        QuadKey::from_zxy(z, x, y).unwrap()
    }

    fn name(s: &str) -> ArchiveSetName {
        s.parse().unwrap()
    }

    #[test]
    fn test_set_name_validation() {
        assert!("Taranaki2021".parse::<ArchiveSetName>().is_ok());
        assert!("".parse::<ArchiveSetName>().is_err());
        assert!("a#b".parse::<ArchiveSetName>().is_err());
        assert!("a b".parse::<ArchiveSetName>().is_err());
        assert!("a/b".parse::<ArchiveSetName>().is_err());
    }

    #[test]
    fn test_rejects_overlapping_archives() {
        let err = ArchiveSet::new(name("s"), vec![qk(11, 2012, 1267), qk(12, 4025, 2535)])
            .unwrap_err();
        assert!(matches!(err, TileError::InvalidCatalog(_)));

        let dup = ArchiveSet::new(name("s"), vec![qk(11, 2012, 1267), qk(11, 2012, 1267)]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_find_covering() {
        let set = ArchiveSet::new(
            name("s"),
            vec![qk(11, 2014, 1267), qk(11, 2012, 1267), qk(13, 8051, 5065)],
        )
        .unwrap();

        // Deeper tile inside an archive
        let target = qk(15, 2014 * 16 + 9, 1267 * 16 + 3);
        assert_eq!(set.find_covering(&target), Some(&qk(11, 2014, 1267)));

        // Exact archive root
        assert_eq!(
            set.find_covering(&qk(13, 8051, 5065)),
            Some(&qk(13, 8051, 5065))
        );

        // Parent of an archive is not covered
        assert_eq!(set.find_covering(&qk(10, 1007, 633)), None);

        // Sibling that sorts right after a key
        assert_eq!(set.find_covering(&qk(11, 2013, 1267)), None);
        assert_eq!(set.find_covering(&qk(0, 0, 0)), None);
    }

    #[test]
    fn test_find_covering_matches_linear_scan() {
        let catalog = ArchiveCatalog::builtin();
        let set = catalog.lookup("Taranaki2021").unwrap();

        for x in 8040..8090u32 {
            for y in 5055..5090u32 {
                let target = qk(13, x, y);
                let linear = set.quadkeys().iter().find(|a| a.covers(&target));
                assert_eq!(set.find_covering(&target), linear);
            }
        }
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = ArchiveCatalog::builtin();
        let set = catalog.lookup("Taranaki2021").unwrap();
        assert_eq!(set.len(), 63);
        assert_eq!(set.quadkeys()[0], qk(11, 2012, 1267));
        assert!(matches!(
            catalog.lookup("Nope"),
            Err(TileError::UnknownArchiveSet { .. })
        ));
    }

    #[test]
    fn test_catalog_find_covering_errors() {
        let catalog = ArchiveCatalog::builtin();
        let outside = TileCoord::new(11, 0, 0).unwrap();
        assert!(matches!(
            catalog.find_covering("Taranaki2021", outside),
            Err(TileError::NoCoveringArchive { .. })
        ));

        let inside = TileCoord::new(12, 4028, 2534).unwrap();
        let (set, archive) = catalog.find_covering("Taranaki2021", inside).unwrap();
        assert_eq!(archive, &qk(11, 2014, 1267));
        assert_eq!(set.archive_path(archive), "Taranaki2021/11-2014-1267.tiff");
    }

    #[test]
    fn test_from_json_mixed_entries() {
        let json = r#"{"archive_sets": {"A": [[1, 0, 0], "10"], "B": ["3"]}}"#;
        let catalog = ArchiveCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let a = catalog.lookup("A").unwrap();
        assert_eq!(a.quadkeys(), &[qk(1, 0, 0), qk(2, 2, 0)]);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(ArchiveCatalog::from_json_str("{").is_err());
        // Overlapping
        assert!(ArchiveCatalog::from_json_str(r#"{"archive_sets": {"A": ["1", "12"]}}"#).is_err());
        // Out-of-range tile
        assert!(ArchiveCatalog::from_json_str(r#"{"archive_sets": {"A": [[1, 2, 0]]}}"#).is_err());
        // Bad name
        assert!(ArchiveCatalog::from_json_str(r#"{"archive_sets": {"A@B": ["1"]}}"#).is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"archive_sets": {"Test": [[2, 1, 1]]}}"#)
            .unwrap();

        let catalog = ArchiveCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.lookup("Test").unwrap().len(), 1);

        assert!(matches!(
            ArchiveCatalog::from_path("/nonexistent/catalog.json"),
            Err(TileError::Io(_))
        ));
    }
}
