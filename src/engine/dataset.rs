use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use super::error::{EngineError, EngineResult, LoadError};

/// Minimum rating for a record to count as "liked" (5-point scale)
pub const LIKED_THRESHOLD: f64 = 4.0;

const RATINGS_FILE: &str = "ratings.csv";
const ITEMS_FILE: &str = "movies.csv";
const NO_GENRES: &str = "(no genres listed)";

/// Locations of the two tabular sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub ratings: PathBuf,
    pub items: PathBuf,
}

impl DatasetPaths {
    pub fn new(ratings: impl Into<PathBuf>, items: impl Into<PathBuf>) -> Self {
        Self {
            ratings: ratings.into(),
            items: items.into(),
        }
    }

    /// Resolves `ratings.csv` and `movies.csv` inside a MovieLens-layout directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(RATINGS_FILE), dir.join(ITEMS_FILE))
    }

    pub fn load(&self) -> Result<(CleanedRatings, ItemCatalog), LoadError> {
        load(&self.ratings, &self.items)
    }
}

/// One row of the ratings source. Identifiers are the raw, sparse ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingRecord {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub item_id: i64,
    pub rating: f64,
    /// Unix seconds
    pub timestamp: i64,
}

impl RatingRecord {
    pub fn new(user_id: i64, item_id: i64, rating: f64, timestamp: i64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp,
        }
    }

    pub fn rated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    pub fn is_liked(&self) -> bool {
        self.rating >= LIKED_THRESHOLD
    }
}

/// A liked rating annotated with its dense user and item indices
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRating {
    pub record: RatingRecord,
    pub dense_user: usize,
    pub dense_item: usize,
}

/// Assigns contiguous indices to raw identifiers in order of first appearance
#[derive(Debug, Clone, Default, PartialEq)]
struct DenseIndex {
    to_dense: HashMap<i64, usize>,
    to_raw: Vec<i64>,
}

impl DenseIndex {
    fn assign(&mut self, raw: i64) -> usize {
        let next = self.to_raw.len();
        let dense = *self.to_dense.entry(raw).or_insert(next);
        if dense == next {
            self.to_raw.push(raw);
        }
        dense
    }

    fn dense(&self, raw: i64) -> Option<usize> {
        self.to_dense.get(&raw).copied()
    }

    fn raw(&self, dense: usize) -> Option<i64> {
        self.to_raw.get(dense).copied()
    }

    fn len(&self) -> usize {
        self.to_raw.len()
    }
}

/// The cleaned rating table: liked ratings only, addressed by dense index.
///
/// Tables produced by [`CleanedRatings::from_records`] satisfy the dense
/// invariant: the item indices used by the rows are exactly `0..nb_items()`,
/// and likewise for users. Tables produced by [`CleanedRatings::subset`] keep
/// the index space of their parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedRatings {
    rows: Vec<CleanedRating>,
    users: DenseIndex,
    items: DenseIndex,
}

impl CleanedRatings {
    /// Filters out ratings below [`LIKED_THRESHOLD`] and assigns dense indices
    pub fn from_records(records: impl IntoIterator<Item = RatingRecord>) -> Self {
        let mut table = Self::default();
        for record in records.into_iter().filter(RatingRecord::is_liked) {
            let dense_user = table.users.assign(record.user_id);
            let dense_item = table.items.assign(record.item_id);
            table.rows.push(CleanedRating {
                record,
                dense_user,
                dense_item,
            });
        }
        table
    }

    /// Keeps the rows matching `keep` while preserving the index space
    pub fn subset(&self, mut keep: impl FnMut(&CleanedRating) -> bool) -> Self {
        Self {
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
            users: self.users.clone(),
            items: self.items.clone(),
        }
    }

    pub fn rows(&self) -> &[CleanedRating] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn nb_users(&self) -> usize {
        self.users.len()
    }

    pub fn nb_items(&self) -> usize {
        self.items.len()
    }

    /// Dense index of a raw item identifier
    pub fn item_index(&self, raw_item: i64) -> EngineResult<usize> {
        self.items
            .dense(raw_item)
            .ok_or(EngineError::ItemUnmapped(raw_item))
    }

    pub fn raw_item(&self, dense_item: usize) -> Option<i64> {
        self.items.raw(dense_item)
    }

    /// Dense item indices liked by each dense user, in row order
    pub fn liked_by_user(&self) -> Vec<Vec<usize>> {
        let mut liked = vec![Vec::new(); self.nb_users()];
        for row in &self.rows {
            liked[row.dense_user].push(row.dense_item);
        }
        liked
    }
}

/// Raw row of the items source
#[derive(Debug, Deserialize)]
struct ItemRow {
    #[serde(rename = "movieId")]
    item_id: i64,
    title: String,
    #[serde(default)]
    genres: String,
}

/// Static metadata for one item of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
}

impl CatalogItem {
    pub fn new(item_id: i64, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            item_id,
            year: parse_year(&title),
            title,
            genres: Vec::new(),
        }
    }
}

impl From<ItemRow> for CatalogItem {
    fn from(row: ItemRow) -> Self {
        let genres = row
            .genres
            .split('|')
            .map(str::trim)
            .filter(|g| !g.is_empty() && *g != NO_GENRES)
            .map(str::to_string)
            .collect();

        Self {
            genres,
            ..CatalogItem::new(row.item_id, row.title)
        }
    }
}

/// Extracts the release year from a MovieLens title such as `"Heat (1995)"`
fn parse_year(title: &str) -> Option<i32> {
    let inner = title.trim_end().strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let year = inner[open + 1..].trim();
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        year.parse().ok()
    } else {
        None
    }
}

/// Item catalog keyed by raw item identifier, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCatalog {
    items: Vec<CatalogItem>,
    by_id: HashMap<i64, usize>,
}

impl ItemCatalog {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            by_id.entry(item.item_id).or_insert(position);
        }
        Self { items, by_id }
    }

    /// Placeholder titles shown when no items source is available
    pub fn fallback() -> Self {
        Self::from_items(vec![
            CatalogItem::new(1, "The Shawshank Redemption"),
            CatalogItem::new(2, "The Godfather"),
            CatalogItem::new(3, "The Dark Knight"),
        ])
    }

    pub fn get(&self, item_id: i64) -> Option<&CatalogItem> {
        self.by_id.get(&item_id).map(|&position| &self.items[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Reads both sources, keeps liked ratings and re-indexes them densely.
///
/// Both sources are opened before either is parsed, so a missing items file
/// fails the load even when the ratings file is fine.
pub fn load(
    ratings_path: &Path,
    items_path: &Path,
) -> Result<(CleanedRatings, ItemCatalog), LoadError> {
    let ratings_reader = open(ratings_path)?;
    let items_reader = open(items_path)?;

    let records: Vec<RatingRecord> = read_rows(ratings_reader, ratings_path)?;
    let total = records.len();
    let ratings = CleanedRatings::from_records(records);

    let item_rows: Vec<ItemRow> = read_rows(items_reader, items_path)?;
    let catalog = ItemCatalog::from_items(item_rows.into_iter().map(CatalogItem::from).collect());

    tracing::info!(
        ratings = total,
        liked = ratings.len(),
        users = ratings.nb_users(),
        items = ratings.nb_items(),
        catalog = catalog.len(),
        "Dataset loaded"
    );

    Ok((ratings, catalog))
}

/// Reads only the items source
pub fn load_catalog(items_path: &Path) -> Result<ItemCatalog, LoadError> {
    let rows: Vec<ItemRow> = read_rows(open(items_path)?, items_path)?;
    Ok(ItemCatalog::from_items(
        rows.into_iter().map(CatalogItem::from).collect(),
    ))
}

fn open(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    match File::open(path) {
        Ok(file) => Ok(csv::Reader::from_reader(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(LoadError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(LoadError::Malformed {
            path: path.to_path_buf(),
            source: e.into(),
        }),
    }
}

fn read_rows<T: DeserializeOwned, R: io::Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<Vec<T>, LoadError> {
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}
