use hashbrown::HashMap;
use rkyv::{Archive, Serialize as RkyvSerialize, Deserialize as RkyvDeserialize};
use rkyv::with::Skip;
use smallvec::{SmallVec, smallvec};
use crate::row_shred::split_cells;

/// Ordered column names of a delimited file.
///
/// Established once per file, either captured from the first line or supplied by a caller that
/// decodes rows outside the engine lifecycle. Column names are kept exactly as written: blank
/// names and duplicates are both allowed, and a duplicated name collects every value assigned to
/// it when a row is decoded.
///
/// # Limitations
///
/// * Names are not trimmed or case-folded, so `"id"` and `" id"` are different columns
/// * Quoted header cells are not unquoted
#[derive(Debug, Default, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
pub struct Header {
    pub names: Vec<String>,
    #[rkyv(with = Skip)]
    lookup: HashMap<String, SmallVec<[u32; 1]>>, // name -> positions (rebuilt after deserialization)
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for Header {}

impl Header {
    /// Creates a header from already split column names.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rowseek::utils::header::Header;
    /// let header = Header::new(vec!["id".to_string(), "name".to_string()]);
    /// assert_eq!(header.len(), 2);
    /// assert_eq!(header.position("name"), Some(1));
    /// ```
    pub fn new(names: Vec<String>) -> Self {
        let mut header = Self {
            names,
            lookup: HashMap::new(),
        };
        header.rebuild_lookup();
        header
    }

    /// Splits a raw header line on `delimiter`.
    ///
    /// ```
    /// # use rowseek::utils::header::Header;
    /// let header = Header::from_line("a,b,a", ',');
    /// assert_eq!(header.len(), 3);
    /// assert!(header.is_duplicated("a"));
    /// ```
    pub fn from_line(line: &str, delimiter: char) -> Self {
        Self::new(split_cells(line, delimiter).into_iter().map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    /// First position of `name`, or `None` if the header has no such column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).and_then(|p| p.first()).map(|&p| p as usize)
    }

    /// Whether `name` appears more than once in the header.
    pub fn is_duplicated(&self, name: &str) -> bool {
        self.lookup.get(name).is_some_and(|p| p.len() > 1)
    }

    /// Rebuilds the name lookup from `names`.
    ///
    /// The lookup is skipped by rkyv, so this must be called after a `Header` is deserialized
    /// from a persisted index.
    pub fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        for (idx, name) in self.names.iter().enumerate() {
            self.lookup
                .entry(name.clone())
                .and_modify(|positions| positions.push(idx as u32))
                .or_insert_with(|| smallvec![idx as u32]);
        }
    }
}
