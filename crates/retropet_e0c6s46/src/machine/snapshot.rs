use std::collections::BTreeMap;

/// Schema version written under [`Snapshot::VERSION_KEY`]. Bumped when
/// keys are added; keys are never removed or repurposed.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A single snapshot field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SnapshotValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F64(f64),
    Bytes(Vec<u8>),
}

impl SnapshotValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SnapshotValue::Bool(_) => "bool",
            SnapshotValue::U8(_) => "u8",
            SnapshotValue::U16(_) => "u16",
            SnapshotValue::U32(_) => "u32",
            SnapshotValue::U64(_) => "u64",
            SnapshotValue::F64(_) => "f64",
            SnapshotValue::Bytes(_) => "bytes",
        }
    }
}

/// Machine state as a sparse, sorted key/value map.
///
/// Restoring only applies keys that are present, so snapshots written by
/// older versions (with fewer keys) stay loadable.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    entries: BTreeMap<String, SnapshotValue>,
}

impl Snapshot {
    pub const VERSION_KEY: &'static str = "version";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Option<u32> {
        match self.entries.get(Self::VERSION_KEY) {
            Some(SnapshotValue::U32(version)) => Some(*version),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SnapshotValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SnapshotValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn put_bool(&mut self, key: &str, value: bool) {
        self.insert(key, SnapshotValue::Bool(value));
    }

    pub(crate) fn put_u8(&mut self, key: &str, value: u8) {
        self.insert(key, SnapshotValue::U8(value));
    }

    pub(crate) fn put_u16(&mut self, key: &str, value: u16) {
        self.insert(key, SnapshotValue::U16(value));
    }

    pub(crate) fn put_u32(&mut self, key: &str, value: u32) {
        self.insert(key, SnapshotValue::U32(value));
    }

    pub(crate) fn put_u64(&mut self, key: &str, value: u64) {
        self.insert(key, SnapshotValue::U64(value));
    }

    pub(crate) fn put_f64(&mut self, key: &str, value: f64) {
        self.insert(key, SnapshotValue::F64(value));
    }

    pub(crate) fn put_bytes(&mut self, key: &str, value: Vec<u8>) {
        self.insert(key, SnapshotValue::Bytes(value));
    }
}

/// Typed lookups used by restore. A missing key yields `None` silently; a
/// key holding the wrong type is logged and also yields `None`.
impl Snapshot {
    fn mismatch(key: &str, expected: &str, found: &SnapshotValue) {
        log::warn!(
            "snapshot key '{}': expected {}, found {}; keeping default",
            key,
            expected,
            found.type_name()
        );
    }

    pub(crate) fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            SnapshotValue::Bool(v) => Some(*v),
            other => {
                Self::mismatch(key, "bool", other);
                None
            }
        }
    }

    pub(crate) fn u8(&self, key: &str) -> Option<u8> {
        match self.get(key)? {
            SnapshotValue::U8(v) => Some(*v),
            other => {
                Self::mismatch(key, "u8", other);
                None
            }
        }
    }

    pub(crate) fn u16(&self, key: &str) -> Option<u16> {
        match self.get(key)? {
            SnapshotValue::U16(v) => Some(*v),
            other => {
                Self::mismatch(key, "u16", other);
                None
            }
        }
    }

    pub(crate) fn u32(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            SnapshotValue::U32(v) => Some(*v),
            other => {
                Self::mismatch(key, "u32", other);
                None
            }
        }
    }

    pub(crate) fn u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            SnapshotValue::U64(v) => Some(*v),
            other => {
                Self::mismatch(key, "u64", other);
                None
            }
        }
    }

    pub(crate) fn f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            SnapshotValue::F64(v) => Some(*v),
            other => {
                Self::mismatch(key, "f64", other);
                None
            }
        }
    }

    pub(crate) fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.get(key)? {
            SnapshotValue::Bytes(v) => Some(v.as_slice()),
            other => {
                Self::mismatch(key, "bytes", other);
                None
            }
        }
    }
}

/// Pack nibbles two per byte, low nibble first.
pub(crate) fn pack_nibbles(nibbles: &[u8]) -> Vec<u8> {
    nibbles
        .chunks(2)
        .map(|pair| {
            let low = pair[0] & 0xF;
            let high = pair.get(1).copied().unwrap_or(0) & 0xF;
            low | (high << 4)
        })
        .collect()
}

/// Inverse of [`pack_nibbles`]. Extra input is ignored; missing input
/// leaves the tail of `out` untouched.
pub(crate) fn unpack_nibbles(packed: &[u8], out: &mut [u8]) {
    for (i, byte) in packed.iter().enumerate() {
        if let Some(slot) = out.get_mut(2 * i) {
            *slot = byte & 0xF;
        }
        if let Some(slot) = out.get_mut(2 * i + 1) {
            *slot = byte >> 4;
        }
    }
}
