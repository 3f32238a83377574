use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use unfold_core::store::{KeyValueStore, StoreKey};

/// One JSON file per store key under a root directory.
pub(super) struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub(super) fn open(root: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create store directory {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(format!(
            "{}.{}.json",
            file_safe(&key.passage_id),
            key.slot.as_str()
        ))
    }
}

/// Replaces anything that could leave a directory or confuse a file name.
pub(super) fn file_safe(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

impl KeyValueStore for FileStore {
    type Error = io::Error;

    fn load(&mut self, key: &StoreKey) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&mut self, key: &StoreKey, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)
    }
}

#[cfg(test)]
mod tests {
    use unfold_core::store::StoreSlot;

    use super::*;

    #[test]
    fn missing_record_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::open(dir.path()).expect("open store");

        let key = StoreKey::new("lighthouse", StoreSlot::Answers);
        assert_eq!(store.load(&key).expect("load"), None);
    }

    #[test]
    fn saved_records_are_separate_per_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::open(&dir.path().join("nested")).expect("open store");

        let answers = StoreKey::new("lighthouse", StoreSlot::Answers);
        let resume = StoreKey::new("lighthouse", StoreSlot::Resume);
        store.save(&answers, r#"{"q1":"a"}"#).expect("save answers");
        store.save(&resume, r#"{"position":3}"#).expect("save resume");
        store.save(&answers, r#"{"q1":"b"}"#).expect("overwrite answers");

        assert_eq!(
            store.load(&answers).expect("load").as_deref(),
            Some(r#"{"q1":"b"}"#)
        );
        assert_eq!(
            store.load(&resume).expect("load").as_deref(),
            Some(r#"{"position":3}"#)
        );
    }

    #[test]
    fn passage_ids_cannot_escape_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).expect("open store");

        let path = store.path_for(&StoreKey::new("../etc/passwd", StoreSlot::Results));
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.ends_with("___etc_passwd.results.json"));
    }
}
