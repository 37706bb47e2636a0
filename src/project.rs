use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::AppError;
use crate::model::schematic::SCHEMATIC_VERSION;
use crate::model::Schematic;

/// Per-file mutex map to serialize concurrent writes to the same path.
static FILE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Atomically write bytes to a file using write-to-temp-then-rename.
///
/// 1. Acquires a per-file mutex to prevent concurrent writes to the same path
/// 2. Writes data to a `.tmp` sibling file and fsyncs it
/// 3. Renames the existing file to `.bak` (best-effort)
/// 4. Renames the `.tmp` file to the target path
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let lock = FILE_LOCKS
        .lock()
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let _guard = lock.lock();

    // foo.json → foo.json.tmp, foo.json.bak
    let file_name = path.file_name().unwrap_or_default();

    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut bak_name = OsString::from(file_name);
    bak_name.push(".bak");
    let bak_path = path.with_file_name(&bak_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if path.exists() {
        let _ = fs::rename(path, &bak_path);
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

// ── Save / Load ─────────────────────────────────────────────────────

/// Load a schematic document from JSON.
pub fn load_schematic(path: &Path) -> Result<Schematic, AppError> {
    let schematic: Schematic = read_json(path)?;
    if schematic.version > SCHEMATIC_VERSION {
        return Err(AppError::Validation {
            message: format!(
                "{} was written by a newer version (format {}, supported {})",
                path.display(),
                schematic.version,
                SCHEMATIC_VERSION
            ),
        });
    }
    if schematic.sheets.is_empty() {
        return Err(AppError::Validation {
            message: format!("{} has no sheets", path.display()),
        });
    }
    if schematic.next_free_id().is_none() {
        return Err(AppError::Validation {
            message: format!("{} uses the largest possible item id", path.display()),
        });
    }
    Ok(schematic)
}

/// Save a schematic document as pretty-printed JSON.
pub fn save_schematic(schematic: &Schematic, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_json(path, schematic)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::{SchItem, VecI};

    #[test]
    fn schematic_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("amp.sch.json");

        let mut sch = Schematic::new("amp");
        sch.insert(0, SchItem::wire(VecI::new(0, 0), VecI::new(100, 0)));
        sch.insert(0, SchItem::label(VecI::new(100, 0), "OUT"));
        save_schematic(&sch, &path).unwrap();

        let loaded = load_schematic(&path).unwrap();
        assert_eq!(loaded, sch);
    }

    #[test]
    fn second_save_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.sch.json");
        let sch = Schematic::new("a");
        save_schematic(&sch, &path).unwrap();
        save_schematic(&sch, &path).unwrap();
        assert!(dir.path().join("a.sch.json.bak").exists());
        assert!(!dir.path().join("a.sch.json.tmp").exists());
    }

    #[test]
    fn rejects_documents_without_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.sch.json");
        fs::write(&path, r#"{ "name": "x", "sheets": [] }"#).unwrap();
        assert!(matches!(
            load_schematic(&path),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn rejects_newer_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.sch.json");
        fs::write(
            &path,
            r#"{ "version": 99, "name": "x", "sheets": [{ "name": "Root" }] }"#,
        )
        .unwrap();
        assert!(load_schematic(&path).is_err());
    }

    #[test]
    fn rejects_exhausted_item_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("max.sch.json");
        fs::write(
            &path,
            format!(
                r#"{{ "name": "x", "sheets": [{{ "name": "Root", "items": [
                    {{ "id": {}, "type": "Junction", "position": {{ "x": 0, "y": 0 }} }}
                ] }}] }}"#,
                u64::MAX
            ),
        )
        .unwrap();
        assert!(matches!(
            load_schematic(&path),
            Err(AppError::Validation { .. })
        ));
    }
}
