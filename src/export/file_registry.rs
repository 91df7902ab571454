// ==========================================
// 目录导出注册表
// ==========================================
// 布局: <root>/<kind>/<hash>.json
//       <root>/rendered-icon/<hash>.png
// ==========================================

use crate::domain::{ExportCombination, ExportIcon, ExportItem, ExportMachine, ExportMod, ExportRecipe};
use crate::export::ExportRegistry;
use crate::importer::error::{ImportError, ImportResult};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileExportRegistry {
    root: PathBuf,
}

impl FileExportRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, kind: &str, hash: &str, extension: &str) -> PathBuf {
        self.root.join(kind).join(format!("{}.{}", hash, extension))
    }

    fn read_bytes(&self, kind: &str, hash: &str, extension: &str) -> ImportResult<Vec<u8>> {
        // 哈希来自外部数据，拒绝路径分隔符
        if hash.is_empty() || hash.contains(['/', '\\']) || hash.contains("..") {
            return Err(ImportError::unknown_hash(kind, hash));
        }

        let path = self.entry_path(kind, hash, extension);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ImportError::unknown_hash(kind, hash)),
            Err(e) => Err(ImportError::FileReadError(format!("{}: {}", path.display(), e))),
        }
    }

    fn read_json<T: DeserializeOwned>(&self, kind: &str, hash: &str) -> ImportResult<T> {
        let bytes = self.read_bytes(kind, hash, "json")?;
        serde_json::from_slice(&bytes).map_err(|e| ImportError::ExportFormatError {
            context: format!("{}/{}", kind, hash),
            message: e.to_string(),
        })
    }
}

impl ExportRegistry for FileExportRegistry {
    fn get_combination(&self, hash: &str) -> ImportResult<ExportCombination> {
        self.read_json("combination", hash)
    }

    fn get_mod(&self, hash: &str) -> ImportResult<ExportMod> {
        self.read_json("mod", hash)
    }

    fn get_item(&self, hash: &str) -> ImportResult<ExportItem> {
        self.read_json("item", hash)
    }

    fn get_machine(&self, hash: &str) -> ImportResult<ExportMachine> {
        self.read_json("machine", hash)
    }

    fn get_recipe(&self, hash: &str) -> ImportResult<ExportRecipe> {
        self.read_json("recipe", hash)
    }

    fn get_icon(&self, hash: &str) -> ImportResult<ExportIcon> {
        self.read_json("icon", hash)
    }

    fn get_rendered_icon(&self, hash: &str) -> ImportResult<Vec<u8>> {
        self.read_bytes("rendered-icon", hash, "png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemType;
    use tempfile::TempDir;

    fn write(dir: &TempDir, kind: &str, file: &str, contents: &[u8]) {
        let kind_dir = dir.path().join(kind);
        std::fs::create_dir_all(&kind_dir).unwrap();
        std::fs::write(kind_dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_reads_json_and_rendered_icon() {
        let dir = TempDir::new().unwrap();
        write(&dir, "item", "abc.json", br#"{"type":"fluid","name":"water","labels":{"en":"Water"}}"#);
        write(&dir, "rendered-icon", "def.png", &[0x89, b'P', b'N', b'G']);

        let registry = FileExportRegistry::new(dir.path());
        let item = registry.get_item("abc").unwrap();
        assert_eq!(item.item_type, ItemType::Fluid);
        assert_eq!(item.labels.get("en").map(String::as_str), Some("Water"));
        assert_eq!(registry.get_rendered_icon("def").unwrap().len(), 4);
    }

    #[test]
    fn test_missing_file_is_unknown_key() {
        let dir = TempDir::new().unwrap();
        let registry = FileExportRegistry::new(dir.path());
        assert!(matches!(
            registry.get_recipe("nope"),
            Err(ImportError::UnknownSnapshotKey { .. })
        ));
        assert!(matches!(
            registry.get_mod("../escape"),
            Err(ImportError::UnknownSnapshotKey { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "machine", "bad.json", b"{not json");
        let registry = FileExportRegistry::new(dir.path());
        assert!(matches!(
            registry.get_machine("bad"),
            Err(ImportError::ExportFormatError { .. })
        ));
    }
}
