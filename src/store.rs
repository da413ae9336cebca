use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use crate::patterns::{CompiledPatterns, PatternsFile};

/// Owns the single mutable reference to the compiled pattern snapshot.
///
/// Readers always get a complete snapshot via `current()`; a reload swaps
/// the whole `Arc` so a concurrent reader never observes a half-updated
/// table. A failed reload keeps the previous valid snapshot in effect
/// (stale-but-valid); only the very first load is allowed to fail hard.
pub struct PatternStore {
    path: Option<PathBuf>,
    snapshot: RwLock<Arc<CompiledPatterns>>,
    /// Modification time of the backing file at last successful or
    /// attempted load. Doubles as the reload guard: the holder of this
    /// lock is the only caller allowed to reload, everyone else proceeds
    /// with the stale snapshot instead of waiting.
    reload_state: Mutex<Option<SystemTime>>,
}

impl PatternStore {
    /// Load from the backing file. Fails if the file is missing or
    /// malformed: the pipeline cannot classify without a rule set.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = PatternsFile::from_file(path)?;
        let mtime = file_mtime(path);
        log::info!("loaded pattern set from {}", path.display());
        Ok(PatternStore {
            path: Some(path.to_path_buf()),
            snapshot: RwLock::new(Arc::new(file.compile())),
            reload_state: Mutex::new(mtime),
        })
    }

    /// Wrap a fixed in-memory set. Never reloads.
    pub fn fixed(set: CompiledPatterns) -> Self {
        PatternStore {
            path: None,
            snapshot: RwLock::new(Arc::new(set)),
            reload_state: Mutex::new(None),
        }
    }

    /// Current snapshot. Checks the backing file's modification time and
    /// reloads lazily when it changed; other callers racing with a reload
    /// keep the old snapshot rather than blocking.
    pub fn current(&self) -> Arc<CompiledPatterns> {
        if let Some(path) = &self.path {
            if let Ok(mut state) = self.reload_state.try_lock() {
                let mtime = file_mtime(path);
                if mtime.is_some() && mtime != *state {
                    self.reload(path.clone(), &mut state, mtime);
                }
            }
        }
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            // A poisoned lock still holds a complete snapshot; swaps are
            // whole-Arc replacements, so the value is safe to serve.
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn reload(
        &self,
        path: PathBuf,
        state: &mut Option<SystemTime>,
        mtime: Option<SystemTime>,
    ) {
        let display = path.display();
        match PatternsFile::from_file(&path) {
            Ok(file) => {
                let compiled = Arc::new(file.compile());
                if let Ok(mut snapshot) = self.snapshot.write() {
                    *snapshot = compiled;
                }
                log::info!("reloaded pattern set from {display}");
            }
            Err(e) => {
                log::warn!("pattern reload from {display} failed, keeping previous snapshot: {e}");
            }
        }
        // Record the mtime either way so a broken file is not re-parsed on
        // every message until it changes again.
        *state = mtime;
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;
    use std::io::Write;

    fn temp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("jobsift-store-{}-{}", std::process::id(), name));
        p
    }

    fn write_file(path: &PathBuf, content: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.sync_all().unwrap();
    }

    #[test]
    fn test_open_fails_on_missing_file() {
        assert!(PatternStore::open("/nonexistent/patterns.yaml").is_err());
    }

    #[test]
    fn test_open_fails_on_malformed_first_load() {
        let path = temp_path("malformed.yaml");
        write_file(&path, "labels: [not, a, mapping");
        assert!(PatternStore::open(path.to_str().unwrap()).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reload_keeps_stale_snapshot_on_malformed_content() {
        let path = temp_path("stale.yaml");
        let yaml = serde_yaml::to_string(&PatternsFile::default()).unwrap();
        write_file(&path, &yaml);

        let store = PatternStore::open(path.to_str().unwrap()).unwrap();
        let before = store.current();
        assert!(!before.label_rules.is_empty());

        std::thread::sleep(std::time::Duration::from_millis(20));
        write_file(&path, "labels: [broken");

        let after = store.current();
        assert_eq!(after.label_rules.len(), before.label_rules.len());
        assert_eq!(after.label_rules[0].label, before.label_rules[0].label);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reload_picks_up_new_content() {
        let path = temp_path("reload.yaml");
        let mut file = PatternsFile::default();
        write_file(&path, &serde_yaml::to_string(&file).unwrap());

        let store = PatternStore::open(path.to_str().unwrap()).unwrap();
        assert!(store.current().domain_map.is_empty());

        std::thread::sleep(std::time::Duration::from_millis(20));
        file.domain_map
            .insert("acme.com".to_string(), "Acme Inc".to_string());
        write_file(&path, &serde_yaml::to_string(&file).unwrap());

        let reloaded = store.current();
        assert_eq!(reloaded.company_for_domain("acme.com"), Some("Acme Inc"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reload_with_identical_content_changes_nothing() {
        let path = temp_path("identical.yaml");
        let yaml = serde_yaml::to_string(&PatternsFile::default()).unwrap();
        write_file(&path, &yaml);

        let store = PatternStore::open(path.to_str().unwrap()).unwrap();
        let before = store.current();

        std::thread::sleep(std::time::Duration::from_millis(20));
        write_file(&path, &yaml);

        let after = store.current();
        assert_eq!(after.label_rules.len(), before.label_rules.len());
        for (a, b) in after.label_rules.iter().zip(before.label_rules.iter()) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.patterns.len(), b.patterns.len());
        }
        assert_eq!(after.personal_domains, before.personal_domains);
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn test_reload_works_for_non_utf8_path() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let mut name = format!("jobsift-store-{}-", std::process::id()).into_bytes();
        name.extend_from_slice(&[0x6e, 0x6f, 0xff, 0x2e, 0x79, 0x61, 0x6d, 0x6c]);
        let mut path = std::env::temp_dir();
        path.push(OsString::from_vec(name));
        assert!(path.to_str().is_none());

        let mut file = PatternsFile::default();
        write_file(&path, &serde_yaml::to_string(&file).unwrap());
        let store = PatternStore::open(&path).unwrap();
        assert!(store.current().domain_map.is_empty());

        std::thread::sleep(std::time::Duration::from_millis(20));
        file.domain_map
            .insert("acme.com".to_string(), "Acme Inc".to_string());
        write_file(&path, &serde_yaml::to_string(&file).unwrap());

        let reloaded = store.current();
        assert_eq!(reloaded.company_for_domain("acme.com"), Some("Acme Inc"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_fixed_store_never_reloads() {
        let store = PatternStore::fixed(PatternsFile::default().compile());
        let a = store.current();
        let b = store.current();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.label_rules[0].label, Label::Offer);
    }
}
