use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::engine::progress::UserProgress;
use crate::model::Question;
use crate::store::schema::{EXPORT_VERSION, ExportData, ProgressData, QuestionBankData, Versioned};

const QUESTIONS_FILE: &str = "questions.json";
const PROGRESS_FILE: &str = "progress.json";
const STORE_FILES: [&str; 2] = [QUESTIONS_FILE, PROGRESS_FILE];

/// Two named JSON records in one directory: the question bank and the
/// learner's progress. Every write goes through a temp file and a rename.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating data directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing file gives the default. A file that fails to parse, or that a
    /// newer build wrote, is moved aside and the default returned, so a bad
    /// record never stops startup and the next save cannot overwrite it.
    fn load<T: DeserializeOwned + Default + Versioned>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str::<T>(&content).map_err(Into::into));
        match parsed {
            Ok(data) if !data.needs_reset() => data,
            Ok(data) => {
                let reason = format!("schema {} is newer than supported", data.schema_version());
                self.set_aside(name, &reason);
                T::default()
            }
            Err(e) => {
                self.set_aside(name, &e.to_string());
                T::default()
            }
        }
    }

    /// Rename an unusable record to `<name>.corrupt-<timestamp>` next to it.
    fn set_aside(&self, name: &str, reason: &str) {
        let path = self.file_path(name);
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let aside = self.file_path(&format!("{name}.corrupt-{stamp}"));
        match fs::rename(&path, &aside) {
            Ok(()) => {
                log::warn!(
                    "Ignoring unreadable {} ({reason}); moved it to {}",
                    path.display(),
                    aside.display()
                );
            }
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable {} ({reason}); could not move it aside: {e}",
                    path.display()
                );
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)?;
        write_synced(&tmp_path, &json)?;
        fs::rename(&tmp_path, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn load_questions(&self) -> Vec<Question> {
        self.load::<QuestionBankData>(QUESTIONS_FILE).questions
    }

    pub fn save_questions(&self, questions: &[Question]) -> Result<()> {
        self.save(
            QUESTIONS_FILE,
            &QuestionBankData {
                questions: questions.to_vec(),
                ..QuestionBankData::default()
            },
        )
    }

    pub fn load_progress(&self) -> UserProgress {
        self.load::<ProgressData>(PROGRESS_FILE).progress
    }

    pub fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        self.save(
            PROGRESS_FILE,
            &ProgressData {
                progress: progress.clone(),
                ..ProgressData::default()
            },
        )
    }

    /// Bundle both records plus the active config.
    pub fn export_all(&self, config: &Config) -> ExportData {
        ExportData {
            quizdeck_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            questions: QuestionBankData {
                questions: self.load_questions(),
                ..QuestionBankData::default()
            },
            progress: ProgressData {
                progress: self.load_progress(),
                ..ProgressData::default()
            },
        }
    }

    /// Replace both records from an export bundle, all or nothing.
    ///
    /// Stage: write every record to `.tmp`; any failure removes the staged
    /// files. Commit: move each original to `.bak`, then `.tmp` into place;
    /// a failure restores the `.bak` files. `.bak` files are removed on success.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.quizdeck_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.quizdeck_export_version,
                EXPORT_VERSION
            );
        }

        let files: Vec<(&str, String)> = vec![
            (QUESTIONS_FILE, serde_json::to_string_pretty(&data.questions)?),
            (PROGRESS_FILE, serde_json::to_string_pretty(&data.progress)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            if let Err(e) = write_synced(&tmp_path, json) {
                remove_all(&staged);
                bail!("Import failed during staging: {e}");
            }
            staged.push(tmp_path);
        }

        // (final path, backup path, whether an original existed)
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        for (i, (name, _)) in files.iter().enumerate() {
            let final_path = self.file_path(name);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
                roll_back(&committed);
                remove_all(&staged);
                bail!("Import failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(&staged[i], &final_path) {
                roll_back(&[(final_path, bak_path, had_original)]);
                roll_back(&committed);
                remove_all(&staged[i..]);
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }

        log::info!(
            "Imported {} questions and progress from export dated {}",
            data.questions.questions.len(),
            data.exported_at
        );
        Ok(())
    }

    /// Clean up after an import that stopped part way through.
    ///
    /// A record missing next to its `.bak`, or a staged `.tmp` still lying
    /// around, means the commit never finished: every `.bak` is moved back
    /// over its record. Otherwise the import completed and the `.bak` files
    /// are only stale copies.
    pub fn recover_interrupted_import(&self) -> ImportRecovery {
        let backups: Vec<(PathBuf, PathBuf)> = STORE_FILES
            .iter()
            .map(|name| {
                let path = self.file_path(name);
                let bak_path = path.with_extension("json.bak");
                (path, bak_path)
            })
            .filter(|(_, bak_path)| bak_path.exists())
            .collect();
        if backups.is_empty() {
            return ImportRecovery::Clean;
        }

        let staged: Vec<PathBuf> = STORE_FILES
            .iter()
            .map(|name| self.file_path(name).with_extension("json.tmp"))
            .filter(|tmp_path| tmp_path.exists())
            .collect();
        let interrupted = !staged.is_empty() || backups.iter().any(|(path, _)| !path.exists());

        if interrupted {
            for (path, bak_path) in &backups {
                if let Err(e) = fs::rename(bak_path, path) {
                    log::warn!(
                        "Could not restore {} from {}: {e}",
                        path.display(),
                        bak_path.display()
                    );
                }
            }
            remove_all(&staged);
            ImportRecovery::Restored
        } else {
            let stale: Vec<PathBuf> = backups.into_iter().map(|(_, bak_path)| bak_path).collect();
            remove_all(&stale);
            ImportRecovery::StaleBackups
        }
    }
}

/// What `recover_interrupted_import` found in the data directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportRecovery {
    Clean,
    /// The import had finished; leftover backups were removed.
    StaleBackups,
    /// The import had not finished; the previous records were put back.
    Restored,
}

fn write_synced(path: &Path, contents: &str) -> Result<()> {
    let mut file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn roll_back(committed: &[(PathBuf, PathBuf, bool)]) {
    for (final_path, bak_path, had_original) in committed {
        if *had_original {
            let _ = fs::rename(bak_path, final_path);
        } else {
            let _ = fs::remove_file(final_path);
        }
    }
}
