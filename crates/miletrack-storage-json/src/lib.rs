//! miletrack-storage-json
//!
//! Filesystem JSON persistence for garages and their timestamped backups.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use miletrack_core::{
    storage::{garage_warnings, GarageBackupInfo, GarageStorage},
    CoreError,
};
use miletrack_domain::Garage;

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;
const FALLBACK_SLUG: &str = "garage";

/// Directories used by [`JsonGarageStorage`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub garage_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// `<root>/garages` and `<root>/backups`.
    pub fn from_data_root(root: &Path) -> Self {
        Self {
            garage_root: root.join("garages"),
            backup_root: root.join("backups"),
        }
    }
}

/// Filesystem-backed JSON persistence for garages and their backups.
#[derive(Debug, Clone)]
pub struct JsonGarageStorage {
    garages_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonGarageStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.garage_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            garages_dir: paths.garage_root,
            backups_dir: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn garage_path(&self, name: &str) -> PathBuf {
        self.garages_dir
            .join(format!("{}.{}", canonical_name(name), FILE_EXTENSION))
    }

    pub fn backup_path(&self, name: &str, backup: &str) -> PathBuf {
        self.backup_dir(name).join(backup)
    }

    /// Summary rows for every stored garage, sorted by display name.
    pub fn list_garage_metadata(&self) -> Result<Vec<GarageMetadata>, CoreError> {
        let mut entries = Vec::new();
        for slug in self.list_garages()? {
            let path = self.garage_path(&slug);
            let garage = load_garage_from_path(&path)?;
            entries.push(GarageMetadata {
                slug,
                name: garage.name.clone(),
                path,
                updated_at: garage.updated_at,
                car_count: garage.cars.len(),
                reading_count: garage.readings.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn list_backup_metadata(&self, name: &str) -> Result<Vec<BackupMetadata>, CoreError> {
        let rows = self
            .list_backups(name)?
            .into_iter()
            .map(|entry| BackupMetadata {
                size_bytes: fs::metadata(&entry.path).map(|meta| meta.len()).unwrap_or(0),
                created_at: parse_backup_timestamp(&entry.id),
                name: entry.id,
                path: entry.path,
            })
            .collect();
        Ok(rows)
    }

    pub fn delete_backup(&self, name: &str, backup_id: &str) -> Result<(), CoreError> {
        let path = self.backup_path(name, backup_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    fn write_backup(
        &self,
        name: &str,
        contents: BackupSource<'_>,
        note: Option<&str>,
    ) -> Result<GarageBackupInfo, CoreError> {
        let slug = canonical_name(name);
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", slug, timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let file_name = format!("{}.{}", stem, FILE_EXTENSION);
        let path = dir.join(&file_name);
        match contents {
            BackupSource::Garage(garage) => write_atomic(&path, &serialize_garage(garage)?)?,
            BackupSource::File(source) => {
                fs::copy(source, &path)?;
            }
        }
        debug!(garage = %slug, backup = %file_name, "wrote garage backup");
        self.prune_backups(name)?;
        Ok(GarageBackupInfo {
            garage: slug,
            id: file_name,
            created_at: timestamp,
            path,
        })
    }

    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        for entry in self.list_backups(name)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.id, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

enum BackupSource<'a> {
    Garage(&'a Garage),
    File(&'a Path),
}

impl GarageStorage for JsonGarageStorage {
    fn save_garage(&self, name: &str, garage: &Garage) -> Result<(), CoreError> {
        let path = self.garage_path(name);
        if path.exists() {
            self.write_backup(name, BackupSource::File(&path), None)?;
        }
        save_garage_to_path(garage, &path)
    }

    fn load_garage(&self, name: &str) -> Result<Garage, CoreError> {
        let path = self.garage_path(name);
        if !path.exists() {
            return Err(CoreError::GarageNotFound(name.to_string()));
        }
        load_garage_from_path(&path)
    }

    fn list_garages(&self) -> Result<Vec<String>, CoreError> {
        if !self.garages_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.garages_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_garage(&self, name: &str) -> Result<(), CoreError> {
        let path = self.garage_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn save_garage_to_path(&self, garage: &Garage, path: &Path) -> Result<(), CoreError> {
        if path.starts_with(&self.garages_dir) && path.exists() {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.write_backup(stem, BackupSource::File(path), None)?;
            }
        }
        save_garage_to_path(garage, path)
    }

    fn load_garage_from_path(&self, path: &Path) -> Result<Garage, CoreError> {
        load_garage_from_path(path)
    }

    fn backup_garage(
        &self,
        name: &str,
        garage: &Garage,
        note: Option<&str>,
    ) -> Result<GarageBackupInfo, CoreError> {
        self.write_backup(name, BackupSource::Garage(garage), note)
    }

    /// Backups of `name`, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<GarageBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let slug = canonical_name(name);
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let created_at = parse_backup_timestamp(file_name)
                .map(|stamp| stamp.format(BACKUP_TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default();
            entries.push(GarageBackupInfo {
                garage: slug.clone(),
                id: file_name.to_string(),
                created_at,
                path: path.clone(),
            });
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(&b.id)
                .cmp(&parse_backup_timestamp(&a.id))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    fn restore_backup(&self, backup: &GarageBackupInfo) -> Result<Garage, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let garage = load_garage_from_path(&backup.path)?;
        let target = self.garage_path(&backup.garage);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&backup.path, &target)?;
        Ok(garage)
    }
}

/// Saves a garage to an arbitrary path on disk.
pub fn save_garage_to_path(garage: &Garage, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_garage(garage)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a garage from the provided filesystem path, logging any integrity warnings.
pub fn load_garage_from_path(path: &Path) -> Result<Garage, CoreError> {
    let data = fs::read_to_string(path)?;
    let garage: Garage =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    for warning in garage_warnings(&garage) {
        warn!(path = %path.display(), "{}", warning);
    }
    Ok(garage)
}

#[derive(Debug, Clone)]
pub struct GarageMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub updated_at: DateTime<Utc>,
    pub car_count: usize,
    pub reading_count: usize,
}

#[derive(Debug, Clone)]
pub struct BackupMetadata {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// File-system slug for a garage name.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        FALLBACK_SLUG.into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let mut sanitized = String::new();
    for ch in note?.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.'))
            && !sanitized.is_empty()
            && !sanitized.ends_with('-')
        {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads the `YYYYMMDD_HHMM` stamp of a backup file name; the slug may contain `_`.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
    let segments: Vec<&str> = stem.split('_').collect();
    segments.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if !is_digits(date, 8) || !is_digits(time, 4) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn serialize_garage(garage: &Garage) -> Result<String, CoreError> {
    serde_json::to_string_pretty(garage).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_replace_everything_but_lowercase_alphanumerics() {
        assert_eq!(canonical_name("  Family Cars 2 "), "family_cars_2");
        assert_eq!(canonical_name("Übersicht"), "_bersicht");
        assert_eq!(canonical_name("***"), "garage");
        assert_eq!(canonical_name(""), "garage");
    }

    #[test]
    fn backup_timestamps_survive_underscored_slugs() {
        let stamp = parse_backup_timestamp("family_cars_20250309_1405_weekly.json").unwrap();
        assert_eq!(stamp.format("%Y-%m-%d %H:%M").to_string(), "2025-03-09 14:05");
        assert!(parse_backup_timestamp("family_cars.json").is_none());
    }

    #[test]
    fn backup_notes_are_sanitized() {
        assert_eq!(
            sanitize_backup_note(Some("Before import, v2")),
            Some("before-import-v2".to_string())
        );
        assert_eq!(sanitize_backup_note(Some("!!!")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }
}
