use anyhow::{Context, anyhow};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::info;

const BACKUP_PREFIX: &str = "docfix-backup-";

/// Per-run directory holding copies of files before they are mutated.
///
/// Nothing touches the filesystem until the first [`backup`](Self::backup).
/// The directory is kept after the run so originals can be restored by hand.
#[derive(Debug, Clone)]
pub struct BackupArea {
    base_dir: Utf8PathBuf,
    parent: Option<Utf8PathBuf>,
    dir: Option<Utf8PathBuf>,
}

impl BackupArea {
    /// `base_dir` is what mirrored paths are made relative to; `parent` is where
    /// the run directory is created (the system temp dir when `None`).
    pub fn new(base_dir: impl Into<Utf8PathBuf>, parent: Option<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            parent,
            dir: None,
        }
    }

    /// The run directory, once it exists.
    pub fn dir(&self) -> Option<&Utf8Path> {
        self.dir.as_deref()
    }

    /// Copy `path` into the backup area and return the copy's location.
    pub fn backup(&mut self, path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
        let rel = self.mirrored(path);
        let dest = self.ensure_dir()?.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest).with_context(|| format!("back up {path}"))?;
        Ok(dest)
    }

    fn ensure_dir(&mut self) -> anyhow::Result<&Utf8Path> {
        if self.dir.is_none() {
            let builder = {
                let mut b = tempfile::Builder::new();
                b.prefix(BACKUP_PREFIX);
                b
            };
            let tmp = match &self.parent {
                Some(parent) => {
                    fs::create_dir_all(parent)?;
                    builder.tempdir_in(parent)
                }
                None => builder.tempdir(),
            }
            .context("create backup directory")?;

            let dir = Utf8PathBuf::from_path_buf(tmp.keep())
                .map_err(|p| anyhow!("backup directory is not UTF-8: {}", p.display()))?;
            info!(path = %dir, "created backup directory");
            self.dir = Some(dir);
        }

        self.dir
            .as_deref()
            .ok_or_else(|| anyhow!("backup directory unavailable"))
    }

    /// Path of `path` inside the backup area: relative to the base dir when
    /// possible, otherwise its normal components with any root stripped.
    fn mirrored(&self, path: &Utf8Path) -> Utf8PathBuf {
        let rel = path.strip_prefix(&self.base_dir).unwrap_or(path);
        rel.components()
            .filter_map(|c| match c {
                Utf8Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mirrored_paths_are_relative_to_base() {
        let area = BackupArea::new("/work", None);
        assert_eq!(
            area.mirrored(Utf8Path::new("/work/docs/a.adoc")),
            Utf8PathBuf::from("docs/a.adoc")
        );
        assert_eq!(
            area.mirrored(Utf8Path::new("/elsewhere/b.adoc")),
            Utf8PathBuf::from("elsewhere/b.adoc")
        );
        assert_eq!(
            area.mirrored(Utf8Path::new("../up/c.adoc")),
            Utf8PathBuf::from("up/c.adoc")
        );
    }

    #[test]
    fn nothing_is_created_until_first_backup() {
        let area = BackupArea::new("/work", None);
        assert!(area.dir().is_none());
    }
}
