use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use zip::ZipArchive;

use crate::error::PipelineError;

pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Prefers an entry named `wanted`, else the first file with one of `extensions`.
pub fn read_archive_entry(
    path: &Path,
    wanted: Option<&str>,
    extensions: &[&str],
) -> Result<(String, Vec<u8>)> {
    let file =
        File::open(path).with_context(|| format!("failed opening archive: {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed reading zip archive: {}", path.display()))?;

    let mut fallback = None;
    let mut exact = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if !entry.is_file() {
            continue;
        }
        let name = entry.name().to_string();
        let base = name.rsplit('/').next().unwrap_or(name.as_str());
        if wanted.is_some_and(|w| w == name || w == base) {
            exact = Some(i);
            break;
        }
        let matches_ext = base
            .rsplit_once('.')
            .map(|(_, ext)| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if fallback.is_none() && matches_ext {
            fallback = Some(i);
        }
    }

    let Some(index) = exact.or(fallback) else {
        return Err(PipelineError::NoArchiveEntry {
            archive: path.display().to_string(),
            wanted: wanted
                .map(str::to_string)
                .unwrap_or_else(|| format!("*.{}", extensions.join("|*."))),
        }
        .into());
    };

    let mut entry = archive.by_index(index)?;
    let name = entry.name().to_string();
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .with_context(|| format!("failed decompressing {name} from {}", path.display()))?;
    Ok((name, data))
}
