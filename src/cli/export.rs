use std::path::{Path, PathBuf};

use crate::cli::SelectionArgs;
use crate::error::Result;
use crate::export::{filtered_filename, to_csv, TEMPLATE_CSV, TEMPLATE_FILENAME};
use crate::models::RecordSet;
use crate::pipeline;
use crate::settings::{load_settings, shellexpand_path};

fn default_path(export_dir: &str, name: &str) -> PathBuf {
    PathBuf::from(shellexpand_path(export_dir)).join(name)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Write the filtered records as CSV. Without an explicit output the file
/// lands in `export_dir` under a timestamped name.
pub fn write_filtered(records: &RecordSet, output: Option<&str>, export_dir: &str) -> Result<PathBuf> {
    let path = match output {
        Some(p) => PathBuf::from(shellexpand_path(p)),
        None => {
            let now = chrono::Local::now().naive_local();
            default_path(export_dir, &filtered_filename(now))
        }
    };
    write_file(&path, &to_csv(records)?)?;
    tracing::info!(rows = records.len(), path = %path.display(), "exported filtered records");
    Ok(path)
}

pub fn run(selection: &SelectionArgs, output: Option<&str>) -> Result<()> {
    let (selections, source) = selection.resolve()?;
    let out = pipeline::run(&source.records, &selections);
    let settings = load_settings();
    let path = write_filtered(&out.filtered, output, &settings.export_dir)?;
    println!("Wrote {} ({} rows)", path.display(), out.filtered.len());
    Ok(())
}

/// Print the upload template, or save it when an output path is given.
pub fn template(output: Option<&str>) -> Result<()> {
    match output {
        Some(p) => {
            let expanded = shellexpand_path(p);
            let mut path = PathBuf::from(&expanded);
            if path.is_dir() {
                path = path.join(TEMPLATE_FILENAME);
            }
            write_file(&path, TEMPLATE_CSV)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{TEMPLATE_CSV}"),
    }
    Ok(())
}
