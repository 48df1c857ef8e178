use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::controls::Selections;
use crate::error::Result;
use crate::filter;
use crate::generator::generate;
use crate::importer::{load_upload, UploadInfo};
use crate::models::RecordSet;
use crate::render::{render, RenderOptions, Rendered};
use crate::summary::{summarize, Summary};
use crate::theme::{resolve, Palette};

/// Where the unfiltered records came from.
pub struct Source {
    pub records: RecordSet,
    pub upload: Option<UploadInfo>,
    /// User-visible message from a failed upload.
    pub notice: Option<String>,
}

/// Produce the unfiltered record set: an upload when a file is given,
/// synthetic data otherwise.
pub fn load_source(selections: &Selections, file: Option<&Path>) -> Result<Source> {
    if let Some(path) = file {
        let upload = load_upload(path)?;
        return Ok(Source {
            records: upload.records,
            upload: Some(upload.info),
            notice: upload.notice,
        });
    }
    let mut rng = match selections.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok(Source {
        records: generate(&mut rng, selections.months, selections.year),
        upload: None,
        notice: None,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    #[serde(skip)]
    pub filtered: RecordSet,
    pub summary: Summary,
    pub palette: Palette,
    pub rendered: Rendered,
}

/// One full pass: filter, aggregate, render. No state survives the call.
pub fn run(records: &RecordSet, selections: &Selections) -> PipelineOutput {
    let criteria = selections.criteria();
    let filtered = filter::apply(records, &criteria);
    let summary = summarize(&filtered);
    let palette = resolve(selections.theme);
    let options = RenderOptions {
        area_fill: selections.area_fill(),
        positive_only: selections.positive_only,
    };
    let rendered = render(&filtered, &summary, &palette, &options);
    tracing::info!(
        source = records.len(),
        filtered = filtered.len(),
        unfiltered = criteria.is_unset(),
        theme = %selections.theme,
        "pipeline pass"
    );
    PipelineOutput {
        filtered,
        summary,
        palette,
        rendered,
    }
}
