//! Walks a parsed job-results document and resolves every recipe.

use crate::client::ReportSource;
use crate::document::{self, Document, Element};
use crate::error::ReportError;
use crate::report::SystemInfo;
use crate::reserve;
use tracing::debug;

/// Fetch a job's results through `source` and resolve every system in
/// it. Acquisition failures propagate as-is; see
/// [`job_to_system_info`] for the extraction contract.
pub fn system_info_for_job(
    source: &dyn ReportSource,
    taskspec: &str,
) -> anyhow::Result<Vec<SystemInfo>> {
    let bytes = source.job_results(taskspec)?;
    let doc = document::parse_bytes(&bytes)?;
    Ok(job_to_system_info(&doc)?)
}

/// Produce one [`SystemInfo`] per `recipe` and `guestrecipe` in the
/// document, in document order: each recipe is followed by its own
/// guest recipes before the next sibling recipe.
///
/// A missing required attribute or a non-numeric id aborts the whole
/// extraction; there is no partial output.
pub fn job_to_system_info(doc: &Document) -> Result<Vec<SystemInfo>, ReportError> {
    let mut systems = Vec::new();
    for job in doc.find_all("job") {
        for recipe_set in job.find_all("recipeSet") {
            for recipe in recipe_set.find_all("recipe") {
                systems.push(process_recipe(recipe)?);
                for guest in recipe.find_all("guestrecipe") {
                    systems.push(process_recipe(guest)?);
                }
            }
        }
    }
    debug!("extracted {} recipe record(s)", systems.len());
    Ok(systems)
}

/// Resolve one `recipe` or `guestrecipe` element. Guests are resolved
/// independently; nothing is inherited from the hosting recipe.
fn process_recipe(unit: &Element) -> Result<SystemInfo, ReportError> {
    let raw_id = unit.require_attr("id")?;
    let id = raw_id.parse::<u64>().map_err(|_| ReportError::MalformedId {
        element: unit.tag.clone(),
        value: raw_id.to_string(),
    })?;

    Ok(SystemInfo {
        id,
        system: unit.require_attr("system")?.to_string(),
        arch: unit.require_attr("arch")?.to_string(),
        distro: unit.require_attr("distro")?.to_string(),
        variant: unit.require_attr("variant")?.to_string(),
        reservation: reserve::resolve(unit)?,
    })
}
