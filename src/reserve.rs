//! Reservation status resolution for one recipe-like unit.
//!
//! Beaker offers two mutually exclusive ways to hold a machine for
//! interactive use: the `/distribution/reservesys` task, which
//! reserves the machine while that task runs, or the `<reservesys/>`
//! element, which reserves the whole recipe. Which mechanism (if any)
//! the recipe used decides where its reservation status comes from.

use crate::document::Element;
use crate::error::ReportError;

/// Task name that reserves the machine at task-execution time.
pub const RESERVE_TASK: &str = "/distribution/reservesys";

/// Result value for a recipe showing both reservation mechanisms at
/// once. That report state is inconsistent; rather than guessing
/// which mechanism governs (or aborting a whole batch over one odd
/// recipe), the ambiguity is reported as the value itself.
pub const AMBIGUOUS_RESERVATION: &str = "ERROR: Looks like the recipe for this system \
                                         have too many methods to reserve. Do not know \
                                         what happens.";

/// Derive the reservation status of `unit` (a `recipe` or
/// `guestrecipe` element).
///
/// Both signals are searched for in the unit's entire subtree. When
/// `/distribution/reservesys` ran more than once, the last run in
/// document order is authoritative.
pub fn resolve(unit: &Element) -> Result<String, ReportError> {
    let tasks = unit.find_all("task");
    let mut reserve_task = None;
    for task in tasks.iter().rev() {
        if task.require_attr("name")? == RESERVE_TASK {
            reserve_task = Some(*task);
            break;
        }
    }

    let has_marker = !unit.find_all("reservesys").is_empty();

    let reservation = match (has_marker, reserve_task) {
        (true, Some(_)) => AMBIGUOUS_RESERVATION.to_string(),
        (false, Some(task)) => task.require_attr("status")?.to_string(),
        // Marker-based reservations and never-reserved recipes both
        // carry the answer in the recipe's own lifecycle status.
        (true, None) | (false, None) => unit.require_attr("status")?.to_string(),
    };

    Ok(reservation)
}
