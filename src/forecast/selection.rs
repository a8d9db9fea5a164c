use crate::domain::{ModelChoice, ModelKind, ResolvedModel};

pub const USER_SELECTED_REASON: &str = "User selected";

/// 32-bit string hash (`h = h * 31 + unit`, wrapping) over UTF-16 code units,
/// as an unsigned magnitude.
pub fn region_hash(region: &str) -> u32 {
    region
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
        .unsigned_abs()
}

/// Turn the client's choice into a concrete model.
///
/// `Auto` is a placeholder heuristic: the region name hash picks one of the
/// named models, so the same region always gets the same model.
pub fn resolve_model(choice: ModelChoice, region: &str) -> ResolvedModel {
    match choice {
        ModelChoice::Named(kind) => ResolvedModel {
            kind,
            reason: USER_SELECTED_REASON.to_string(),
        },
        ModelChoice::Auto => {
            let models = ModelKind::all();
            let kind = models[region_hash(region) as usize % models.len()];
            ResolvedModel {
                kind,
                reason: format!(
                    "Auto-selected {} for {} from a hash of the region name (placeholder heuristic)",
                    kind, region
                ),
            }
        }
    }
}
