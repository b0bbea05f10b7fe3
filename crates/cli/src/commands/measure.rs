//! Service visit command.
//!
//! A visit optionally asks the advisor for dosing, then records the final
//! readings together with the recommended and manual adjustments. Committing
//! decrements matching inventory.

use chrono::Utc;
use neupool_app::{AppContext, Completion, MeasurementSession, Recommendation, draft_reading};
use neupool_core::{
    ChemicalReading, InventoryItemId, MatchOutcome, PoolId, Quantity, WaterEvents,
    targets::out_of_range,
};
use tracing::{info, warn};

use super::{CommandError, Credentials, emit};

/// Reading flags; unset values fall back to the draft defaults.
#[derive(Debug, Clone, Default)]
pub struct ReadingOverrides {
    /// pH.
    pub ph: Option<f64>,
    /// Free chlorine.
    pub free_chlorine: Option<f64>,
    /// Total alkalinity.
    pub total_alkalinity: Option<f64>,
    /// Cyanuric acid.
    pub cyanuric_acid: Option<f64>,
    /// Calcium hardness.
    pub calcium_hardness: Option<f64>,
    /// Salt level.
    pub salt_level: Option<f64>,
    /// Temperature.
    pub temperature: Option<f64>,
}

impl ReadingOverrides {
    /// Apply the overrides on top of `draft`.
    #[must_use]
    pub fn apply(&self, draft: ChemicalReading) -> ChemicalReading {
        ChemicalReading {
            ph: self.ph.unwrap_or(draft.ph),
            free_chlorine: self.free_chlorine.unwrap_or(draft.free_chlorine),
            total_alkalinity: self.total_alkalinity.unwrap_or(draft.total_alkalinity),
            cyanuric_acid: self.cyanuric_acid.unwrap_or(draft.cyanuric_acid),
            calcium_hardness: self.calcium_hardness.or(draft.calcium_hardness),
            salt_level: self.salt_level.or(draft.salt_level),
            temperature: self.temperature.or(draft.temperature),
        }
    }
}

/// One visit as given on the command line.
#[derive(Debug, Clone)]
pub struct Visit {
    /// Pool ID.
    pub pool: String,
    /// Reading flags.
    pub readings: ReadingOverrides,
    /// Water changes.
    pub water_events: WaterEvents,
    /// `NAME:AMOUNT:UNIT` manual additions.
    pub manual: Vec<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Skip the advisor.
    pub skip_advisor: bool,
    /// Print the recommendation only.
    pub dry_run: bool,
}

/// A parsed `--manual` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSpec {
    /// Chemical name.
    pub name: String,
    /// Amount added.
    pub amount: Quantity,
    /// Unit.
    pub unit: String,
}

/// Parse `NAME:AMOUNT:UNIT`. The name may itself contain colons.
///
/// # Errors
///
/// Returns `CommandError::ManualSpec` if a part is missing or the amount is
/// not a non-negative number.
pub fn parse_manual(spec: &str) -> Result<ManualSpec, CommandError> {
    let invalid = || CommandError::ManualSpec(spec.to_string());

    let mut parts = spec.rsplitn(3, ':');
    let unit = parts.next().ok_or_else(invalid)?;
    let amount = parts.next().ok_or_else(invalid)?;
    let name = parts.next().ok_or_else(invalid)?;

    let amount: Quantity = amount.parse().map_err(|_| invalid())?;
    if name.trim().is_empty() || unit.trim().is_empty() {
        return Err(invalid());
    }

    Ok(ManualSpec {
        name: name.trim().to_string(),
        amount,
        unit: unit.trim().to_string(),
    })
}

/// Run a visit.
///
/// # Errors
///
/// Returns an error if the login fails, the user may not service the pool,
/// a manual value is malformed, the advisor is not configured or fails, or
/// saving fails. Nothing is saved on error.
pub async fn run(
    ctx: &mut AppContext,
    credentials: &Credentials,
    visit: Visit,
) -> Result<(), CommandError> {
    let user = credentials.login(ctx)?;
    let pool_id = PoolId::new(&visit.pool);
    ctx.require_pool_access(&user, &pool_id)?;

    let manual = visit
        .manual
        .iter()
        .map(|spec| parse_manual(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let draft = ctx
        .state()
        .pool(&pool_id)
        .map(|pool| draft_reading(&pool.config))
        .ok_or_else(|| neupool_app::AppError::NotFound(format!("pool {pool_id}")))?;

    let mut session = MeasurementSession::new(pool_id.clone(), user.id.clone(), draft.clone());
    session
        .set_reading(visit.readings.apply(draft))
        .map_err(neupool_app::AppError::from)?;
    session.set_water_events(visit.water_events);
    session.set_notes(visit.notes);

    if !visit.skip_advisor {
        let advisor = ctx.advisor()?;
        let completion = session
            .request_recommendation(&advisor, ctx.state())
            .await?;
        if completion == Completion::Stale {
            warn!("Recommendation superseded, logging without it");
        }
        if let Some(recommendation) = session.recommendation() {
            emit(render_recommendation(recommendation))?;
        }
    }

    if visit.dry_run {
        return emit(["Dry run: nothing saved."]);
    }

    for spec in &manual {
        session.add_manual_adjustment(&spec.name, Some(spec.amount), &spec.unit)?;
    }

    let flagged = out_of_range(session.reading());
    let commit = session.commit(ctx.state(), Utc::now())?;
    let outcomes = commit.outcomes.clone();
    let entry_id = commit.entry_id.clone();
    ctx.apply(commit.state).await?;
    info!(%entry_id, %pool_id, "Visit saved");

    let view: &AppContext = ctx;
    let mut lines = vec![format!("Saved log entry {entry_id}")];
    if !flagged.is_empty() {
        lines.push(format!("Out of range: {}", flagged.join(", ")));
    }
    lines.extend(
        outcomes
            .iter()
            .filter_map(|outcome| describe_outcome(view, outcome)),
    );
    emit(lines)
}

fn render_recommendation(recommendation: &Recommendation) -> Vec<String> {
    let mut lines = vec![format!("Analysis: {}", recommendation.analysis)];
    if recommendation.adjustments.is_empty() {
        lines.push("No adjustments needed.".to_string());
    }
    lines.extend(recommendation.adjustments.iter().map(|adj| {
        format!(
            "  + {} {} {} ({})",
            adj.amount, adj.unit, adj.chemical_name, adj.reason
        )
    }));
    lines
}

fn describe_outcome(ctx: &AppContext, outcome: &MatchOutcome) -> Option<String> {
    let name = |id: &InventoryItemId| {
        ctx.state()
            .inventory_item(id)
            .map_or_else(|| id.to_string(), |item| item.name.clone())
    };
    match outcome {
        MatchOutcome::Decremented {
            item_id,
            before,
            after,
        } => Some(format!("Inventory: {} {before} -> {after}", name(item_id))),
        MatchOutcome::UnitMismatch { item_id } => Some(format!(
            "Inventory: {} unchanged (unit mismatch)",
            name(item_id)
        )),
        MatchOutcome::NoMatch => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual() {
        let spec = parse_manual("Soda Ash:1.5:lbs").expect("valid");
        assert_eq!(spec.name, "Soda Ash");
        assert_eq!(spec.amount, "1.5".parse().expect("quantity"));
        assert_eq!(spec.unit, "lbs");
    }

    #[test]
    fn test_parse_manual_name_with_colon() {
        let spec = parse_manual("Acid: 31.45%:2:qt").expect("valid");
        assert_eq!(spec.name, "Acid: 31.45%");
        assert_eq!(spec.unit, "qt");
    }

    #[test]
    fn test_parse_manual_rejects_bad_input() {
        for bad in ["Soda Ash", "Soda Ash:1.5", ":1:lbs", "Soda Ash:-1:lbs", "Soda Ash:x:lbs", "Soda Ash:1: "] {
            assert!(
                matches!(parse_manual(bad), Err(CommandError::ManualSpec(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_overrides_apply() {
        let draft = ChemicalReading {
            ph: 7.4,
            free_chlorine: 3.0,
            total_alkalinity: 100.0,
            cyanuric_acid: 50.0,
            calcium_hardness: Some(250.0),
            salt_level: None,
            temperature: None,
        };
        let overrides = ReadingOverrides {
            ph: Some(7.9),
            temperature: Some(84.0),
            ..Default::default()
        };

        let reading = overrides.apply(draft);
        assert!((reading.ph - 7.9).abs() < f64::EPSILON);
        assert_eq!(reading.temperature, Some(84.0));
        assert_eq!(reading.calcium_hardness, Some(250.0));
    }
}
