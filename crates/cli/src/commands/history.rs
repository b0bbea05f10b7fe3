//! Pool history command.

use neupool_app::{AppContext, AppError};
use neupool_core::{LogEntry, PoolId, targets::out_of_range};

use super::{CommandError, Credentials, emit};

/// Show a pool's log entries, oldest first.
///
/// Works for deleted pools: admins can always read them, technicians while
/// the pool is still among their assignments.
///
/// # Errors
///
/// Returns an error if the login fails or the user may not view the pool.
pub fn show(
    ctx: &AppContext,
    credentials: &Credentials,
    pool: &str,
    limit: Option<usize>,
) -> Result<(), CommandError> {
    let user = credentials.login(ctx)?;
    let pool_id = PoolId::new(pool);
    if !user.can_access(&pool_id) {
        return Err(AppError::Forbidden(format!(
            "{} is not assigned to pool {pool_id}",
            user.username
        ))
        .into());
    }

    let logs = ctx.state().pool_logs(&pool_id);
    if logs.is_empty() {
        return emit([format!("No history for {pool_id}.")]);
    }

    let skip = limit.map_or(0, |n| logs.len().saturating_sub(n));
    let title = ctx
        .state()
        .pool(&pool_id)
        .map_or_else(|| format!("{pool_id} (deleted)"), |p| p.config.name.clone());

    let mut lines = vec![format!("History for {title}")];
    for entry in logs.into_iter().skip(skip) {
        lines.extend(describe(entry));
    }
    emit(lines)
}

fn describe(entry: &LogEntry) -> Vec<String> {
    let r = &entry.readings;
    let flagged = out_of_range(r);

    let mut lines = vec![format!(
        "{}  by {}  pH {}  FC {}  TA {}  CYA {}{}",
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        entry.user,
        r.ph,
        r.free_chlorine,
        r.total_alkalinity,
        r.cyanuric_acid,
        if flagged.is_empty() {
            String::new()
        } else {
            format!("  [out of range: {}]", flagged.join(", "))
        }
    )];

    let events = entry.water_events;
    if !events.is_empty() {
        let mut parts = Vec::new();
        if events.added {
            parts.push("water added");
        }
        if events.drained_half {
            parts.push("drained >50%");
        } else if events.drained {
            parts.push("drained");
        }
        lines.push(format!("    water: {}", parts.join(", ")));
    }

    lines.extend(entry.adjustments.iter().map(|adj| {
        format!(
            "    + {} {} {} ({})",
            adj.amount, adj.unit, adj.chemical_name, adj.reason
        )
    }));

    if let Some(notes) = &entry.notes {
        lines.push(format!("    notes: {notes}"));
    }
    lines
}
