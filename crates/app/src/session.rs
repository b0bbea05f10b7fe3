//! In-progress service visit.
//!
//! A [`MeasurementSession`] holds the draft of one visit: readings, water
//! changes, notes, manually entered adjustments and the advisor's pending
//! recommendation. Nothing is written to the snapshot until
//! [`MeasurementSession::commit`].
//!
//! Every advisor request gets a [`RequestToken`]. Starting a new request
//! supersedes earlier ones, and a reply is only kept if its token is still
//! current. Editing the readings or water changes drops any held
//! recommendation.

use chrono::{DateTime, Utc};
use neupool_core::{
    AdjustmentId, AppState, Category, ChemicalAdjustment, ChemicalReading, Commit, CommitRequest,
    PoolConfig, PoolId, Quantity, SanitizerType, UserId, ValidationError, WaterEvents, commit_log,
};
use tracing::{debug, info, instrument};

use crate::advisor::{AdjustmentRequest, Advisor, AdvisorError, Recommendation};
use crate::error::AppError;

/// Identifies one advisor request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// What happened to a completed advisor request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The reply is now the session's recommendation.
    Applied,
    /// A newer request was started; the reply was discarded.
    Stale,
}

/// Starting values for a new visit.
///
/// Salt is only prefilled for salt systems and temperature only for spas.
#[must_use]
pub fn draft_reading(pool: &PoolConfig) -> ChemicalReading {
    ChemicalReading {
        ph: 7.4,
        free_chlorine: 3.0,
        total_alkalinity: 100.0,
        cyanuric_acid: 50.0,
        calcium_hardness: Some(250.0),
        salt_level: (pool.sanitizer == SanitizerType::Salt).then_some(3000.0),
        temperature: (pool.category == Category::Spa).then_some(100.0),
    }
}

/// Draft of one service visit.
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    pool_id: PoolId,
    user_id: UserId,
    reading: ChemicalReading,
    water_events: WaterEvents,
    notes: Option<String>,
    manual: Vec<ChemicalAdjustment>,
    recommendation: Option<Recommendation>,
    generation: u64,
    pending: Option<RequestToken>,
}

impl MeasurementSession {
    /// Start a visit for `user_id` at `pool_id`.
    #[must_use]
    pub const fn new(pool_id: PoolId, user_id: UserId, reading: ChemicalReading) -> Self {
        Self {
            pool_id,
            user_id,
            reading,
            water_events: WaterEvents {
                added: false,
                drained: false,
                drained_half: false,
            },
            notes: None,
            manual: Vec::new(),
            recommendation: None,
            generation: 0,
            pending: None,
        }
    }

    /// Serviced pool.
    #[must_use]
    pub const fn pool_id(&self) -> &PoolId {
        &self.pool_id
    }

    /// Current draft reading.
    #[must_use]
    pub const fn reading(&self) -> &ChemicalReading {
        &self.reading
    }

    /// Current water change flags.
    #[must_use]
    pub const fn water_events(&self) -> WaterEvents {
        self.water_events
    }

    /// Held recommendation, if any.
    #[must_use]
    pub const fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendation.as_ref()
    }

    /// Manually entered adjustments, in entry order.
    #[must_use]
    pub fn manual_adjustments(&self) -> &[ChemicalAdjustment] {
        &self.manual
    }

    /// Returns `true` while an advisor request is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    // =========================================================================
    // Draft editing
    // =========================================================================

    /// Replace the draft reading. Drops any held recommendation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidReading` if a value is NaN, infinite
    /// or negative. The draft is left as it was.
    pub fn set_reading(&mut self, reading: ChemicalReading) -> Result<(), ValidationError> {
        reading.validate()?;
        self.reading = reading;
        self.invalidate();
        Ok(())
    }

    /// Replace the water change flags. Drops any held recommendation.
    pub fn set_water_events(&mut self, events: WaterEvents) {
        self.water_events = WaterEvents::new(events.added, events.drained, events.drained_half);
        self.invalidate();
    }

    /// Replace the notes. Blank notes are stored as none.
    ///
    /// Notes are not sent to the advisor, so a held recommendation is kept.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
    }

    /// Add a manually entered adjustment and return its ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name or unit is blank or the amount
    /// is missing.
    pub fn add_manual_adjustment(
        &mut self,
        chemical_name: &str,
        amount: Option<Quantity>,
        unit: &str,
    ) -> Result<AdjustmentId, ValidationError> {
        let adjustment = ChemicalAdjustment::manual(chemical_name, amount, unit)?;
        let id = adjustment
            .manual_id()
            .cloned()
            .unwrap_or_else(AdjustmentId::generate);
        self.manual.push(adjustment);
        Ok(id)
    }

    /// Remove a manual adjustment. Returns `false` if no entry had that ID.
    pub fn remove_manual_adjustment(&mut self, id: &AdjustmentId) -> bool {
        let before = self.manual.len();
        self.manual.retain(|a| a.manual_id() != Some(id));
        self.manual.len() != before
    }

    // =========================================================================
    // Advisor requests
    // =========================================================================

    /// Start a new advisor request.
    ///
    /// Clears manual adjustments and the held recommendation, and makes any
    /// earlier token stale.
    pub fn begin_request(&mut self) -> RequestToken {
        self.generation += 1;
        let token = RequestToken(self.generation);
        self.pending = Some(token);
        self.manual.clear();
        self.recommendation = None;
        token
    }

    /// Finish an advisor request.
    ///
    /// Results for stale tokens are discarded, errors included.
    ///
    /// # Errors
    ///
    /// Returns the advisor error if the token is current and the call failed.
    pub fn complete_request(
        &mut self,
        token: RequestToken,
        result: Result<Recommendation, AdvisorError>,
    ) -> Result<Completion, AdvisorError> {
        if self.pending != Some(token) {
            debug!(?token, current = self.generation, "Discarding stale recommendation");
            return Ok(Completion::Stale);
        }

        self.pending = None;
        self.recommendation = Some(result?);
        Ok(Completion::Applied)
    }

    /// Build the advisor request for the current draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the pool is no longer in the snapshot.
    pub fn adjustment_request(&self, state: &AppState) -> Result<AdjustmentRequest, AppError> {
        let pool = state
            .pool(&self.pool_id)
            .ok_or_else(|| AppError::NotFound(format!("pool {}", self.pool_id)))?;
        let reading = self.reading.clone().for_sanitizer(pool.config.sanitizer);
        Ok(AdjustmentRequest::new(
            &pool.config,
            &reading,
            &state.inventory,
            self.water_events,
        ))
    }

    /// Ask the advisor for a recommendation for the current draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the pool is gone and
    /// `AppError::Recommendation` if the advisor call fails.
    #[instrument(skip(self, advisor, state), fields(pool_id = %self.pool_id))]
    pub async fn request_recommendation<A: Advisor>(
        &mut self,
        advisor: &A,
        state: &AppState,
    ) -> Result<Completion, AppError> {
        let request = self.adjustment_request(state)?;
        let token = self.begin_request();
        let result = advisor.recommend(&request).await;
        let completion = self.complete_request(token, result)?;

        if let Some(recommendation) = &self.recommendation {
            info!(
                adjustments = recommendation.adjustments.len(),
                "Recommendation received"
            );
        }
        Ok(completion)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Adjustments that will be logged: recommended first, then manual.
    #[must_use]
    pub fn combined_adjustments(&self) -> Vec<ChemicalAdjustment> {
        self.recommendation
            .iter()
            .flat_map(|r| r.adjustments.iter().cloned())
            .chain(self.manual.iter().cloned())
            .collect()
    }

    /// Record the visit and reconcile inventory.
    ///
    /// On success the draft is reset for the next visit. On error the session
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a reading is not a finite,
    /// non-negative number and `AppError::Precommit` if the user or pool is
    /// missing or the user may not service the pool.
    #[instrument(skip(self, state), fields(pool_id = %self.pool_id, user_id = %self.user_id))]
    pub fn commit(&mut self, state: &AppState, now: DateTime<Utc>) -> Result<Commit, AppError> {
        self.reading.validate()?;
        let readings = match state.pool(&self.pool_id) {
            Some(pool) => self.reading.clone().for_sanitizer(pool.config.sanitizer),
            None => self.reading.clone(),
        };

        let commit = commit_log(
            state,
            CommitRequest {
                pool_id: self.pool_id.clone(),
                user_id: Some(self.user_id.clone()),
                readings,
                adjustments: self.combined_adjustments(),
                water_events: self.water_events,
                notes: self.notes.clone(),
            },
            now,
        )?;

        info!(
            entry_id = %commit.entry_id,
            adjustments = commit.outcomes.len(),
            revision = commit.state.revision,
            "Visit logged"
        );
        self.reset();
        Ok(commit)
    }

    fn invalidate(&mut self) {
        if self.recommendation.take().is_some() {
            debug!("Draft changed, recommendation dropped");
        }
        self.pending = None;
    }

    fn reset(&mut self) {
        self.water_events = WaterEvents::default();
        self.notes = None;
        self.manual.clear();
        self.recommendation = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neupool_core::{Surface, TargetRange};

    fn recommendation(name: &str) -> Recommendation {
        Recommendation {
            analysis: "test".to_string(),
            adjustments: vec![ChemicalAdjustment::recommended(
                name,
                Quantity::from_whole(1),
                "lbs",
                "test",
            )],
        }
    }

    fn session() -> MeasurementSession {
        let pool = PoolConfig {
            name: "Spa".to_string(),
            volume_gallons: 800,
            sanitizer: SanitizerType::Chlorine,
            surface: Surface::Fiberglass,
            category: Category::Spa,
        };
        MeasurementSession::new(PoolId::new("pool-2"), UserId::new("2"), draft_reading(&pool))
    }

    #[test]
    fn test_draft_reading_defaults() {
        let reading = session().reading().clone();
        assert_eq!(reading.temperature, Some(100.0));
        assert_eq!(reading.salt_level, None);
        assert_eq!(reading.calcium_hardness, Some(250.0));
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut session = session();
        let first = session.begin_request();
        let second = session.begin_request();

        let done = session
            .complete_request(first, Ok(recommendation("Acid")))
            .expect("stale is not an error");
        assert_eq!(done, Completion::Stale);
        assert!(session.recommendation().is_none());
        assert!(session.is_pending());

        let done = session
            .complete_request(second, Ok(recommendation("Shock")))
            .expect("current");
        assert_eq!(done, Completion::Applied);
        assert_eq!(
            session.recommendation().expect("held").adjustments[0].chemical_name,
            "Shock"
        );
    }

    #[test]
    fn test_stale_error_discarded() {
        let mut session = session();
        let first = session.begin_request();
        let _second = session.begin_request();
        let done = session
            .complete_request(first, Err(AdvisorError::RateLimited(5)))
            .expect("stale error swallowed");
        assert_eq!(done, Completion::Stale);
    }

    #[test]
    fn test_current_error_returned() {
        let mut session = session();
        let token = session.begin_request();
        let err = session
            .complete_request(token, Err(AdvisorError::Unauthorized("bad key".to_string())))
            .expect_err("current error");
        assert!(matches!(err, AdvisorError::Unauthorized(_)));
        assert!(!session.is_pending());
        assert!(session.recommendation().is_none());
    }

    #[test]
    fn test_begin_request_clears_manual() {
        let mut session = session();
        session
            .add_manual_adjustment("Soda Ash", Some(Quantity::from_whole(2)), "lbs")
            .expect("valid");
        session.begin_request();
        assert!(session.manual_adjustments().is_empty());
    }

    #[test]
    fn test_editing_draft_drops_recommendation() {
        let mut session = session();
        let token = session.begin_request();
        session
            .complete_request(token, Ok(recommendation("Acid")))
            .expect("applied");

        let mut reading = session.reading().clone();
        reading.ph = 8.0;
        session.set_reading(reading).expect("valid reading");
        assert!(session.recommendation().is_none());
    }

    #[test]
    fn test_editing_notes_keeps_recommendation() {
        let mut session = session();
        let token = session.begin_request();
        session
            .complete_request(token, Ok(recommendation("Acid")))
            .expect("applied");

        session.set_notes(Some("Brushed walls".to_string()));
        assert_eq!(
            session.recommendation().map(|r| r.adjustments.len()),
            Some(1)
        );
    }

    #[test]
    fn test_edit_during_request_makes_reply_stale() {
        let mut session = session();
        let token = session.begin_request();
        session.set_water_events(WaterEvents::new(true, false, false));

        let done = session
            .complete_request(token, Ok(recommendation("Acid")))
            .expect("stale");
        assert_eq!(done, Completion::Stale);
    }

    #[test]
    fn test_invalid_reading_leaves_draft() {
        let mut session = session();
        let token = session.begin_request();
        session
            .complete_request(token, Ok(recommendation("Acid")))
            .expect("applied");
        let before = session.reading().clone();

        let mut reading = before.clone();
        reading.ph = f64::NAN;
        assert_eq!(
            session.set_reading(reading),
            Err(ValidationError::InvalidReading("pH"))
        );
        assert_eq!(session.reading(), &before);
        assert!(session.recommendation().is_some());
    }

    #[test]
    fn test_manual_adjustment_add_remove() {
        let mut session = session();
        let id = session
            .add_manual_adjustment("Soda Ash", Some(Quantity::from_whole(2)), "lbs")
            .expect("valid");
        assert_eq!(session.manual_adjustments().len(), 1);

        assert!(session.remove_manual_adjustment(&id));
        assert!(!session.remove_manual_adjustment(&id));
        assert!(session.manual_adjustments().is_empty());

        assert!(matches!(
            session.add_manual_adjustment("", Some(Quantity::from_whole(1)), "lbs"),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_combined_order() {
        let mut session = session();
        let token = session.begin_request();
        session
            .complete_request(token, Ok(recommendation("Acid")))
            .expect("applied");
        session
            .add_manual_adjustment("Soda Ash", Some(Quantity::from_whole(2)), "lbs")
            .expect("valid");

        let names: Vec<_> = session
            .combined_adjustments()
            .into_iter()
            .map(|a| a.chemical_name)
            .collect();
        assert_eq!(names, vec!["Acid", "Soda Ash"]);
    }

    #[test]
    fn test_water_events_normalized() {
        let mut session = session();
        session.set_water_events(WaterEvents {
            added: false,
            drained: false,
            drained_half: true,
        });
        assert!(session.water_events().drained);
    }

    #[test]
    fn test_spa_request_targets() {
        let state = crate::store::seed_state().expect("seed");
        let mut reading = session().reading().clone();
        reading.ph = 7.0;
        let mut session = session();
        session.set_reading(reading).expect("valid reading");

        let request = session.adjustment_request(&state).expect("request");
        assert_eq!(request.targets.ph, TargetRange::new(7.2, 7.8));
        assert!((request.readings.ph - 7.0).abs() < f64::EPSILON);
    }
}
