//! Duration prediction.
//!
//! Surgery durations come from an external model. The core only needs a
//! positive number of minutes per patient; everything about how that
//! number is produced stays behind the `DurationPredictor` trait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::PredictionError;
use crate::models::{Minutes, Patient};

/// Predicts surgery length for a patient.
///
/// Implementations return minutes as `f64`. Non-positive or non-finite
/// values are rejected by [`predict_minutes`].
pub trait DurationPredictor: Send + Sync {
    /// Predicted surgery length in minutes.
    fn predict(&self, patient: &Patient) -> Result<f64, PredictionError>;
}

impl<F> DurationPredictor for F
where
    F: Fn(&Patient) -> Result<f64, PredictionError> + Send + Sync,
{
    fn predict(&self, patient: &Patient) -> Result<f64, PredictionError> {
        self(patient)
    }
}

/// Longest surgery a predictor may report: one week.
pub const MAX_PREDICTED_MINUTES: Minutes = 7 * 24 * 60;

/// Calls `predictor` and converts the result to whole minutes (rounded up).
///
/// Values above [`MAX_PREDICTED_MINUTES`] are rejected.
pub fn predict_minutes(
    predictor: &dyn DurationPredictor,
    patient: &Patient,
) -> Result<Minutes, PredictionError> {
    let minutes = predictor.predict(patient)?;
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(PredictionError::NonPositive {
            patient_id: patient.id.clone(),
            minutes,
        });
    }
    if minutes > MAX_PREDICTED_MINUTES as f64 {
        return Err(PredictionError::TooLong {
            patient_id: patient.id.clone(),
            minutes,
            limit: MAX_PREDICTED_MINUTES,
        });
    }
    Ok(minutes.ceil() as Minutes)
}

/// Predicts the same duration for every patient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDuration(pub f64);

impl Default for FixedDuration {
    /// Two hours, the fallback used when no model is loaded.
    fn default() -> Self {
        Self(120.0)
    }
}

impl DurationPredictor for FixedDuration {
    fn predict(&self, _patient: &Patient) -> Result<f64, PredictionError> {
        Ok(self.0)
    }
}

/// Looks durations up by patient id.
///
/// Unknown patients fall back to `fallback` if set, otherwise fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationTable {
    durations: HashMap<String, f64>,
    fallback: Option<f64>,
}

impl DurationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the duration for a patient.
    pub fn with(mut self, patient_id: impl Into<String>, minutes: f64) -> Self {
        self.durations.insert(patient_id.into(), minutes);
        self
    }

    /// Sets the duration used for unknown patients.
    pub fn with_fallback(mut self, minutes: f64) -> Self {
        self.fallback = Some(minutes);
        self
    }

    /// Replaces the duration for a patient.
    pub fn insert(&mut self, patient_id: impl Into<String>, minutes: f64) {
        self.durations.insert(patient_id.into(), minutes);
    }
}

impl DurationPredictor for DurationTable {
    fn predict(&self, patient: &Patient) -> Result<f64, PredictionError> {
        self.durations
            .get(&patient.id)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| PredictionError::Failed {
                patient_id: patient.id.clone(),
                message: "no duration on record".into(),
            })
    }
}

/// Memoizes another predictor per patient id.
///
/// Patients are immutable, so a prediction made at intake stays valid
/// for every later re-optimization of the same session.
#[derive(Debug, Default)]
pub struct CachedPredictor<P> {
    inner: P,
    cache: Mutex<HashMap<String, f64>>,
}

impl<P: DurationPredictor> CachedPredictor<P> {
    /// Wraps a predictor.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped predictor.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of cached predictions.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<P: DurationPredictor> DurationPredictor for CachedPredictor<P> {
    fn predict(&self, patient: &Patient) -> Result<f64, PredictionError> {
        if let Some(&minutes) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&patient.id)
        {
            return Ok(minutes);
        }
        // Failures are not cached; the next call asks the model again.
        let minutes = self.inner.predict(patient)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(patient.id.clone(), minutes);
        Ok(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_predict_minutes_rounds_up() {
        let p = Patient::new("P1", "General");
        assert_eq!(predict_minutes(&FixedDuration(90.2), &p).unwrap(), 91);
        assert_eq!(predict_minutes(&FixedDuration(90.0), &p).unwrap(), 90);
        assert_eq!(predict_minutes(&FixedDuration::default(), &p).unwrap(), 120);
    }

    #[test]
    fn test_predict_minutes_rejects_non_positive() {
        let p = Patient::new("P1", "General");
        for bad in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = predict_minutes(&FixedDuration(bad), &p).unwrap_err();
            assert!(matches!(err, PredictionError::NonPositive { .. }));
            assert_eq!(err.patient_id(), "P1");
        }
    }

    #[test]
    fn test_predict_minutes_rejects_absurd_length() {
        let p = Patient::new("P1", "General");
        let week = MAX_PREDICTED_MINUTES as f64;
        assert_eq!(predict_minutes(&FixedDuration(week), &p).unwrap(), MAX_PREDICTED_MINUTES);
        for bad in [week + 0.5, 1e19, f64::MAX] {
            let err = predict_minutes(&FixedDuration(bad), &p).unwrap_err();
            assert!(matches!(err, PredictionError::TooLong { limit: MAX_PREDICTED_MINUTES, .. }));
        }
    }

    #[test]
    fn test_duration_table() {
        let table = DurationTable::new().with("P1", 45.0);
        assert_eq!(table.predict(&Patient::new("P1", "General")).unwrap(), 45.0);
        assert!(table.predict(&Patient::new("P2", "General")).is_err());

        let table = table.with_fallback(60.0);
        assert_eq!(table.predict(&Patient::new("P2", "General")).unwrap(), 60.0);
    }

    #[test]
    fn test_closure_predictor() {
        let by_asa = |p: &Patient| -> Result<f64, PredictionError> { Ok(30.0 * p.asa_score as f64) };
        let p = Patient::new("P1", "General").with_asa(3);
        assert_eq!(predict_minutes(&by_asa, &p).unwrap(), 90);
    }

    #[test]
    fn test_cached_predictor_calls_once() {
        let calls = AtomicUsize::new(0);
        let counting = |_: &Patient| -> Result<f64, PredictionError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(75.0)
        };
        let cached = CachedPredictor::new(counting);
        let p = Patient::new("P1", "General");

        assert_eq!(cached.predict(&p).unwrap(), 75.0);
        assert_eq!(cached.predict(&p).unwrap(), 75.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.cached_len(), 1);
    }
}
