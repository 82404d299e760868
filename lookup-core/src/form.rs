//! Single-field lookup form and its submission state machine.
//!
//! `Idle -> Submitting -> {Succeeded, Failed}`. A settled form goes back to
//! `Idle` through [`FormController::dismiss`], or straight to `Submitting`
//! on the next submission, which drops the previous result.

use chrono::{DateTime, Utc};

use crate::{
    client::WeatherLookup,
    error::{FormError, LookupError},
};

pub const SUCCESS_MESSAGE: &str = "Weather lookup successful!";
pub const REJECTED_FALLBACK_MESSAGE: &str = "Failed to submit weather lookup";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error: Could not connect to the server";

pub const SUBMIT_LABEL: &str = "Submit Weather Lookup";
pub const SUBMITTING_LABEL: &str = "Submitting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Id,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Id => "ID",
        }
    }
}

impl TryFrom<&str> for FormField {
    type Error = FormError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ID" => Ok(FormField::Id),
            _ => Err(FormError::UnknownField(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub id: String,
}

impl FormState {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Id => &self.id,
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Id => self.id = value,
        }
    }
}

/// Outcome of the last submission, as shown in the result panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    /// Raw JSON body of a successful lookup, fed to the normalizer.
    pub payload: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl SubmissionResult {
    pub fn from_outcome(outcome: Result<String, LookupError>) -> Self {
        let completed_at = Utc::now();

        match outcome {
            Ok(payload) => Self {
                success: true,
                message: SUCCESS_MESSAGE.to_string(),
                payload: Some(payload),
                completed_at,
            },
            Err(LookupError::Rejected { detail, .. }) => Self {
                success: false,
                message: detail.unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_string()),
                payload: None,
                completed_at,
            },
            Err(LookupError::Network { .. } | LookupError::InvalidPayload { .. }) => Self {
                success: false,
                message: NETWORK_ERROR_MESSAGE.to_string(),
                payload: None,
                completed_at,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(SubmissionResult),
    Failed(SubmissionResult),
}

#[derive(Debug)]
pub struct FormController<L> {
    lookup: L,
    form: FormState,
    state: SubmissionState,
}

impl<L> FormController<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup, form: FormState::default(), state: SubmissionState::Idle }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SubmissionState::Submitting)
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        match &self.state {
            SubmissionState::Succeeded(r) | SubmissionState::Failed(r) => Some(r),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_submitting() { SUBMITTING_LABEL } else { SUBMIT_LABEL }
    }

    /// Update a field by its form name. No validation happens here.
    pub fn on_input_change(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let field = FormField::try_from(name)?;
        self.form.set(field, value.into());
        Ok(())
    }

    /// Enter `Submitting`, clearing any previous result.
    ///
    /// Returns the ID to look up.
    pub fn begin_submit(&mut self) -> Result<String, FormError> {
        if self.is_submitting() {
            return Err(FormError::AlreadySubmitting);
        }
        if self.form.id.is_empty() {
            return Err(FormError::MissingId);
        }

        self.state = SubmissionState::Submitting;
        tracing::debug!("Submitting weather lookup for '{}'", self.form.id);

        Ok(self.form.id.clone())
    }

    /// Settle the in-flight submission. This is the only way out of
    /// `Submitting`, whatever the outcome.
    pub fn finish(&mut self, outcome: Result<String, LookupError>) -> Result<SubmissionResult, FormError> {
        if !self.is_submitting() {
            return Err(FormError::NotSubmitting);
        }

        let result = SubmissionResult::from_outcome(outcome);

        self.state = if result.success {
            self.form = FormState::default();
            SubmissionState::Succeeded(result.clone())
        } else {
            tracing::debug!("Weather lookup failed: {}", result.message);
            SubmissionState::Failed(result.clone())
        };

        Ok(result)
    }

    /// Drop the shown result and return to `Idle`.
    pub fn dismiss(&mut self) {
        if !self.is_submitting() {
            self.state = SubmissionState::Idle;
        }
    }
}

/// Puts an abandoned submission back to `Idle` when the future driving it
/// is dropped before the lookup returns.
struct InFlight<'a> {
    state: &'a mut SubmissionState,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled && matches!(self.state, SubmissionState::Submitting) {
            tracing::debug!("Weather lookup abandoned before completion");
            *self.state = SubmissionState::Idle;
        }
    }
}

impl<L: WeatherLookup> FormController<L> {
    /// Run one full submission against the lookup service.
    ///
    /// Dropping the returned future mid-lookup leaves the form `Idle`.
    pub async fn submit(&mut self) -> Result<SubmissionResult, FormError> {
        let id = self.begin_submit()?;

        let mut in_flight = InFlight { state: &mut self.state, settled: false };
        let outcome = self.lookup.fetch(&id).await;
        in_flight.settled = true;
        drop(in_flight);

        self.finish(outcome)
    }
}
