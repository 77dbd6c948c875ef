use rand::Rng;
use std::sync::{Arc, Mutex};

use exam_core::Clock;
use exam_core::model::ExamVariant;

use crate::error::ExamError;
use crate::exam::engine::{ExamEngine, SubmitConfirm, SubmitOutcome};
use crate::exam::timer::Countdown;
use crate::results::ResultRecorder;
use crate::sampler::{SampleSpec, Sampler};

/// One live exam attempt: the shared engine plus its countdown driver.
///
/// The countdown is armed separately so a host can render the loaded
/// questions before the clock starts.
pub struct ExamAttempt {
    engine: Arc<Mutex<ExamEngine>>,
    countdown: Option<Countdown>,
}

impl ExamAttempt {
    /// Shared handle for hosts that drive the engine directly.
    #[must_use]
    pub fn engine(&self) -> Arc<Mutex<ExamEngine>> {
        Arc::clone(&self.engine)
    }

    /// Run a closure against the locked engine.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::LockPoisoned` if a previous holder panicked.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut ExamEngine) -> T) -> Result<T, ExamError> {
        let mut engine = self.engine.lock().map_err(|_| ExamError::LockPoisoned)?;
        Ok(f(&mut engine))
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }
}

/// Orchestrates the full attempt lifecycle: load and assemble, arm the
/// countdown, submit, record, dispose.
pub struct ExamLoopService {
    sampler: Sampler,
    recorder: Arc<dyn ResultRecorder>,
    clock: Clock,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(sampler: Sampler, recorder: Arc<dyn ResultRecorder>) -> Self {
        Self {
            sampler,
            recorder,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load a fresh randomized attempt for a variant.
    ///
    /// The attempt is in the loading state until this future resolves;
    /// the countdown is not armed yet.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if assembly fails or yields no questions.
    pub async fn start(
        &self,
        name: impl Into<String>,
        variant: ExamVariant,
    ) -> Result<ExamAttempt, ExamError> {
        let spec = SampleSpec::for_variant(variant);
        self.start_with(name, &spec, &mut rand::rng()).await
    }

    /// Load an attempt from an explicit sample spec and randomness
    /// source. Used by hosts that need reproducible assemblies.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if assembly fails or yields no questions.
    pub async fn start_with<R: Rng + ?Sized>(
        &self,
        name: impl Into<String>,
        spec: &SampleSpec,
        rng: &mut R,
    ) -> Result<ExamAttempt, ExamError> {
        let questions = self.sampler.assemble(spec, rng).await?;
        let engine = ExamEngine::new(name, spec.variant, questions, self.clock)?;
        tracing::info!(
            variant = %spec.variant,
            questions = engine.questions().len(),
            budget_secs = engine.seconds_remaining(),
            "attempt loaded"
        );

        Ok(ExamAttempt {
            engine: Arc::new(Mutex::new(engine)),
            countdown: None,
        })
    }

    /// Arm the one-second countdown driver. Re-arming replaces the
    /// previous driver.
    pub fn start_countdown(&self, attempt: &mut ExamAttempt) {
        attempt.stop_countdown();
        attempt.countdown = Some(Countdown::spawn(
            attempt.engine(),
            Arc::clone(&self.recorder),
        ));
    }

    /// Manual submission through the injected confirmation.
    ///
    /// On acceptance the countdown stops and the result is recorded
    /// exactly once. A declined confirmation changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if the engine lock is poisoned or the result
    /// cannot be persisted.
    pub async fn submit(
        &self,
        attempt: &mut ExamAttempt,
        confirm: &dyn SubmitConfirm,
    ) -> Result<SubmitOutcome, ExamError> {
        let outcome = attempt.with_engine(|engine| engine.submit(confirm))?;

        if let SubmitOutcome::Submitted(result) = &outcome {
            attempt.stop_countdown();
            self.recorder.record(result).await?;
        }

        Ok(outcome)
    }

    /// Tear down an attempt's countdown. Idempotent; an abandoned
    /// attempt produces no result and records nothing.
    pub fn dispose(&self, attempt: &mut ExamAttempt) {
        attempt.stop_countdown();
    }
}
