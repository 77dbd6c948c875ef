use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::exam::engine::{ExamEngine, TickOutcome};
use crate::results::ResultRecorder;

/// Background driver that advances an engine once per second.
///
/// The task stops on its own after an automatic submission or once the
/// engine leaves the answering phase. Dropping the handle aborts the
/// task, so a disposed attempt can never tick again.
pub struct Countdown {
    handle: tokio::task::JoinHandle<()>,
}

impl Countdown {
    pub(crate) fn spawn(
        engine: Arc<Mutex<ExamEngine>>,
        recorder: Arc<dyn ResultRecorder>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // the first interval tick fires immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let outcome = match engine.lock() {
                    Ok(mut engine) => engine.tick(),
                    Err(_) => {
                        tracing::error!("engine lock poisoned, stopping countdown");
                        return;
                    }
                };

                match outcome {
                    TickOutcome::Counting { .. } => {}
                    TickOutcome::AutoSubmitted(result) => {
                        if let Err(e) = recorder.record(&result).await {
                            tracing::error!(error = %e, "failed to record auto-submitted result");
                        }
                        return;
                    }
                    TickOutcome::Idle => return,
                }
            }
        });

        Self { handle }
    }

    /// Stop the driver. Safe to call more than once.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::KvResultRecorder;
    use exam_core::model::{Category, ExamVariant, Question, Stem};
    use exam_core::time::fixed_clock;
    use storage::repository::MemoryKv;

    fn engine(seconds: u32) -> Arc<Mutex<ExamEngine>> {
        let questions = vec![
            Question::new("q1", Category::Geometry, Stem::new("?")).with_answer("A"),
        ];
        let mut engine =
            ExamEngine::new("Lan", ExamVariant::Preliminary, questions, fixed_clock()).unwrap();
        while engine.seconds_remaining() > seconds {
            let _ = engine.tick();
        }
        Arc::new(Mutex::new(engine))
    }

    #[tokio::test(start_paused = true)]
    async fn drives_one_tick_per_second() {
        let engine = engine(30);
        let recorder = Arc::new(KvResultRecorder::new(Arc::new(MemoryKv::new())));
        let countdown = Countdown::spawn(Arc::clone(&engine), recorder);

        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        assert_eq!(engine.lock().unwrap().seconds_remaining(), 25);
        countdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn records_result_on_expiry_and_stops() {
        let engine = engine(3);
        let recorder = Arc::new(KvResultRecorder::new(Arc::new(MemoryKv::new())));
        let countdown =
            Countdown::spawn(Arc::clone(&engine), Arc::clone(&recorder) as Arc<dyn ResultRecorder>);

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;

        assert!(engine.lock().unwrap().phase().is_scored());
        let listed = recorder.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name(), "Lan");
        assert!(countdown.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_countdown_stops_ticking() {
        let engine = engine(30);
        let recorder = Arc::new(KvResultRecorder::new(Arc::new(MemoryKv::new())));
        let countdown = Countdown::spawn(Arc::clone(&engine), recorder);

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        countdown.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;

        assert_eq!(engine.lock().unwrap().seconds_remaining(), 28);
    }
}
