//! Conversion scheduler: one task per identity on a bounded worker pool.
//!
//! `request` and `cancel` are plain calls. Work is spawned on the runtime
//! captured at construction and gated by a semaphore with `max_workers`
//! permits. Every outcome reaches the UI through a single unbounded channel.
//!
//! A completing task checks, under the task-table lock, that its generation
//! is still the current one for its identity before it touches the cache or
//! the channel. Superseded and cancelled tasks leave no trace.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use super::pipeline_resolver::PipelineResolver;
use super::task_table::{ConversionTask, TaskTable};
use crate::adapters::cache::ConversionCache;
use crate::domain::models::{
    ContentSnapshot, ConversionRequest, ConversionUpdate, Explanation, PipelineResult,
    RequestTicket, SourceIdentity, TaskState,
};

/// State shared by the scheduler and its spawned tasks.
#[derive(Clone)]
struct Worker {
    cache: ConversionCache,
    resolver: Arc<PipelineResolver>,
    tasks: Arc<TaskTable>,
    permits: Arc<Semaphore>,
    updates: mpsc::UnboundedSender<ConversionUpdate>,
}

impl Worker {
    fn emit(&self, update: ConversionUpdate) {
        if self.updates.send(update).is_err() {
            tracing::trace!("update receiver dropped");
        }
    }

    async fn run(self, request: ConversionRequest, cancel: CancellationToken) {
        let identity = request.identity.clone();
        let generation = request.generation;

        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%identity, generation, "cancelled while waiting for a worker");
                return;
            }
            permit = self.permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::debug!(%identity, generation, "worker pool closed");
                    self.tasks.lock().abandon(&identity, generation);
                    return;
                }
            },
        };

        let outcome = AssertUnwindSafe(self.resolver.resolve(&request, &cancel))
            .catch_unwind()
            .await;
        drop(permit);

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(%identity, generation, %message, "conversion task panicked");
                PipelineResult::Failed(Explanation {
                    summary: format!("Conversion of {identity} failed unexpectedly"),
                    hints: vec![format!("internal error: {message}")],
                    ..Explanation::default()
                })
            }
        };

        if result.is_cancelled() || cancel.is_cancelled() {
            tracing::debug!(%identity, generation, "dropping cancelled result");
            return;
        }

        let mut slots = self.tasks.lock();
        if !slots.complete(&identity, generation) {
            tracing::debug!(%identity, generation, "dropping superseded result");
            return;
        }
        if let PipelineResult::Success(ref converted) = result {
            self.cache
                .store(&identity, request.snapshot, converted.clone());
        }
        tracing::info!(%identity, generation, status = result.status(), "conversion finished");
        self.emit(ConversionUpdate::Finished {
            identity,
            generation,
            result,
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Schedules conversions and delivers their outcomes.
pub struct ConversionScheduler {
    worker: Worker,
    runtime: Handle,
    generation: AtomicU64,
}

impl ConversionScheduler {
    /// Build a scheduler and the receiving end of its update channel.
    pub fn new(
        resolver: Arc<PipelineResolver>,
        cache: ConversionCache,
        max_workers: usize,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<ConversionUpdate>) {
        let (updates, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            worker: Worker {
                cache,
                resolver,
                tasks: Arc::new(TaskTable::new()),
                permits: Arc::new(Semaphore::new(max_workers.max(1))),
                updates,
            },
            runtime,
            generation: AtomicU64::new(0),
        };
        (scheduler, receiver)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn cache(&self) -> &ConversionCache {
        &self.worker.cache
    }

    /// Request the conversion of `identity` at `snapshot`.
    ///
    /// Any task already running for `identity` is cancelled first. A cache
    /// hit is answered on the channel right away without spawning work.
    pub fn request(
        &self,
        identity: SourceIdentity,
        snapshot: ContentSnapshot,
        text: Option<Arc<str>>,
    ) -> RequestTicket {
        let generation = self.next_generation();
        let ticket = RequestTicket {
            identity: identity.clone(),
            generation,
        };

        let mut slots = self.worker.tasks.lock();
        if let Some(previous) = slots.remove(&identity) {
            tracing::debug!(
                %identity,
                superseded = previous.generation,
                generation,
                "superseding running conversion"
            );
            previous.cancel();
        }

        if let Some(converted) = self.worker.cache.lookup(&identity, &snapshot) {
            tracing::debug!(%identity, generation, "serving conversion from cache");
            slots.settle(&identity, TaskState::Completed);
            self.worker.emit(ConversionUpdate::Finished {
                identity,
                generation,
                result: PipelineResult::Success(converted),
            });
            return ticket;
        }

        tracing::info!(%identity, generation, %snapshot, "scheduling conversion");
        self.worker.emit(ConversionUpdate::Loading {
            identity: identity.clone(),
            generation,
        });

        let cancel = CancellationToken::new();
        let request = ConversionRequest {
            identity: identity.clone(),
            snapshot,
            generation,
            text,
        };
        let handle = self
            .runtime
            .spawn(self.worker.clone().run(request, cancel.clone()));

        let task = ConversionTask::new(identity, generation, cancel).with_handle(handle);
        if let Some(displaced) = slots.replace(task) {
            displaced.cancel();
        }

        ticket
    }

    /// Deliver a failure for `identity` without running the pipeline.
    ///
    /// Used when the request could not even be snapshotted. Never cached.
    pub fn deliver_failure(&self, identity: SourceIdentity, explanation: Explanation) -> RequestTicket {
        let generation = self.next_generation();
        let mut slots = self.worker.tasks.lock();
        if let Some(previous) = slots.remove(&identity) {
            previous.cancel();
        }
        slots.settle(&identity, TaskState::Completed);

        tracing::warn!(%identity, generation, summary = %explanation.summary, "conversion failed before scheduling");
        self.worker.emit(ConversionUpdate::Finished {
            identity: identity.clone(),
            generation,
            result: PipelineResult::Failed(explanation),
        });
        RequestTicket {
            identity,
            generation,
        }
    }

    /// Cancel the pending conversion for `identity`.
    ///
    /// Returns whether a task was in flight. The cache entry is invalidated
    /// only in that case; `Dismissed` is emitted either way.
    pub fn cancel(&self, identity: &SourceIdentity) -> bool {
        let mut slots = self.worker.tasks.lock();
        let was_running = slots.cancel(identity);
        if was_running {
            self.worker.cache.invalidate(identity);
        }
        tracing::debug!(%identity, was_running, "conversion cancelled");
        self.worker.emit(ConversionUpdate::Dismissed {
            identity: identity.clone(),
        });
        was_running
    }

    /// Cancel any work for `identity` and drop its cached conversion.
    pub fn evict(&self, identity: &SourceIdentity) {
        self.cancel(identity);
        self.worker.cache.evict(identity);
        self.worker.tasks.lock().forget(identity);
    }

    pub fn state(&self, identity: &SourceIdentity) -> TaskState {
        self.worker.tasks.lock().state(identity)
    }

    /// Number of tasks currently registered, waiting or running.
    pub fn in_flight(&self) -> usize {
        self.worker.tasks.lock().in_flight()
    }

    /// Cancel everything and wait for spawned tasks to wind down.
    pub async fn shutdown(&self) {
        let drained = self.worker.tasks.lock().drain();
        self.worker.permits.close();
        tracing::info!(cancelled = drained.len(), "shutting down conversion scheduler");

        for task in drained {
            task.cancel();
            if let Some(handle) = task.handle {
                if let Err(error) = handle.await {
                    tracing::warn!(task_id = %task.id, %error, "conversion task ended abnormally");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tools::{MockAssembler, MockDecompiler};
    use crate::domain::ports::{Assembler, Decompiler};
    use crate::services::project_layout::ProjectLayout;
    use std::time::Duration;
    use tempfile::TempDir;

    const MAIN_SMALI: &str = ".class public Lcom/example/Main;\n.super Ljava/lang/Object;\n";

    struct Harness {
        _dir: TempDir,
        identity: SourceIdentity,
        scheduler: ConversionScheduler,
        updates: mpsc::UnboundedReceiver<ConversionUpdate>,
    }

    fn harness(assembler: Arc<dyn Assembler>, decompiler: Arc<dyn Decompiler>) -> Harness {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app/smali/com/example/Main.smali");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, MAIN_SMALI).unwrap();

        let resolver = Arc::new(PipelineResolver::new(
            assembler,
            decompiler,
            ProjectLayout::default(),
        ));
        let (scheduler, updates) =
            ConversionScheduler::new(resolver, ConversionCache::new(), 2, Handle::current());
        Harness {
            _dir: dir,
            identity: SourceIdentity::new(file),
            scheduler,
            updates,
        }
    }

    impl Harness {
        fn request(&self, text: &str) -> RequestTicket {
            self.scheduler.request(
                self.identity.clone(),
                ContentSnapshot::of_text(text),
                Some(Arc::from(text)),
            )
        }

        async fn next(&mut self) -> ConversionUpdate {
            tokio::time::timeout(Duration::from_secs(5), self.updates.recv())
                .await
                .expect("timed out waiting for update")
                .expect("channel closed")
        }

        async fn finished(&mut self) -> (u64, PipelineResult) {
            loop {
                if let ConversionUpdate::Finished {
                    generation, result, ..
                } = self.next().await
                {
                    return (generation, result);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_request_emits_loading_then_finished() {
        let mut h = harness(Arc::new(MockAssembler::new()), Arc::new(MockDecompiler::new()));
        let ticket = h.request(MAIN_SMALI);

        let loading = h.next().await;
        assert!(matches!(loading, ConversionUpdate::Loading { .. }));
        assert!(loading.matches(&ticket));

        let (generation, result) = h.finished().await;
        assert_eq!(generation, ticket.generation);
        assert!(result.is_success());
        assert_eq!(h.scheduler.state(&h.identity), TaskState::Completed);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_pipeline() {
        let assembler = Arc::new(MockAssembler::new());
        let mut h = harness(assembler.clone(), Arc::new(MockDecompiler::new()));

        h.request(MAIN_SMALI);
        h.finished().await;
        assert_eq!(assembler.calls(), 1);

        let ticket = h.request(MAIN_SMALI);
        let update = h.next().await;
        assert!(update.matches(&ticket));
        assert!(matches!(
            update,
            ConversionUpdate::Finished {
                result: PipelineResult::Success(_),
                ..
            }
        ));
        assert_eq!(assembler.calls(), 1);
        assert_eq!(h.scheduler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancel_drops_result_and_emits_dismissed() {
        let mut h = harness(
            Arc::new(MockAssembler::new().with_delay(Duration::from_secs(30))),
            Arc::new(MockDecompiler::new()),
        );
        h.request(MAIN_SMALI);
        assert!(matches!(h.next().await, ConversionUpdate::Loading { .. }));

        assert!(h.scheduler.cancel(&h.identity));
        assert!(matches!(h.next().await, ConversionUpdate::Dismissed { .. }));
        assert_eq!(h.scheduler.state(&h.identity), TaskState::Cancelled);
        assert_eq!(h.scheduler.in_flight(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.updates.try_recv().is_err());
        assert!(!h.scheduler.cache().contains(&h.identity));
    }

    #[tokio::test]
    async fn test_cancel_without_task_keeps_cache() {
        let mut h = harness(Arc::new(MockAssembler::new()), Arc::new(MockDecompiler::new()));
        h.request(MAIN_SMALI);
        h.finished().await;

        assert!(!h.scheduler.cancel(&h.identity));
        assert!(h.scheduler.cache().contains(&h.identity));
    }

    #[tokio::test]
    async fn test_panic_becomes_failed() {
        let mut h = harness(
            Arc::new(MockAssembler::panicking("boom")),
            Arc::new(MockDecompiler::new()),
        );
        h.request(MAIN_SMALI);

        let (_, result) = h.finished().await;
        let PipelineResult::Failed(explanation) = result else {
            panic!("expected Failed, got {result:?}");
        };
        assert!(explanation.hints.iter().any(|hint| hint.contains("boom")));
        assert!(!h.scheduler.cache().contains(&h.identity));
    }

    #[tokio::test]
    async fn test_deliver_failure_is_not_cached() {
        let mut h = harness(Arc::new(MockAssembler::new()), Arc::new(MockDecompiler::new()));
        let ticket = h
            .scheduler
            .deliver_failure(h.identity.clone(), Explanation::new("file vanished"));

        let update = h.next().await;
        assert!(update.matches(&ticket));
        assert!(matches!(
            update,
            ConversionUpdate::Finished {
                result: PipelineResult::Failed(_),
                ..
            }
        ));
        assert!(!h.scheduler.cache().contains(&h.identity));
    }

    #[tokio::test]
    async fn test_evict_clears_cache_and_state() {
        let mut h = harness(Arc::new(MockAssembler::new()), Arc::new(MockDecompiler::new()));
        h.request(MAIN_SMALI);
        h.finished().await;

        h.scheduler.evict(&h.identity);
        assert!(!h.scheduler.cache().contains(&h.identity));
        assert_eq!(h.scheduler.state(&h.identity), TaskState::Idle);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_running_tasks() {
        let mut h = harness(
            Arc::new(MockAssembler::new().with_delay(Duration::from_secs(30))),
            Arc::new(MockDecompiler::new()),
        );
        h.request(MAIN_SMALI);
        assert!(matches!(h.next().await, ConversionUpdate::Loading { .. }));

        h.scheduler.shutdown().await;
        assert_eq!(h.scheduler.in_flight(), 0);
        assert!(h.updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_request_after_shutdown_does_not_stay_running() {
        let mut h = harness(Arc::new(MockAssembler::new()), Arc::new(MockDecompiler::new()));
        h.scheduler.shutdown().await;

        h.request(MAIN_SMALI);
        assert!(matches!(h.next().await, ConversionUpdate::Loading { .. }));

        for _ in 0..100 {
            if h.scheduler.in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.scheduler.in_flight(), 0);
        assert_eq!(h.scheduler.state(&h.identity), TaskState::Cancelled);
        assert!(h.updates.try_recv().is_err());
    }

    #[test]
    fn test_panic_message_variants() {
        let text: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(text.as_ref()), "static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
