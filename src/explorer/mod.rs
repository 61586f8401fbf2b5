//! Exploration orchestrator.
//!
//! Owns the cumulative tree, the active agent script and the call registry.
//! Completion notifications arrive through an mpsc queue drained by a single
//! task ([`Explorer::run`]), so only one notification is ever in the
//! processing pipeline at a time. Interrupts come through a separate
//! [`CancellationToken`] and preempt a pipeline that is still waiting on an
//! external service.
//!
//! Pipeline per completed call:
//! 1. Fetch the recording (failure ends this call)
//! 2. Transcribe (failure → empty transcript)
//! 3. Extract a tree fragment (malformed → empty fragment)
//! 4. Merge into the cumulative tree (malformed → unchanged)
//! 5. Persist the call artifact
//! 6. Record the recording reference for the summary
//!
//! Then: frontier left → place exactly one new call, else terminate.

pub mod call;
pub mod summary;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::artifacts::{ArtifactStore, CallArtifact, load_seed};
use crate::config::ExplorerConfig;
use crate::llm::{LlmConfig, create_provider};
use crate::prompts;
use crate::telephony::webhook::CallNotification;
use crate::telephony::{HttpTelephony, StartCallRequest, Telephony};
use crate::transcribe::{Transcriber, WhisperTranscriber};
use crate::tree::{DecisionTree, TreeBuilder, find_frontier_paths};

pub use call::{CallAttempt, CallRegistry, CallStatus};
pub use summary::{ExplorationSummary, TerminationReason};

/// Outcome of a single orchestrator step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing changed (unknown call, no recording, duplicate, or already stopped).
    Ignored,
    /// A new call was placed.
    CallPlaced { call_id: String },
    /// No new call placed, but other calls are still in flight.
    Waiting,
    Terminated(TerminationReason),
}

/// Run parameters that don't change during exploration.
#[derive(Debug, Clone)]
pub struct ExplorerSettings {
    /// Destination number of the agent under test.
    pub phone_number: String,
    /// Public callback address handed to the telephony service.
    pub webhook_url: String,
    /// Cap on placed calls. `None` explores until convergence.
    pub max_calls: Option<usize>,
}

/// External collaborators of the explorer.
pub struct ExplorerDeps {
    pub telephony: Arc<dyn Telephony>,
    pub transcriber: Arc<dyn Transcriber>,
    pub builder: TreeBuilder,
    pub store: ArtifactStore,
}

struct ExplorationState {
    tree: DecisionTree,
    script: String,
    calls: CallRegistry,
    recordings: Vec<String>,
    artifacts: Vec<String>,
}

pub struct Explorer {
    settings: ExplorerSettings,
    deps: ExplorerDeps,
    state: ExplorationState,
    summary: Option<ExplorationSummary>,
}

impl Explorer {
    /// Create an explorer, optionally continuing from a persisted tree.
    pub fn new(settings: ExplorerSettings, deps: ExplorerDeps, seed: Option<DecisionTree>) -> Self {
        let tree = seed.unwrap_or_default();
        let frontier = find_frontier_paths(&tree);
        let script = if frontier.is_empty() {
            prompts::INITIAL_AGENT_SCRIPT.to_string()
        } else {
            info!(frontier = frontier.len(), "Seed tree loaded, targeting its unknown branches");
            prompts::synthesize_next_script(&tree, &frontier)
        };

        Self {
            settings,
            deps,
            state: ExplorationState {
                tree,
                script,
                calls: CallRegistry::new(),
                recordings: Vec::new(),
                artifacts: Vec::new(),
            },
            summary: None,
        }
    }

    /// Wire the production collaborators from process configuration.
    ///
    /// Loads the seed tree (fatal if unreadable or unparsable) and creates the
    /// output directory.
    pub async fn from_config(config: &ExplorerConfig) -> crate::error::Result<Self> {
        let seed = match &config.seed_tree {
            Some(path) => {
                let tree = load_seed(path).await?;
                info!(path = %path.display(), nodes = tree.len(), "Seed tree loaded");
                Some(tree)
            }
            None => None,
        };

        let llm = create_provider(&LlmConfig {
            api_key: config.openai_api_key.clone(),
            model: config.model.clone(),
        })?;
        let store = ArtifactStore::new(config.output_dir.clone());
        store.ensure_dirs().await?;

        let deps = ExplorerDeps {
            telephony: Arc::new(HttpTelephony::new(
                config.api_token.clone(),
                config.start_call_url.clone(),
                config.recording_url.clone(),
            )),
            transcriber: Arc::new(
                WhisperTranscriber::new(config.openai_api_key.clone(), config.stt_model.clone())
                    .with_endpoint(config.stt_url.clone()),
            ),
            builder: TreeBuilder::new(llm),
            store,
        };
        Ok(Self::new(config.explorer_settings(), deps, seed))
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.state.tree
    }

    pub fn script(&self) -> &str {
        &self.state.script
    }

    pub fn calls(&self) -> &CallRegistry {
        &self.state.calls
    }

    pub fn is_terminated(&self) -> bool {
        self.summary.is_some()
    }

    pub fn summary(&self) -> Option<&ExplorationSummary> {
        self.summary.as_ref()
    }

    /// Place the first call.
    ///
    /// A seed tree with nothing left to explore terminates immediately.
    pub async fn begin(&mut self) -> Step {
        if self.is_terminated() {
            return Step::Ignored;
        }
        info!("Starting conversation exploration");

        if !self.state.tree.is_empty() && !self.state.tree.has_frontier() {
            info!("Seed tree has no unknown branches, nothing to explore");
            return self.terminate(TerminationReason::Converged).await;
        }
        self.place_call().await
    }

    /// Handle one completion notification from the telephony service.
    pub async fn on_call_completed(&mut self, call_id: &str, recording_available: bool) -> Step {
        if self.is_terminated() {
            info!(call_id = call_id, "Exploration finished, ignoring notification");
            return Step::Ignored;
        }

        if !recording_available {
            info!(call_id = call_id, "No recording available yet, ignoring notification");
            return Step::Ignored;
        }

        let Some(attempt) = self.state.calls.get_mut(call_id) else {
            warn!(call_id = call_id, "Notification for unknown call, ignoring");
            return Step::Ignored;
        };
        if attempt.status != CallStatus::Placed {
            warn!(call_id = call_id, status = ?attempt.status, "Duplicate notification, ignoring");
            return Step::Ignored;
        }
        attempt.transition(CallStatus::Completed);
        let correlation_id = attempt.correlation_id.clone();

        info!(call_id = call_id, correlation_id = %correlation_id, "Recording available, processing call");

        match self.process_call(call_id, &correlation_id).await {
            Ok(()) => {
                if let Some(attempt) = self.state.calls.get_mut(call_id) {
                    attempt.transition(CallStatus::Processed);
                }
                self.advance().await
            }
            Err(reason) => {
                if let Some(attempt) = self.state.calls.get_mut(call_id) {
                    attempt.transition(CallStatus::Failed);
                }
                self.halt_if_idle(reason).await
            }
        }
    }

    /// Build the final summary and stop accepting notifications.
    ///
    /// Calling this again returns the existing summary's reason.
    pub async fn terminate(&mut self, reason: TerminationReason) -> Step {
        if let Some(existing) = &self.summary {
            return Step::Terminated(existing.reason);
        }

        let unresolved = find_frontier_paths(&self.state.tree)
            .iter()
            .map(ToString::to_string)
            .collect();
        let summary = ExplorationSummary {
            reason,
            calls_placed: self.state.calls.len(),
            recordings: self.state.recordings.clone(),
            artifacts: self.state.artifacts.clone(),
            unresolved,
            final_tree: self.state.tree.clone(),
        };

        match self.deps.store.write_summary(&summary).await {
            Ok(path) => info!(path = %path.display(), "Summary saved"),
            Err(e) => error!(error = %e, "Failed to save summary"),
        }

        let failed = self
            .state
            .calls
            .iter()
            .filter(|attempt| attempt.status == CallStatus::Failed)
            .count();
        info!(reason = %reason, calls = summary.calls_placed, failed, "Exploration terminated");
        self.summary = Some(summary);
        Step::Terminated(reason)
    }

    /// Drain notifications until exploration terminates, then return the summary.
    ///
    /// This is the only consumer of the queue, which serializes all
    /// notification handling. Cancelling `shutdown` terminates with
    /// [`TerminationReason::Interrupted`] even mid-pipeline; the dropped
    /// pipeline leaves the remote call untouched.
    pub async fn run(
        mut self,
        mut notifications: mpsc::Receiver<CallNotification>,
        shutdown: CancellationToken,
    ) -> ExplorationSummary {
        let started = tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            _ = self.begin() => true,
        };
        if !started {
            info!("Shutdown requested before the first call was placed");
            self.terminate(TerminationReason::Interrupted).await;
        }

        while !self.is_terminated() {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    self.terminate(TerminationReason::Interrupted).await;
                    break;
                }
                next = notifications.recv() => next,
            };

            let Some(notification) = next else {
                warn!("Notification queue closed");
                self.terminate(TerminationReason::Interrupted).await;
                break;
            };
            debug!(call_id = %notification.id, status = %notification.status, "Dequeued notification");

            let handled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => false,
                _ = self.on_call_completed(&notification.id, notification.recording_available) => true,
            };
            if !handled {
                warn!(call_id = %notification.id, "Shutdown requested while processing call");
                self.terminate(TerminationReason::Interrupted).await;
            }
        }

        // Dropping the receiver here makes late notifications fail to enqueue.
        drop(notifications);
        self.into_summary()
    }

    fn into_summary(self) -> ExplorationSummary {
        let Self { summary, state, .. } = self;
        summary.unwrap_or_else(|| ExplorationSummary {
            reason: TerminationReason::Interrupted,
            calls_placed: state.calls.len(),
            recordings: state.recordings,
            artifacts: state.artifacts,
            unresolved: find_frontier_paths(&state.tree)
                .iter()
                .map(ToString::to_string)
                .collect(),
            final_tree: state.tree,
        })
    }

    /// Steps 1–6 of the pipeline. Only a retrieval failure is an error.
    async fn process_call(
        &mut self,
        call_id: &str,
        correlation_id: &str,
    ) -> Result<(), TerminationReason> {
        let audio = match self.deps.telephony.fetch_recording(call_id).await {
            Ok(audio) => audio,
            Err(e) => {
                error!(call_id = call_id, error = %e, "Failed to retrieve recording");
                return Err(TerminationReason::RetrievalFailed);
            }
        };

        let transcript = match self.deps.transcriber.transcribe(&audio).await {
            Ok(text) => text,
            Err(e) => {
                warn!(call_id = call_id, error = %e, "Transcription failed, continuing with empty transcript");
                String::new()
            }
        };
        debug!(call_id = call_id, transcript = %transcript, "Transcript");

        let fragment = self.deps.builder.extract(&transcript).await;
        let merged = self.deps.builder.merge(&self.state.tree, &fragment).await;
        self.state.tree = merged;
        info!(
            call_id = call_id,
            nodes = self.state.tree.len(),
            depth = self.state.tree.depth(),
            "Cumulative tree updated"
        );
        debug!(tree = %self.state.tree.to_pretty_json(), "Merged decision tree");

        if let Err(e) = self.deps.store.save_cumulative_tree(&self.state.tree).await {
            warn!(error = %e, "Failed to snapshot cumulative tree");
        }

        let recording_reference = self.deps.telephony.recording_reference(call_id);
        let artifact = CallArtifact {
            correlation_id: correlation_id.to_string(),
            call_id: call_id.to_string(),
            recording_reference: recording_reference.clone(),
            transcript,
            fragment,
            recorded_at: Utc::now(),
        };
        match self.deps.store.write_artifact(&artifact).await {
            Ok(_) => self.state.artifacts.push(correlation_id.to_string()),
            Err(e) => error!(correlation_id = correlation_id, error = %e, "Failed to persist call artifact"),
        }

        self.state.recordings.push(recording_reference);
        Ok(())
    }

    /// Decide between another call and termination.
    async fn advance(&mut self) -> Step {
        let frontier = find_frontier_paths(&self.state.tree);
        if frontier.is_empty() {
            info!("Tree complete");
            return self.terminate(TerminationReason::Converged).await;
        }

        if let Some(max) = self.settings.max_calls {
            if self.state.calls.len() >= max {
                warn!(max_calls = max, frontier = frontier.len(), "Call budget spent with unknown branches left");
                return self.terminate(TerminationReason::CallBudgetExhausted).await;
            }
        }

        info!(frontier = frontier.len(), "Decision tree contains unknown paths, initiating another call");
        self.state.script = prompts::synthesize_next_script(&self.state.tree, &frontier);
        self.place_call().await
    }

    async fn place_call(&mut self) -> Step {
        let correlation_id = Uuid::new_v4().to_string();
        let request = StartCallRequest {
            phone_number: self.settings.phone_number.clone(),
            prompt: self.state.script.clone(),
            webhook_url: self.settings.webhook_url.clone(),
        };

        match self.deps.telephony.start_call(&request).await {
            Ok(call_id) => {
                info!(call_id = %call_id, correlation_id = %correlation_id, "Call initiated");
                self.state.calls.insert(CallAttempt::new(
                    correlation_id,
                    call_id.clone(),
                    request.prompt,
                ));
                Step::CallPlaced { call_id }
            }
            Err(e) => {
                error!(correlation_id = %correlation_id, error = %e, "Failed to initiate call");
                self.halt_if_idle(TerminationReason::PlacementFailed).await
            }
        }
    }

    /// After a failure: stop if nothing else could still report back.
    async fn halt_if_idle(&mut self, reason: TerminationReason) -> Step {
        if self.state.calls.in_flight() == 0 {
            self.terminate(reason).await
        } else {
            Step::Waiting
        }
    }
}
