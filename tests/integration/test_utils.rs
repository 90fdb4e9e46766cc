//! Shared test utilities for integration tests
//!
//! A scripted transport that answers each prompt kind with canned replies or failures, JSON
//! builders for valid replies, and isolated environment setup for config tests.

use async_trait::async_trait;
use lessonforge::error::TransportError;
use lessonforge::gateway::{GenerativeTransport, PromptKind, PromptSpec, RawArtifact};
use lessonforge::lesson::{AudienceLevel, CognitiveLevel, GenerationContext, Grouping};
use lessonforge::pipeline::{Coordinator, PipelineSettings};
use lessonforge::gateway::RetryPolicy;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

/// What the transport does for one call.
pub enum Step {
    Reply(String),
    /// Reply after sleeping, to control the order in which concurrent calls finish.
    Delayed(Duration, String),
    Fail(TransportError),
    Hang,
}

type Route = dyn Fn(PromptKind, usize) -> Step + Send + Sync;

/// Transport driven by a routing function of (prompt kind, earlier calls of that kind).
pub struct ScriptedTransport {
    route: Box<Route>,
    calls: Mutex<Vec<PromptKind>>,
    completed: Mutex<Vec<PromptKind>>,
}

impl ScriptedTransport {
    pub fn new(route: impl Fn(PromptKind, usize) -> Step + Send + Sync + 'static) -> Self {
        Self {
            route: Box::new(route),
            calls: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with a valid reply.
    pub fn healthy() -> Self {
        Self::new(|kind, _| Step::Reply(valid_reply(kind)))
    }

    pub fn calls_for(&self, kind: PromptKind) -> usize {
        self.calls.lock().iter().filter(|k| **k == kind).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Prompt kinds in the order their replies were handed back.
    pub fn completion_order(&self) -> Vec<PromptKind> {
        self.completed.lock().clone()
    }
}

#[async_trait]
impl GenerativeTransport for ScriptedTransport {
    async fn call(
        &self,
        prompt: &PromptSpec,
        _deadline: Instant,
    ) -> Result<RawArtifact, TransportError> {
        let earlier = {
            let mut calls = self.calls.lock();
            let earlier = calls.iter().filter(|k| **k == prompt.kind).count();
            calls.push(prompt.kind);
            earlier
        };
        let result = match (self.route)(prompt.kind, earlier) {
            Step::Reply(body) => Ok(RawArtifact::new(body)),
            Step::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(RawArtifact::new(body))
            }
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        };
        self.completed.lock().push(prompt.kind);
        result
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn service_unavailable() -> Step {
    Step::Fail(TransportError::Status {
        status: 503,
        body: "overloaded".to_string(),
    })
}

pub fn bad_request() -> Step {
    Step::Fail(TransportError::Status {
        status: 400,
        body: "bad request".to_string(),
    })
}

pub fn valid_reply(kind: PromptKind) -> String {
    match kind {
        PromptKind::Plan => plan_json(),
        PromptKind::Content { grouping } => content_json(grouping),
        PromptKind::Refine { grouping } => refined_json(grouping),
        PromptKind::Review { rubric } => json!({
            "summary": format!("{} review", rubric),
            "recommendations": [{
                "principle": rubric.principles()[0],
                "priority": "low",
                "text": format!("Service suggestion for {}", rubric)
            }]
        })
        .to_string(),
    }
}

/// Plan reply covering every cognitive level, so it satisfies any requested subset.
pub fn plan_json() -> String {
    let objectives: Vec<_> = CognitiveLevel::ALL
        .iter()
        .map(|level| {
            json!({
                "level": level.as_str(),
                "statement": format!("Students will {} the cell cycle", level.verbs()[0]),
                "action_verb": level.verbs()[0],
                "content": "the cell cycle"
            })
        })
        .collect();
    let groupings: Vec<_> = Grouping::ALL
        .iter()
        .map(|grouping| {
            json!({
                "number": grouping.number(),
                "activities": [
                    format!("Class discussion for step {}", grouping.number()),
                    "Guided practice with a partner"
                ],
                "materials": ["Slides"],
                "assessment_strategy": "Observation"
            })
        })
        .collect();
    json!({
        "overview": {
            "title": "The Cell Cycle",
            "summary": "How cells grow and divide",
            "prerequisites": ["Cell structure"],
            "materials": ["Microscope images"]
        },
        "objectives": objectives,
        "groupings": groupings
    })
    .to_string()
}

/// Two one-minute units whose titles carry the grouping number.
pub fn content_json(grouping: Grouping) -> String {
    let units: Vec<_> = (0..2)
        .map(|index| {
            json!({
                "title": unit_title(grouping, index),
                "body": format!("# Step {}\n\n- What do you notice?", grouping.number()),
                "kind": "concept_explanation",
                "modalities": ["textual", "visual"],
                "duration_minutes": 1.0,
                "visuals": [{
                    "kind": "diagram",
                    "description": "Cell cycle wheel",
                    "alt_text": "Wheel showing the phases of the cell cycle"
                }],
                "key_points": ["Cells divide in phases"],
                "activities": ["Label the diagram"]
            })
        })
        .collect();
    json!({ "units": units }).to_string()
}

pub fn unit_title(grouping: Grouping, index: usize) -> String {
    format!("G{} unit {}", grouping.number(), index)
}

/// Three revised one-minute units with narration, replacing the originals.
pub fn refined_json(grouping: Grouping) -> String {
    let units: Vec<_> = (0..3)
        .map(|index| {
            json!({
                "title": refined_title(grouping, index),
                "body": format!("# Step {} revisited\n\n- Try it yourself", grouping.number()),
                "kind": "activity_guide",
                "modalities": ["textual", "auditory", "interactive"],
                "duration_minutes": 1.0,
                "narration": "Walk through the example aloud",
                "key_points": ["Practice each phase"],
                "activities": ["Sort the phase cards", "Explain to a partner"]
            })
        })
        .collect();
    json!({ "units": units }).to_string()
}

pub fn refined_title(grouping: Grouping, index: usize) -> String {
    format!("G{} refined {}", grouping.number(), index)
}

pub fn sixty_minute_context() -> GenerationContext {
    GenerationContext::new(
        "Biology 101",
        "The cell cycle",
        AudienceLevel::Junior,
        60,
        [CognitiveLevel::Understand, CognitiveLevel::Apply],
    )
    .unwrap()
}

pub fn coordinator(transport: Arc<ScriptedTransport>) -> Coordinator {
    Coordinator::new(
        transport,
        RetryPolicy::default(),
        PipelineSettings::default(),
    )
}

/// Environment variable state to restore after a config test.
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

impl EnvGuard {
    /// Serialize env access and point global config at an empty temp directory.
    pub fn isolated(temp: &TempDir) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut guard = Self {
            saved: Vec::new(),
            _lock: lock,
        };
        let xdg = temp.path().join("xdg");
        guard.set("XDG_CONFIG_HOME", Some(xdg.to_string_lossy().as_ref()));
        guard.set("LESSONFORGE_ENV", None);
        guard
    }

    pub fn set(&mut self, key: &str, value: Option<&str>) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), std::env::var(key).ok()));
        }
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}
