//! Layered configuration loading and its effect on the pipeline.

use super::test_utils::{sixty_minute_context, valid_reply, EnvGuard, ScriptedTransport, Step};
use lessonforge::config::{ConfigLoader, ProviderType, ValidationError};
use lessonforge::gateway::PromptKind;
use lessonforge::pipeline::{Coordinator, StageKind};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn write_workspace_config(workspace: &std::path::Path, name: &str, contents: &str) {
    let dir = workspace.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn environment_overrides_workspace_file() {
    let temp = TempDir::new().unwrap();
    let mut env = EnvGuard::isolated(&temp);
    write_workspace_config(
        temp.path(),
        "config.toml",
        r#"
[provider]
provider_type = "ollama"
model = "llama3"

[pipeline]
max_attempts = 2
"#,
    );
    env.set("LESSONFORGE__PIPELINE__MAX_ATTEMPTS", Some("4"));
    env.set("LESSONFORGE__PROVIDER__MODEL", Some("mistral"));

    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.provider.provider_type, ProviderType::Ollama);
    assert_eq!(config.provider.model, "mistral");
    assert_eq!(config.pipeline.max_attempts, 4);
    assert!(config.validate().is_ok());
}

#[test]
fn global_file_applies_beneath_workspace_file() {
    let temp = TempDir::new().unwrap();
    let _env = EnvGuard::isolated(&temp);
    let global = temp.path().join("xdg").join("lessonforge");
    std::fs::create_dir_all(&global).unwrap();
    std::fs::write(
        global.join("config.toml"),
        "[logging]\nlevel = \"debug\"\n\n[pipeline]\nplan_timeout_secs = 20\n",
    )
    .unwrap();
    write_workspace_config(temp.path(), "config.toml", "[pipeline]\nplan_timeout_secs = 40\n");

    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.pipeline.plan_timeout_secs, 40);
    assert_eq!(
        config.pipeline.settings().plan_timeout,
        Duration::from_secs(40)
    );
}

#[test]
fn invalid_values_are_all_reported() {
    let temp = TempDir::new().unwrap();
    let _env = EnvGuard::isolated(&temp);
    write_workspace_config(
        temp.path(),
        "config.toml",
        r#"
[provider]
provider_type = "local_custom"

[pipeline]
content_timeout_secs = 0

[logging]
output = "syslog"
"#,
    );

    let config = ConfigLoader::load(temp.path()).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 3, "{errors:?}");
    assert!(matches!(errors[0], ValidationError::Provider(_)));
    assert!(matches!(errors[1], ValidationError::Pipeline(_)));
    assert!(matches!(errors[2], ValidationError::Logging(_)));
}

#[tokio::test(start_paused = true)]
async fn configured_attempts_bound_gateway_retries() {
    let config = {
        let temp = TempDir::new().unwrap();
        let _env = EnvGuard::isolated(&temp);
        write_workspace_config(
            temp.path(),
            "config.toml",
            "[pipeline]\nmax_attempts = 1\nvalidator_timeout_secs = 30\n",
        );
        ConfigLoader::load(temp.path()).unwrap()
    };

    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Review { .. } => Step::Hang,
        _ => Step::Reply(valid_reply(kind)),
    }));
    let coordinator = Coordinator::new(
        transport.clone(),
        config.pipeline.retry_policy(),
        config.pipeline.settings(),
    );

    let started = tokio::time::Instant::now();
    let output = coordinator.generate(&sixty_minute_context()).await.unwrap();

    assert!(started.elapsed() <= Duration::from_secs(31));
    assert!(output.fallback_stages.contains(&StageKind::Design));
    assert_eq!(
        transport.calls_for(PromptKind::Review {
            rubric: lessonforge::lesson::RubricKind::Design
        }),
        1
    );
}
