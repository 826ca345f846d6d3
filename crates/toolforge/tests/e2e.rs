// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-stack lifecycle runs: scripted model replies, a real SQLite store
//! and a real Python interpreter. Skipped when `python3` is not installed.

use std::sync::Arc;

use serde_json::json;
use toolforge_config::{RuntimeConfig, StorageConfig};
use toolforge_core::{Invocation, ToolStoreAdapter};
use toolforge_embedding::HashingEmbedder;
use toolforge_lifecycle::{LifecycleSettings, ToolManager};
use toolforge_sandbox::PythonRuntime;
use toolforge_storage::{Database, ToolStore};
use toolforge_test_utils::{MockProvider, proposal_reply};

struct Stack {
    manager: ToolManager,
    provider: Arc<MockProvider>,
    store: Arc<ToolStore>,
    _dir: tempfile::TempDir,
}

async fn stack(replies: Vec<String>) -> Option<Stack> {
    let available = std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success());
    if !available {
        eprintln!("python3 not found on PATH, skipping");
        return None;
    }

    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&StorageConfig {
        database_path: dir.path().join("tools.db").to_string_lossy().to_string(),
        wal_mode: true,
    })
    .await
    .unwrap();
    let store = Arc::new(ToolStore::new(db, Arc::new(HashingEmbedder::new(256))));
    let provider = Arc::new(MockProvider::with_responses(replies));
    let runtime = Arc::new(PythonRuntime::new(&RuntimeConfig::default()).unwrap());
    let manager = ToolManager::new(
        provider.clone(),
        store.clone(),
        runtime,
        LifecycleSettings::default(),
    );
    Some(Stack {
        manager,
        provider,
        store,
        _dir: dir,
    })
}

#[tokio::test]
async fn created_tool_runs_and_is_reused() {
    let Some(stack) = stack(vec![proposal_reply(
        "double",
        "def double(x):\n    return x * 2\n",
        "Doubles a number.",
    )])
    .await
    else {
        return;
    };
    let call = Invocation::positional(vec![json!(21)]);

    let first = stack
        .manager
        .use_or_create("double a number", &call, 2.0, true, 1)
        .await;
    assert_eq!(first.result, Some(json!(42)));
    assert!(first.error.is_none());

    let second = stack
        .manager
        .use_or_create("double a number", &call, 2.0, true, 1)
        .await;
    assert_eq!(second.result, Some(json!(42)));
    assert_eq!(stack.provider.request_count().await, 1);
}

#[tokio::test]
async fn failing_tool_is_repaired_and_rerun() {
    let Some(stack) = stack(vec![
        proposal_reply(
            "mean",
            "def mean(xs):\n    return sum(xs) / 0\n",
            "Average of a list.",
        ),
        proposal_reply(
            "mean",
            "def mean(xs):\n    return sum(xs) / len(xs)\n",
            "Average of a list.",
        ),
    ])
    .await
    else {
        return;
    };
    let record = stack.manager.create("average of a list").await.unwrap();
    assert_eq!(record.version, 1);

    let outcome = stack
        .manager
        .execute("mean", &Invocation::positional(vec![json!([2, 4])]), true, 1)
        .await;
    assert_eq!(outcome.result, Some(json!(3.0)));

    let stored = stack.store.get("mean").await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert!(stored.error_log.is_empty());
    assert!(
        stack.provider.requests().await[1].messages[0]
            .content
            .contains("ZeroDivisionError")
    );
}

#[tokio::test]
async fn repair_with_broken_syntax_is_rejected() {
    let Some(stack) = stack(vec![
        proposal_reply("boom", "def boom():\n    raise ValueError('no')\n", "Fails."),
        proposal_reply("boom", "def boom(:\n    return 1\n", "Fails."),
    ])
    .await
    else {
        return;
    };
    stack.manager.create("something that fails").await.unwrap();

    let outcome = stack
        .manager
        .execute("boom", &Invocation::default(), true, 1)
        .await;
    let error = outcome.error.unwrap();
    assert!(error.starts_with("Original Error:\n"));
    assert!(error.contains("ValueError: no"));
    assert!(error.contains("Repair Failed:"));

    let stored = stack.store.get("boom").await.unwrap().unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.error_log.len(), 1);
}
