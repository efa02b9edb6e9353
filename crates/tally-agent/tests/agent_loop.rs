// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop behavior against the mock channel.

use std::time::Duration;

use tally_core::TallyError;
use tally_core::types::{EventKind, SessionId};
use tally_test_utils::{TestHarness, event};

const USER: i64 = 100;
const OPS: i64 = -500;

async fn wait_for_sends(harness: &TestHarness, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.mock_channel.sent_count().await < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for outbound messages");
}

#[tokio::test]
async fn loop_answers_start_and_registers_input() {
    let harness = TestHarness::builder()
        .with_seller("ana", "1234", "Ana")
        .build()
        .await
        .unwrap();
    let agent = harness.agent_loop(None, Duration::from_millis(10));
    let cancel = tokio_util::sync::CancellationToken::new();

    harness
        .mock_channel
        .inject(event(USER, EventKind::Command("start".into())))
        .await;

    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { agent.run(cancel).await })
    };
    wait_for_sends(&harness, 1).await;
    cancel.cancel();
    run.await.unwrap();

    let sent = harness.mock_channel.sent_messages().await;
    assert_eq!(sent[0].session_id, SessionId::from(USER));
    assert_eq!(sent[0].choices[0].token, "login");
    assert_eq!(
        harness.mock_channel.registered().await,
        vec![SessionId::from(USER)]
    );
}

#[tokio::test]
async fn receive_error_is_reported_and_loop_continues() {
    let harness = TestHarness::builder().build().await.unwrap();
    let agent = harness.agent_loop(Some(OPS), Duration::from_millis(10));
    let cancel = tokio_util::sync::CancellationToken::new();

    harness
        .mock_channel
        .inject_error(TallyError::Channel {
            message: "network unreachable".into(),
            source: None,
        })
        .await;
    harness
        .mock_channel
        .inject(event(USER, EventKind::Command("start".into())))
        .await;

    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { agent.run(cancel).await })
    };
    wait_for_sends(&harness, 2).await;
    cancel.cancel();
    run.await.unwrap();

    let ops = harness.mock_channel.sent_to(&SessionId::from(OPS)).await;
    assert!(ops[0].text.starts_with("[WARNING]"));
    assert!(ops[0].text.contains("network unreachable"));
    assert_eq!(harness.mock_channel.sent_to(&SessionId::from(USER)).await.len(), 1);
}

#[tokio::test]
async fn ops_notes_reach_ops_chat() {
    let harness = TestHarness::builder()
        .with_seller("ana", "1234", "Ana")
        .build()
        .await
        .unwrap();
    let agent = harness.agent_loop(Some(OPS), Duration::from_millis(10));

    let actions = harness.login(USER, "ana", "1234").await;
    agent.execute(actions).await;

    let ops = harness.mock_channel.sent_to(&SessionId::from(OPS)).await;
    assert_eq!(ops.len(), 1);
    assert!(ops[0].text.starts_with("[INFO]"));
    assert!(ops[0].text.contains("ana"));
}

#[tokio::test]
async fn cancellation_stops_idle_loop() {
    let harness = TestHarness::builder().build().await.unwrap();
    let agent = harness.agent_loop(None, Duration::from_millis(10));
    let cancel = tokio_util::sync::CancellationToken::new();

    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { agent.run(cancel).await })
    };
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("loop did not stop")
        .unwrap();
}
