//! Integration tests for walkbridge
//!
//! These tests drive the public API end to end: transport frames in, consumer
//! calls out.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};
use walkbridge::consumer::spawn_consumer;
use walkbridge::dispatch::{DispatchConfig, DispatchHandle, DispatchQueue};
use walkbridge::transport::socket::{create_listener_at, serve};
use walkbridge::{MessageClient, SocketClient, WalkConsumer, WalkEvent, WalkReceiver, WalkSender};

/// Consumer that records every call it receives
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl WalkConsumer for Recorder {
    fn start_walk(&mut self, start_epoch_ms: u64, intensity: &str) {
        self.calls.push(format!("start_walk({start_epoch_ms},{intensity})"));
    }

    fn end_walk(&mut self, end_epoch_ms: u64, duration_sec: u32, intensity: &str) {
        self.calls.push(format!("end_walk({end_epoch_ms},{duration_sec},{intensity})"));
    }
}

/// Consumer that records (producer, sequence) pairs from `start_walk`
///
/// The intensity label carries the producer name.
#[derive(Default)]
struct SequenceRecorder {
    seen: Vec<(String, u64)>,
}

impl WalkConsumer for SequenceRecorder {
    fn start_walk(&mut self, start_epoch_ms: u64, intensity: &str) {
        self.seen.push((intensity.to_string(), start_epoch_ms));
    }

    fn end_walk(&mut self, _end_epoch_ms: u64, _duration_sec: u32, _intensity: &str) {}
}

async fn wait_for_accepted(dispatch: &DispatchHandle, expected: u64) {
    for _ in 0..100 {
        if dispatch.metrics().await.unwrap().accepted >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("dispatch queue never accepted {expected} events");
}

// =============================================================================
// Dispatch Queue Scenarios
// =============================================================================

#[tokio::test]
async fn test_events_before_bind_are_flushed_in_order() {
    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());

    dispatch.send_start(1000, "brisk");
    dispatch.send_end(5000, 300, "brisk");

    let metrics = dispatch.metrics().await.unwrap();
    assert_eq!(metrics.pending, 2);
    assert!(!metrics.is_bound());

    let (consumer, consumer_task) = spawn_consumer(Recorder::default());
    dispatch.bind(consumer);
    dispatch.send_start(9000, "slow");

    dispatch.shutdown();
    queue_task.await.unwrap();

    let recorder = consumer_task.await.unwrap();
    assert_eq!(
        recorder.calls,
        vec!["start_walk(1000,brisk)", "end_walk(5000,300,brisk)", "start_walk(9000,slow)"]
    );
}

#[tokio::test]
async fn test_unbind_buffers_until_rebind() {
    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());
    let (first, first_task) = spawn_consumer(Recorder::default());
    dispatch.bind(first);

    dispatch.send_start(1, "brisk");
    dispatch.unbind();
    dispatch.send_end(2, 60, "brisk");

    let first = first_task.await.unwrap();
    assert_eq!(first.calls, vec!["start_walk(1,brisk)"]);
    assert_eq!(dispatch.metrics().await.unwrap().pending, 1);

    let (second, second_task) = spawn_consumer(Recorder::default());
    dispatch.bind(second);
    dispatch.shutdown();
    queue_task.await.unwrap();

    let second = second_task.await.unwrap();
    assert_eq!(second.calls, vec!["end_walk(2,60,brisk)"]);
}

#[tokio::test]
async fn test_rebind_replaces_consumer() {
    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());
    let (first, first_task) = spawn_consumer(Recorder::default());
    let (second, second_task) = spawn_consumer(Recorder::default());

    dispatch.bind(first);
    dispatch.send_start(1, "brisk");
    dispatch.bind(second);
    dispatch.send_start(2, "slow");

    let metrics = dispatch.metrics().await.unwrap();
    assert_eq!(metrics.binds, 2);
    assert_eq!(metrics.delivered, 2);

    dispatch.shutdown();
    queue_task.await.unwrap();

    assert_eq!(first_task.await.unwrap().calls, vec!["start_walk(1,brisk)"]);
    assert_eq!(second_task.await.unwrap().calls, vec!["start_walk(2,slow)"]);
}

// =============================================================================
// Concurrent Producers and Binding
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch_and_rebinding_keeps_order() {
    const PRODUCERS: usize = 4;
    const EVENTS_PER_PRODUCER: u64 = 250;
    const BIND_CYCLES: usize = 25;

    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());

    // Producers on their own OS threads, each with an increasing sequence
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let dispatch = dispatch.clone();
            std::thread::spawn(move || {
                for seq in 0..EVENTS_PER_PRODUCER {
                    dispatch.send_start(seq, format!("p{id}"));
                    if seq % 16 == 0 {
                        std::thread::yield_now();
                    }
                }
            })
        })
        .collect();

    // Meanwhile keep swapping consumers in and out
    let binder = {
        let dispatch = dispatch.clone();
        tokio::spawn(async move {
            let mut consumers = Vec::new();
            for cycle in 0..BIND_CYCLES {
                let (consumer, task) = spawn_consumer(SequenceRecorder::default());
                dispatch.bind(consumer);
                consumers.push(task);
                tokio::task::yield_now().await;
                if cycle % 2 == 0 {
                    dispatch.unbind();
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            dispatch.unbind();
            consumers
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    let mut consumer_tasks = binder.await.unwrap();

    // Everything still pending goes to the final consumer
    let (last, last_task) = spawn_consumer(SequenceRecorder::default());
    dispatch.bind(last);
    consumer_tasks.push(last_task);

    let metrics = dispatch.metrics().await.unwrap();
    assert_eq!(metrics.accepted, PRODUCERS as u64 * EVENTS_PER_PRODUCER);
    assert_eq!(metrics.pending, 0);

    dispatch.shutdown();
    queue_task.await.unwrap();

    // Consumers were bound one after another, so their logs concatenate into
    // the global delivery order
    let mut delivered = Vec::new();
    for task in consumer_tasks {
        delivered.extend(task.await.unwrap().seen);
    }
    assert_eq!(delivered.len(), PRODUCERS * EVENTS_PER_PRODUCER as usize);

    for id in 0..PRODUCERS {
        let name = format!("p{id}");
        let sequence: Vec<u64> = delivered
            .iter()
            .filter(|(producer, _)| *producer == name)
            .map(|(_, seq)| *seq)
            .collect();
        let expected: Vec<u64> = (0..EVENTS_PER_PRODUCER).collect();
        assert_eq!(sequence, expected, "producer {name} lost, duplicated or reordered events");
    }
}

// =============================================================================
// End-to-End over the Socket Transport
// =============================================================================

#[tokio::test]
async fn test_socket_send_reaches_late_bound_consumer() {
    let temp = TempDir::new().unwrap();
    let socket_path = temp.path().join("handheld.sock");

    let (listener, _) = create_listener_at(&socket_path).unwrap();
    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());
    let (tx, rx) = mpsc::channel(8);
    let receiver = WalkReceiver::new(dispatch.clone());
    let receiver_task = tokio::spawn(receiver.clone().run(rx));
    let server = tokio::spawn(serve(listener, tx, 64 * 1024));

    let client = SocketClient::new(vec![socket_path.clone()]).with_timeout(Duration::from_secs(2));
    let sender = WalkSender::new(Arc::new(client));

    let report = sender.start_walk(1000, "brisk").await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.delivered, vec![socket_path.display().to_string()]);
    sender.end_walk(5000, 300, "brisk").await.unwrap();

    wait_for_accepted(&dispatch, 2).await;
    assert_eq!(dispatch.metrics().await.unwrap().pending, 2);

    let (consumer, consumer_task) = spawn_consumer(Recorder::default());
    dispatch.bind(consumer);

    server.abort();
    receiver_task.abort();
    dispatch.shutdown();
    queue_task.await.unwrap();

    let recorder = consumer_task.await.unwrap();
    assert_eq!(recorder.calls, vec!["start_walk(1000,brisk)", "end_walk(5000,300,brisk)"]);
    assert_eq!(receiver.stats().dispatched, 2);
}

#[tokio::test]
async fn test_socket_bad_payload_is_dropped() {
    let temp = TempDir::new().unwrap();
    let socket_path = temp.path().join("handheld.sock");

    let (listener, _) = create_listener_at(&socket_path).unwrap();
    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());
    let (tx, rx) = mpsc::channel(8);
    let receiver = WalkReceiver::new(dispatch.clone());
    let receiver_task = tokio::spawn(receiver.clone().run(rx));
    let server = tokio::spawn(serve(listener, tx, 64 * 1024));

    let client = SocketClient::new(vec![socket_path.clone()]);
    let node = socket_path.display().to_string();
    client
        .send_message(&node, "/walk/start", br#"{"startEpochMs":1000}"#)
        .await
        .unwrap();
    client
        .send_message(&node, "/walk/end", br#"{"endEpochMs":5000,"durationSec":300,"intensity":"slow"}"#)
        .await
        .unwrap();

    wait_for_accepted(&dispatch, 1).await;
    let stats = receiver.stats();
    assert_eq!(stats.received, 2);
    assert_eq!(stats.rejected, 1);

    let (consumer, consumer_task) = spawn_consumer(Recorder::default());
    dispatch.bind(consumer);

    server.abort();
    receiver_task.abort();
    dispatch.shutdown();
    queue_task.await.unwrap();

    assert_eq!(consumer_task.await.unwrap().calls, vec!["end_walk(5000,300,slow)"]);
}

#[tokio::test]
async fn test_acknowledged_frames_survive_listener_shutdown() {
    let temp = TempDir::new().unwrap();
    let socket_path = temp.path().join("handheld.sock");

    let (listener, _) = create_listener_at(&socket_path).unwrap();
    let (dispatch, queue_task) = DispatchQueue::spawn(DispatchConfig::default());
    let (tx, rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let receiver = WalkReceiver::new(dispatch.clone());

    // Hold the receiver back so acknowledged frames sit in the channel
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let receiver_task = tokio::spawn({
        let receiver = receiver.clone();
        async move {
            let _ = release_rx.await;
            receiver
                .run_until(rx, async {
                    let _ = stop_rx.await;
                })
                .await
        }
    });
    let server = tokio::spawn(serve(listener, tx, 64 * 1024));

    let sender = WalkSender::new(Arc::new(SocketClient::new(vec![socket_path.clone()])));
    for start in 1..=3 {
        let report = sender.start_walk(start, "brisk").await.unwrap();
        assert!(report.is_complete());
    }

    // Stop accepting, then ask the receiver to stop before it has seen anything
    server.abort();
    stop_tx.send(()).unwrap();
    release_tx.send(()).unwrap();

    let stats = receiver_task.await.unwrap();
    assert_eq!(stats.dispatched, 3);

    let (consumer, consumer_task) = spawn_consumer(Recorder::default());
    dispatch.bind(consumer);
    dispatch.shutdown();
    queue_task.await.unwrap();

    assert_eq!(
        consumer_task.await.unwrap().calls,
        vec!["start_walk(1,brisk)", "start_walk(2,brisk)", "start_walk(3,brisk)"]
    );
}

#[tokio::test]
async fn test_sender_with_no_reachable_peers() {
    let temp = TempDir::new().unwrap();
    let client = SocketClient::new(vec![temp.path().join("nobody.sock")]);
    let sender = WalkSender::new(Arc::new(client));

    let report = sender.send(&WalkEvent::started(1, "brisk")).await.unwrap();
    assert!(report.is_complete());
    assert!(!report.reached_any());
}
