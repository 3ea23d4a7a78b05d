use pretty_assertions::assert_eq;
use reqflow_core::prelude::*;
use reqflow_test_utils::{create_node, highlight, worked_example, RecordingObserver};
use std::time::Duration;
use tokio::time::sleep;

const TICK: Duration = Duration::from_millis(1500);

fn config() -> ReqflowConfig {
    ReqflowConfig::new().with_playback(PlaybackConfig::default().with_tick_interval(TICK))
}

#[tokio::test(start_paused = true)]
async fn plays_worked_example_on_the_clock() {
    let (nodes, connections) = worked_example();
    let observer = RecordingObserver::new();
    let (handle, task) = PlaybackDriver::spawn(&config(), &nodes, &connections, observer.clone());

    let state = handle.play().await.unwrap();
    assert_eq!(state, PlaybackState { cursor: 0, is_playing: true });

    sleep(TICK * 3 + Duration::from_millis(10)).await;

    assert_eq!(
        handle.state().await.unwrap(),
        PlaybackState { cursor: 3, is_playing: false }
    );
    assert_eq!(
        observer.highlights(),
        vec![
            highlight("r1", 0),
            highlight("r1", 1),
            highlight("r2", 0),
            Highlight::Cleared,
        ]
    );

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn nothing_advances_before_the_interval() {
    let nodes = vec![create_node("n", 3)];
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], RecordingObserver::new());

    handle.play().await.unwrap();
    sleep(TICK - Duration::from_millis(1)).await;
    assert_eq!(handle.state().await.unwrap().cursor, 0);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(handle.state().await.unwrap().cursor, 1);
}

#[tokio::test(start_paused = true)]
async fn pause_cancels_the_pending_tick() {
    let nodes = vec![create_node("n", 4)];
    let observer = RecordingObserver::new();
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], observer.clone());

    handle.play().await.unwrap();
    sleep(TICK + Duration::from_millis(100)).await;
    let paused = handle.pause().await.unwrap();
    assert_eq!(paused, PlaybackState { cursor: 1, is_playing: false });

    sleep(TICK * 10).await;
    assert_eq!(handle.state().await.unwrap(), paused);
    assert_eq!(observer.last(), Some(highlight("n", 1)));
}

#[tokio::test(start_paused = true)]
async fn resume_waits_a_full_interval() {
    let nodes = vec![create_node("n", 4)];
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], RecordingObserver::new());

    handle.play().await.unwrap();
    sleep(TICK - Duration::from_millis(100)).await;
    handle.pause().await.unwrap();
    handle.play().await.unwrap();

    sleep(TICK - Duration::from_millis(50)).await;
    assert_eq!(handle.state().await.unwrap().cursor, 0);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.state().await.unwrap().cursor, 1);
}

#[tokio::test(start_paused = true)]
async fn load_rewinds_against_the_new_path() {
    let nodes = vec![create_node("old", 5)];
    let observer = RecordingObserver::new();
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], observer.clone());

    handle.play().await.unwrap();
    sleep(TICK * 2 + Duration::from_millis(10)).await;
    assert_eq!(handle.state().await.unwrap().cursor, 2);

    let (nodes, connections) = worked_example();
    let state = handle.load(nodes, connections).await.unwrap();
    assert_eq!(state, PlaybackState::default());

    sleep(TICK * 5).await;
    assert_eq!(handle.state().await.unwrap(), PlaybackState::default());
    assert_eq!(observer.last(), Some(highlight("r1", 0)));
}

#[tokio::test(start_paused = true)]
async fn loading_no_nodes_stops_playback_and_clears_highlight() {
    let nodes = vec![create_node("old", 4)];
    let observer = RecordingObserver::new();
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], observer.clone());

    handle.play().await.unwrap();
    sleep(TICK + Duration::from_millis(10)).await;
    assert_eq!(observer.last(), Some(highlight("old", 1)));

    let state = handle.load(Vec::new(), Vec::new()).await.unwrap();
    assert_eq!(state, PlaybackState::default());
    assert_eq!(observer.last(), Some(Highlight::Cleared));

    let seen = observer.len();
    sleep(TICK * 3).await;
    assert_eq!(observer.len(), seen);
}

#[tokio::test(start_paused = true)]
async fn step_controls_are_ignored_while_playing() {
    let nodes = vec![create_node("n", 3)];
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], RecordingObserver::new());

    handle.play().await.unwrap();
    assert_eq!(handle.step_forward().await.unwrap().cursor, 0);
    handle.pause().await.unwrap();
    assert_eq!(handle.step_forward().await.unwrap().cursor, 1);
    assert_eq!(handle.step_backward().await.unwrap().cursor, 0);
}

#[tokio::test(start_paused = true)]
async fn reset_stops_and_clears() {
    let nodes = vec![create_node("n", 3)];
    let observer = RecordingObserver::new();
    let (handle, _task) = PlaybackDriver::spawn(&config(), &nodes, &[], observer.clone());

    handle.play().await.unwrap();
    sleep(TICK + Duration::from_millis(10)).await;
    assert_eq!(handle.reset().await.unwrap(), PlaybackState::default());
    assert_eq!(observer.last(), Some(Highlight::Cleared));

    sleep(TICK * 3).await;
    assert_eq!(handle.state().await.unwrap(), PlaybackState::default());
}

#[tokio::test(start_paused = true)]
async fn channel_observer_streams_highlights() {
    let (nodes, connections) = worked_example();
    let (observer, mut highlights) = ChannelObserver::new();
    let (handle, task) = PlaybackDriver::spawn(&config(), &nodes, &connections, observer);

    handle.play().await.unwrap();
    let mut received = Vec::new();
    while let Some(h) = highlights.recv().await {
        let done = h == Highlight::Cleared;
        received.push(h);
        if done {
            break;
        }
    }
    assert_eq!(received.len(), 4);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn handle_reports_closed_driver() {
    let nodes = vec![create_node("n", 1)];
    let (handle, task) = PlaybackDriver::spawn(&config(), &nodes, &[], RecordingObserver::new());
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(handle.play().await, Err(PlaybackError::DriverClosed));
}
