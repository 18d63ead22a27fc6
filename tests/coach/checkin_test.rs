//! Daily check-in loop tests.

use std::time::Duration;

use repbyrep::coach::checkin::{run_checkins, CheckInSchedule, CHECKIN_MESSAGE};
use repbyrep::coach::ThreadKey;
use tokio::sync::watch;

use super::support::{coach, settings, FakeAssistant, FakePlatform, Sent};

#[tokio::test]
async fn post_checkin_returns_the_message_id() {
    let platform = FakePlatform::with_topics();
    let coach = coach(&platform, &FakeAssistant::replying("unused"), settings());
    let target = ThreadKey::topic(-100_555, 3);

    assert_eq!(coach.post_checkin(&target).await.expect("post"), 1000);
    assert_eq!(
        platform.sent(),
        vec![Sent::CheckIn(target, CHECKIN_MESSAGE.to_owned())]
    );
}

#[tokio::test]
async fn loop_posts_when_due_and_stops_on_shutdown() {
    let platform = FakePlatform::with_topics();
    let coach = coach(&platform, &FakeAssistant::replying("unused"), settings());
    let target = ThreadKey::chat(-100_555);
    let every_second = CheckInSchedule::new("* * * * * *", "UTC").expect("schedule");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_checkins(
        coach,
        target,
        every_second,
        Duration::from_millis(50),
        shutdown_rx,
    ));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    shutdown_tx.send(true).expect("loop alive");
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop stopped")
        .expect("join");

    let posts = platform
        .sent()
        .into_iter()
        .filter(|s| matches!(s, Sent::CheckIn(at, _) if *at == target))
        .count();
    assert!(posts >= 1, "expected at least one check-in, got {posts}");
}

#[tokio::test]
async fn nothing_is_posted_before_the_first_fire_time() {
    let platform = FakePlatform::with_topics();
    let coach = coach(&platform, &FakeAssistant::replying("unused"), settings());
    let yearly = CheckInSchedule::new("0 0 0 1 1 *", "UTC").expect("schedule");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_checkins(
        coach,
        ThreadKey::chat(-100_555),
        yearly,
        Duration::from_millis(20),
        shutdown_rx,
    ));
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop stopped")
        .expect("join");

    assert!(platform.sent().is_empty());
}
