//! `/mealplan` intake and delivery tests.

use std::sync::Arc;
use std::time::Duration;

use repbyrep::coach::{copy, Coach, ThreadKey};
use repbyrep::messaging::SplitLimits;
use repbyrep::mealplan::{
    RenderError, INCOMPLETE_ANSWERS, LIFESTYLE_QUESTIONS, PROFILE_QUESTIONS,
};

use super::support::{
    coach, first_topic, forum_origin, omar, settings, FakeAssistant, FakePlatform, Sent,
    FORUM_CHAT,
};

const PROFILE: &str = "Omar, male, 31, 182 lbs, 5'11, bulk, halal, none";
const LIFESTYLE: &str = "4 months, 10k steps, Active, none, yes, night shift, 4, 18%";
const PLAN: &str = "### Total Daily Macronutrients
Protein: 190g
Calories: 3000

Suhoor: oats, eggs, banana | 50g protein

Iftar: dates, chicken, rice | 70g protein

### Tips
Sleep before suhoor alarms.";

/// Wait until the flow asks `user` for input in `thread`, then answer.
async fn answer(coach: &Coach, thread: ThreadKey, user: u64, text: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !coach.waiters().is_waiting(thread, user).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("flow never asked for input");
    assert!(coach.on_text(&thread, user, text).await.expect("deliver"));
}

fn spawn_meal_plan(coach: &Arc<Coach>) -> tokio::task::JoinHandle<()> {
    let coach = Arc::clone(coach);
    tokio::spawn(async move {
        coach
            .meal_plan(&forum_origin(), &omar())
            .await
            .expect("meal plan flow");
    })
}

#[tokio::test]
async fn two_rounds_produce_a_pdf_and_the_text_plan() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::replying(PLAN);
    let coach = coach(&platform, &assistant, settings());
    let topic = first_topic();

    let flow = spawn_meal_plan(&coach);
    answer(&coach, topic, 7, PROFILE).await;
    answer(&coach, topic, 7, LIFESTYLE).await;
    flow.await.expect("join");

    assert_eq!(platform.opened(), vec!["Meal Plan for Omar".to_owned()]);
    assert_eq!(
        platform.texts_at(topic),
        vec![
            PROFILE_QUESTIONS.to_owned(),
            LIFESTYLE_QUESTIONS.to_owned(),
            copy::MEAL_PLAN_GENERATING.to_owned(),
            PLAN.to_owned(),
            copy::MEAL_PLAN_FOLLOW_UP.to_owned(),
        ]
    );

    let document = platform.sent().into_iter().find_map(|s| match s {
        Sent::Document(at, name, bytes) => Some((at, name, bytes)),
        _ => None,
    });
    let (at, name, bytes) = document.expect("pdf sent");
    assert_eq!(at, topic);
    assert_eq!(name, "Meal Plan for Omar.pdf");
    assert!(bytes.starts_with(b"%PDF"));

    assert_eq!(
        platform.texts_at(ThreadKey::chat(FORUM_CHAT)),
        vec![copy::meal_plan_created(
            "<a href=\"https://t.me/c/1234567890/77\">Meal Plan for Omar</a>"
        )]
    );

    let prompts = assistant.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].1.contains("Height: 71 inches"));
    assert!(prompts[0].1.contains("Schedule: night shift"));
    assert!(coach.threads().conversation(&topic).await.is_some());
}

#[tokio::test]
async fn other_users_do_not_answer_for_the_requester() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::replying(PLAN);
    let coach = coach(&platform, &assistant, settings());
    let topic = first_topic();

    let flow = spawn_meal_plan(&coach);
    tokio::time::timeout(Duration::from_secs(5), async {
        while !coach.waiters().is_waiting(topic, 7).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("waiting");

    assert!(!coach.on_text(&topic, 8, PROFILE).await.expect("ignored"));
    assert!(coach.waiters().is_waiting(topic, 7).await);

    answer(&coach, topic, 7, PROFILE).await;
    answer(&coach, topic, 7, LIFESTYLE).await;
    flow.await.expect("join");
}

#[tokio::test]
async fn silence_times_out() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::replying(PLAN);
    let mut settings = settings();
    settings.intake_timeout = Duration::from_millis(50);
    let coach = coach(&platform, &assistant, settings);

    coach
        .meal_plan(&forum_origin(), &omar())
        .await
        .expect("flow");

    assert_eq!(
        platform.texts_at(first_topic()),
        vec![PROFILE_QUESTIONS.to_owned(), copy::INTAKE_TIMEOUT.to_owned()]
    );
    assert!(!coach.waiters().is_waiting(first_topic(), 7).await);
    assert!(assistant.prompts().is_empty());
}

#[tokio::test]
async fn short_answers_stop_the_flow() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::replying(PLAN);
    let coach = coach(&platform, &assistant, settings());
    let topic = first_topic();

    let flow = spawn_meal_plan(&coach);
    answer(&coach, topic, 7, "Omar, male").await;
    flow.await.expect("join");

    assert_eq!(
        platform.texts_at(topic),
        vec![PROFILE_QUESTIONS.to_owned(), INCOMPLETE_ANSWERS.to_owned()]
    );
    assert!(assistant.prompts().is_empty());
}

#[tokio::test]
async fn unreadable_numbers_ask_to_start_over() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::replying(PLAN);
    let coach = coach(&platform, &assistant, settings());
    let topic = first_topic();

    let flow = spawn_meal_plan(&coach);
    answer(&coach, topic, 7, "Omar, male, thirty, 182, 5'11, bulk, halal, none").await;
    answer(&coach, topic, 7, LIFESTYLE).await;
    flow.await.expect("join");

    let texts = platform.texts_at(topic);
    let last = texts.last().expect("reply");
    assert!(last.starts_with("I couldn't read your answers"));
    assert!(last.contains("age"));
    assert!(assistant.prompts().is_empty());
}

#[tokio::test]
async fn assistant_failure_after_intake_is_reported() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::failing();
    let coach = coach(&platform, &assistant, settings());
    let topic = first_topic();

    let flow = spawn_meal_plan(&coach);
    answer(&coach, topic, 7, PROFILE).await;
    answer(&coach, topic, 7, LIFESTYLE).await;
    flow.await.expect("join");

    let texts = platform.texts_at(topic);
    assert_eq!(texts.last().map(String::as_str), Some(copy::ASSISTANT_FAILED));
    assert!(!platform
        .sent()
        .iter()
        .any(|s| matches!(s, Sent::Document(..))));
}

#[tokio::test]
async fn pdf_failure_falls_back_to_text() {
    let platform = FakePlatform::with_topics();
    let assistant = FakeAssistant::replying(PLAN);
    let mut settings = settings();
    settings.render_pdf = |_, _| Err(RenderError::EmptyPlan);
    settings.limits = SplitLimits::new(120, 60).expect("limits");
    let coach = coach(&platform, &assistant, settings);
    let topic = first_topic();

    let flow = spawn_meal_plan(&coach);
    answer(&coach, topic, 7, PROFILE).await;
    answer(&coach, topic, 7, LIFESTYLE).await;
    flow.await.expect("join");

    let texts = platform.texts_at(topic);
    let note = texts
        .iter()
        .position(|t| t == copy::MEAL_PLAN_PDF_FAILED)
        .expect("explanatory note");
    let plan_parts = &texts[note + 1..];
    assert!(plan_parts.len() > 1, "plan should be split: {plan_parts:?}");
    assert_eq!(plan_parts.concat().replace("\n", ""), PLAN.replace("\n", ""));
    assert!(!platform
        .sent()
        .iter()
        .any(|s| matches!(s, Sent::Document(..))));
}
