use chrono::Duration;
use sheet_core::Level;
use sheet_core::model::{ChallengeDraft, GoalDraft, GoalPatch, GoalPeriod, GoalUnit, UserId};
use sheet_core::time::{fixed_now, offset_from_minutes};
use services::{AppServices, Clock};

#[tokio::test]
async fn tracker_persists_through_sqlite() {
    let user = UserId::random();
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_tracker_smoke?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        user,
        offset_from_minutes(-180),
    )
    .await
    .expect("bootstrap");

    let mut tracker = services.tracker().await.unwrap();
    assert_eq!(tracker.report().user.level, Level::Beginner);

    let x = tracker.add_notebook("Cardiology".into()).await.unwrap();
    let y = tracker.add_notebook("Neurology".into()).await.unwrap();

    let weekly = tracker
        .create_goal(GoalDraft {
            title: "Three quizzes a week".into(),
            description: None,
            period: GoalPeriod::Weekly,
            unit: GoalUnit::QuizCount,
            target_value: 3.0,
            notebook_id: Some(x.id()),
            deadline: (fixed_now() + Duration::days(7)).date_naive(),
        })
        .await
        .unwrap();
    tracker
        .create_challenge(ChallengeDraft {
            title: "Cardio 80".into(),
            description: None,
            target_percentage: 80.0,
            notebook_id: x.id(),
            deadline: (fixed_now() + Duration::days(30)).date_naive(),
        })
        .await
        .unwrap();

    tracker.record_attempt(10, 7, Some(x.id()), None).await.unwrap();
    tracker.record_attempt(20, 19, Some(x.id()), None).await.unwrap();
    tracker.record_attempt(5, 5, Some(y.id()), None).await.unwrap();

    let report = tracker.report();
    assert_eq!(report.challenges[0].current_percentage(), 83.0);
    assert!(report.challenges[0].completed());
    assert_eq!(report.goals[0].current_value(), 2.0);
    assert!(!report.goals[0].completed());
    assert_eq!(report.user.total_points, 300);

    tracker
        .update_goal(
            weekly.id(),
            GoalPatch {
                target_value: Some(2.0),
                ..GoalPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tracker.report().user.total_points, 350);
    assert_eq!(tracker.report().user.level, Level::Applied);

    let reloaded = services.tracker().await.unwrap();
    assert_eq!(reloaded.report(), tracker.report());
    assert_eq!(reloaded.notebooks().len(), 2);

    let stats = reloaded.stats();
    assert_eq!(stats.quizzes, 3);
    assert_eq!(stats.questions, 35);
    assert_eq!(stats.notebook(x.id()).map(|s| s.quizzes), Some(2));
}
