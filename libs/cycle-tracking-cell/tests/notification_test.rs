mod common;

use std::collections::HashMap;

use cycle_tracking_cell::*;
use common::{at, cycle, date, time, user, TestContext};

fn sweep_fixture() -> TestContext {
    let ovulating = user("ovulating@example.com", true, Some(time(21, 0)));
    let fertile = user("fertile@example.com", true, Some(time(21, 10)));
    let past_window = user("past@example.com", true, None);
    let early = user("early@example.com", true, None);
    let opted_out = user("optout@example.com", false, Some(time(21, 0)));
    let finished = user("finished@example.com", true, None);
    let no_cycles = user("nocycles@example.com", true, Some(time(20, 58)));

    let cycles = vec![
        cycle(ovulating.user_id, "2023-12-01", Some("2023-12-29"), 28),
        cycle(ovulating.user_id, "2024-01-01", None, 28),
        cycle(fertile.user_id, "2024-01-03", None, 28),
        cycle(past_window.user_id, "2023-12-28", None, 28),
        cycle(early.user_id, "2024-01-10", None, 28),
        cycle(opted_out.user_id, "2024-01-01", None, 28),
        cycle(finished.user_id, "2024-01-01", Some("2024-01-06"), 28),
    ];

    let snapshot = StoreSnapshot {
        users: vec![ovulating, fertile, past_window, early, opted_out, finished, no_cycles],
        cycles,
    };
    TestContext::new(snapshot, at("2024-01-15", 21, 2))
}

#[tokio::test]
async fn test_users_needing_notifications_classifies_each_active_cycle() {
    let ctx = sweep_fixture();
    let service = ctx.notification_service();

    let notifications = service
        .users_needing_notifications(date("2024-01-15"))
        .await
        .unwrap();

    let by_email: HashMap<String, &CycleNotification> = notifications
        .iter()
        .map(|n| (n.user.email.clone(), n))
        .collect();

    assert_eq!(by_email.len(), 3);

    let ovulating = by_email["ovulating@example.com"];
    assert_eq!(ovulating.decision.notification_type, NotificationType::Ovulation);
    assert_eq!(ovulating.decision.days_to_ovulation, 0);
    assert_eq!(ovulating.cycle.start_date, date("2024-01-01"));
    assert_eq!(ovulating.cycle.predicted_ovulation, Some(date("2024-01-15")));

    let fertile = by_email["fertile@example.com"];
    assert_eq!(fertile.decision.notification_type, NotificationType::FertileWindow);
    assert_eq!(fertile.decision.days_to_ovulation, 2);

    let past = by_email["past@example.com"];
    assert_eq!(past.decision.notification_type, NotificationType::UpcomingOvulation);
    assert_eq!(past.decision.days_to_ovulation, -4);

    assert!(!by_email.contains_key("early@example.com"));
    assert!(!by_email.contains_key("optout@example.com"));
    assert!(!by_email.contains_key("finished@example.com"));
    assert!(!by_email.contains_key("nocycles@example.com"));
}

#[tokio::test]
async fn test_no_notifications_for_empty_store() {
    let ctx = TestContext::new(StoreSnapshot::default(), at("2024-01-15", 8, 0));

    let notifications = ctx
        .notification_service()
        .users_needing_notifications(date("2024-01-15"))
        .await
        .unwrap();

    assert!(notifications.is_empty());
}

#[tokio::test]
async fn test_open_cycle_behind_a_completed_one_is_still_evaluated() {
    let backfilled = user("backfilled@example.com", true, None);
    let cycles = vec![
        cycle(backfilled.user_id, "2024-01-01", None, 28),
        cycle(backfilled.user_id, "2024-01-05", Some("2024-01-12"), 28),
    ];
    let ctx = TestContext::new(
        StoreSnapshot {
            users: vec![backfilled],
            cycles,
        },
        at("2024-01-15", 9, 0),
    );

    let notifications = ctx
        .notification_service()
        .users_needing_notifications(date("2024-01-15"))
        .await
        .unwrap();

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].cycle.start_date, date("2024-01-01"));
    assert_eq!(notifications[0].decision.notification_type, NotificationType::Ovulation);
}

#[tokio::test]
async fn test_pill_reminders_due_within_window() {
    let ctx = sweep_fixture();
    let service = ctx.notification_service();

    let due = service.pill_reminders_due(time(21, 2), 5).await.unwrap();
    let mut emails: Vec<_> = due.iter().map(|u| u.email.as_str()).collect();
    emails.sort();

    assert_eq!(emails, vec!["nocycles@example.com", "ovulating@example.com"]);
}

#[tokio::test]
async fn test_pill_window_is_configurable() {
    let ctx = sweep_fixture();
    let service = ctx.notification_service();

    let due = service.pill_reminders_due(time(21, 2), 10).await.unwrap();
    assert_eq!(due.len(), 3);
}

#[tokio::test]
async fn test_pill_reminder_near_midnight_does_not_wrap() {
    let late = user("late@example.com", true, Some(time(23, 58)));
    let snapshot = StoreSnapshot {
        users: vec![late],
        cycles: vec![],
    };
    let ctx = TestContext::new(snapshot, at("2024-01-16", 0, 2));

    let due = ctx
        .notification_service()
        .pill_reminders_due(time(0, 2), 5)
        .await
        .unwrap();

    assert!(due.is_empty());
}
