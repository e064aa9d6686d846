use std::sync::{Arc, Mutex};

use notification::{
    Filter, Hub, Inbox, InboxHandler, Notification, NotificationKind, NotificationStore, Priority,
    StoreKey, Tab,
};

fn r1() -> Notification {
    Notification::builder()
        .id("r1")
        .kind(NotificationKind::Reminder)
        .title("Take pill")
        .message("Morning dose")
        .date("2024-01-01T08:00:00")
        .priority(Priority::High)
        .build()
        .unwrap()
}

fn r2() -> Notification {
    Notification::builder()
        .id("r2")
        .kind(NotificationKind::Reminder)
        .title("Evening pill")
        .message("Evening dose")
        .date("2024-01-01T20:00:00")
        .build()
        .unwrap()
}

fn ids(list: &[Notification]) -> Vec<&str> {
    list.iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn reminder_scenario_on_hub_and_inbox() {
    let hub = Hub::new();
    let inbox = Arc::new(Mutex::new(Inbox::new()));

    let sink = inbox.clone();
    let unsubscribe = hub.subscribe(move |n| {
        sink.lock().unwrap().add(n);
    });

    assert!(hub.publish(r1()));
    {
        let inbox = inbox.lock().unwrap();
        assert_eq!(inbox.unread_count(), 1);
        assert_eq!(inbox.get("r1").unwrap().priority, Priority::High);
    }

    // Same id again is ignored.
    let mut again = r1();
    again.title = "changed".to_string();
    hub.publish(again);
    assert_eq!(inbox.lock().unwrap().len(), 1);
    assert_eq!(inbox.lock().unwrap().get("r1").unwrap().title, "Take pill");

    inbox.lock().unwrap().mark_as_read("r1");
    {
        let inbox = inbox.lock().unwrap();
        assert_eq!(inbox.unread_count(), 0);
        assert_eq!(ids(&inbox.filter(&Filter::tab(Tab::Read))), vec!["r1"]);
    }

    assert_eq!(inbox.lock().unwrap().delete_all_read(), 1);
    assert!(inbox.lock().unwrap().is_empty());

    unsubscribe.unsubscribe();
    assert!(!hub.publish(r2()));
    assert!(inbox.lock().unwrap().is_empty());
}

#[test]
fn reminder_scenario_through_owner_thread() {
    let hub = Hub::new();
    let mut handler = InboxHandler::new(&hub, None);

    assert!(hub.publish(r1()));
    assert_eq!(handler.unread_count().unwrap(), 1);

    hub.publish(r1());
    assert_eq!(handler.list(Filter::all()).unwrap().len(), 1);

    assert!(handler.mark_as_read("r1").unwrap());
    assert_eq!(handler.unread_count().unwrap(), 0);
    assert_eq!(
        ids(&handler.list(Filter::tab(Tab::Read)).unwrap()),
        vec!["r1"]
    );

    assert_eq!(handler.delete_all_read().unwrap(), 1);
    assert!(handler.list(Filter::all()).unwrap().is_empty());

    handler.stop();
    assert!(!hub.publish(r2()));
}

#[test]
fn late_subscriber_scenario_through_owner_thread() {
    let hub = Hub::new();

    // Nobody listens yet, so r1 is gone for good.
    assert!(!hub.publish(r1()));

    let handler = InboxHandler::new(&hub, None);
    assert!(handler.list(Filter::all()).unwrap().is_empty());

    assert!(hub.publish(r1()));
    assert!(hub.publish(r2()));

    let all = handler.list(Filter::all()).unwrap();
    assert_eq!(ids(&all), vec!["r1", "r2"]);
    assert!(all.iter().all(|n| !n.is_read));

    assert!(handler.mark_as_read("r1").unwrap());
    assert_eq!(
        ids(&handler.list(Filter::tab(Tab::Unread)).unwrap()),
        vec!["r2"]
    );
    assert_eq!(
        ids(&handler.list(Filter::tab(Tab::Read)).unwrap()),
        vec!["r1"]
    );

    assert_eq!(handler.delete_all_read().unwrap(), 1);
    assert_eq!(ids(&handler.list(Filter::all()).unwrap()), vec!["r2"]);
    assert_eq!(handler.unread_count().unwrap(), 1);
}

#[test]
fn file_store_keeps_inbox_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        let backend = healthhub_store::FileStore::new(dir.path()).unwrap();
        NotificationStore::new(Arc::new(backend))
    };

    let hub = Hub::new();
    {
        let _handler = InboxHandler::new(&hub, Some(open()));
        hub.publish(r1());
        hub.publish(r2());
    }
    assert!(dir.path().join(format!("{}.json", StoreKey::Notifications)).exists());

    let handler = InboxHandler::new(&hub, Some(open()));
    let listed = handler
        .list(Filter::tab(Tab::Unread).kind(NotificationKind::Reminder))
        .unwrap();
    assert_eq!(ids(&listed), vec!["r1", "r2"]);
}
