use notifeed_core::db::open_db;
use notifeed_core::{
    FeedConfig, FeedService, NewNotification, NotificationId, NotificationPayload,
    NotificationRepository, Recipient, SqliteNotificationRepository,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 4;

fn bob() -> Recipient {
    Recipient::new("bob")
}

fn seed(path: &Path, recipient: &Recipient, count: usize) -> Vec<NotificationId> {
    let conn = open_db(path).unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();
    (0..count)
        .map(|idx| {
            let new = NewNotification::new(
                recipient.clone(),
                NotificationPayload::new("alice", format!("event {idx}")),
            )
            .created_at(1_000 + idx as i64);
            repo.insert(&new).unwrap().id
        })
        .collect()
}

fn with_feed<T>(
    path: &Path,
    run: impl FnOnce(&FeedService<SqliteNotificationRepository<'_>>) -> T,
) -> T {
    let conn = open_db(path).unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();
    let feed = FeedService::new(repo, FeedConfig::default());
    run(&feed)
}

#[test]
fn concurrent_mark_on_fetch_hands_out_each_unread_item_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.db");
    let seeded = seed(&path, &bob(), 40);
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let path: PathBuf = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                with_feed(&path, |feed| {
                    barrier.wait();
                    let mut claimed = Vec::new();
                    loop {
                        let page = feed.list_unread(&bob(), Some("3"), true).unwrap();
                        if page.items.is_empty() {
                            break;
                        }
                        claimed.extend(page.items.into_iter().map(|item| item.id));
                    }
                    claimed
                })
            })
        })
        .collect();

    let mut all_claimed = Vec::new();
    for handle in handles {
        all_claimed.extend(handle.join().unwrap());
    }

    let unique: HashSet<_> = all_claimed.iter().copied().collect();
    assert_eq!(all_claimed.len(), seeded.len(), "an item was handed out twice");
    assert_eq!(unique, seeded.into_iter().collect::<HashSet<_>>());
    with_feed(&path, |feed| assert_eq!(feed.count_unread(&bob()).unwrap(), 0));
}

#[test]
fn concurrent_single_and_bulk_marks_converge_to_all_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.db");
    let seeded = seed(&path, &bob(), 30);
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let path = path.clone();
            let ids = seeded.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                with_feed(&path, |feed| {
                    barrier.wait();
                    if worker == 0 {
                        feed.mark_all_as_read(&bob()).unwrap();
                    } else {
                        for id in ids.iter().skip(worker).step_by(WORKERS) {
                            feed.mark_as_read(*id, &bob()).unwrap();
                        }
                    }
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    with_feed(&path, |feed| {
        assert_eq!(feed.count_unread(&bob()).unwrap(), 0);
        assert_eq!(feed.count_all(&bob()).unwrap(), 30);
    });
}

#[test]
fn concurrent_recipients_never_touch_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.db");
    let recipients: Vec<Recipient> = (0..WORKERS)
        .map(|idx| Recipient::new(format!("user-{idx}")))
        .collect();
    for recipient in &recipients {
        seed(&path, recipient, 5);
    }
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = recipients
        .iter()
        .enumerate()
        .map(|(idx, recipient)| {
            let path = path.clone();
            let recipient = recipient.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                with_feed(&path, |feed| {
                    barrier.wait();
                    if idx % 2 == 0 {
                        feed.mark_all_as_read(&recipient).unwrap();
                    } else {
                        feed.list_unread(&recipient, Some("2"), true).unwrap();
                    }
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    with_feed(&path, |feed| {
        for (idx, recipient) in recipients.iter().enumerate() {
            let expected = if idx % 2 == 0 { 0 } else { 3 };
            assert_eq!(feed.count_unread(recipient).unwrap(), expected);
            assert_eq!(feed.count_all(recipient).unwrap(), 5);
        }
    });
}
