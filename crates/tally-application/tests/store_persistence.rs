use std::sync::Arc;
use std::time::Duration;
use tally_application::SessionStore;
use tally_core::session::{ChoiceDraft, Session, SessionRepository, VoteDelta};
use tally_infrastructure::{MemorySessionRepository, TomlSessionRepository};
use tempfile::TempDir;

fn lunch() -> Vec<ChoiceDraft> {
    vec![
        ChoiceDraft::new("Pizza").with_emoji("🍕"),
        ChoiceDraft::new("Tacos").with_emoji("🌮"),
        ChoiceDraft::new(""),
    ]
}

#[tokio::test]
async fn rapid_votes_on_one_choice_all_reach_disk() {
    let temp_dir = TempDir::new().unwrap();
    let repository = Arc::new(TomlSessionRepository::new(temp_dir.path()).unwrap());
    let store = SessionStore::new(repository.clone());
    store.load_all().await.unwrap();

    let session = store.create_session("Lunch", &lunch()).await.unwrap();
    let tacos = session.choices[1].id.clone();

    assert_eq!(store.apply_vote(&session.id, &tacos, VoteDelta::Up), Some(1));
    assert_eq!(store.apply_vote(&session.id, &tacos, VoteDelta::Up), Some(2));
    store.flush().await;

    let stored = repository.find_by_id(&session.id).await.unwrap().unwrap();
    assert_eq!(stored.choices.len(), 2);
    assert_eq!(stored.choice(&tacos).unwrap().votes, 2);
}

#[tokio::test]
async fn delete_after_pending_votes_leaves_no_record() {
    let repository = Arc::new(MemorySessionRepository::new().with_latency(Duration::from_millis(2)));
    let store = SessionStore::new(repository.clone());
    store.load_all().await.unwrap();

    let session = store.create_session("Lunch", &lunch()).await.unwrap();
    let pizza = session.choices[0].id.clone();
    for _ in 0..5 {
        store.apply_vote(&session.id, &pizza, VoteDelta::Up);
    }

    assert!(store.remove_session(&session.id).await);
    store.flush().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(store.get(&session.id).is_none());
    assert!(repository.snapshot(&session.id).is_none());
}

#[tokio::test]
async fn reload_sees_durable_state() {
    let temp_dir = TempDir::new().unwrap();
    let repository = Arc::new(TomlSessionRepository::new(temp_dir.path()).unwrap());

    let store = SessionStore::new(repository.clone());
    store.load_all().await.unwrap();
    let session = store.create_session("Lunch", &lunch()).await.unwrap();
    let sushi = store
        .add_choice(&session.id, &ChoiceDraft::new("Sushi"))
        .unwrap();
    store.apply_vote(&session.id, &sushi, VoteDelta::Up);
    store.remove_choice(&session.id, &session.choices[0].id);
    store.flush().await;

    let reloaded = SessionStore::new(repository);
    reloaded.load_all().await.unwrap();
    let session = reloaded.get(&session.id).unwrap();
    let titles: Vec<_> = session
        .choices
        .iter()
        .map(|c| (c.title.as_str(), c.votes))
        .collect();
    assert_eq!(titles, [("Tacos", 0), ("Sushi", 1)]);
}

#[tokio::test]
async fn failed_writes_keep_memory_ahead_of_storage() {
    let repository = Arc::new(MemorySessionRepository::new());
    let store = SessionStore::new(repository.clone());
    store.load_all().await.unwrap();
    let session = store.create_session("Lunch", &lunch()).await.unwrap();
    let pizza = session.choices[0].id.clone();

    repository.set_fail_writes(true);
    store.apply_vote(&session.id, &pizza, VoteDelta::Up);
    store.flush().await;

    assert_eq!(store.get(&session.id).unwrap().choices[0].votes, 1);
    assert_eq!(repository.snapshot(&session.id).unwrap().choices[0].votes, 0);

    repository.set_fail_writes(false);
    store.apply_vote(&session.id, &pizza, VoteDelta::Up);
    store.flush().await;
    assert_eq!(repository.snapshot(&session.id).unwrap().choices[0].votes, 1);
}

#[tokio::test]
async fn seeded_sessions_load_newest_first() {
    let older = Session::create_at("Older", &lunch(), 1_000).unwrap();
    let newer = Session::create_at("Newer", &lunch(), 2_000).unwrap();
    let repository = Arc::new(MemorySessionRepository::with_sessions([
        older.clone(),
        newer.clone(),
    ]));
    let store = SessionStore::new(repository.clone());
    store.load_all().await.unwrap();

    let names: Vec<_> = store.sessions().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["Newer", "Older"]);

    // Unknown choices never reach storage; a real vote is one write.
    assert_eq!(store.apply_vote(&older.id, "missing", VoteDelta::Up), None);
    store.apply_vote(&older.id, &older.choices[0].id, VoteDelta::Up);
    store.flush().await;
    assert_eq!(repository.write_count(), 1);
    assert_eq!(repository.snapshot(&newer.id), Some(newer));
}
