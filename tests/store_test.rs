use statuswatch::config::Provider;
use statuswatch::status::{Status, StatusRecord};
use statuswatch::store::StatusStore;

fn providers(names: &[&str]) -> Vec<Provider> {
    names
        .iter()
        .map(|name| Provider {
            name: name.to_string(),
            mail_address: format!("status@{}.example", name.to_lowercase()),
        })
        .collect()
}

async fn temp_store(dir: &tempfile::TempDir) -> StatusStore {
    let path = dir.path().join("incidents.db");
    StatusStore::open(path.to_str().expect("utf-8 temp path"))
        .await
        .expect("failed to open temp store")
}

#[tokio::test]
async fn initialize_seeds_one_unknown_record_per_provider() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;

    store
        .initialize(&providers(&["Gamma", "Alpha", "Beta"]))
        .await
        .expect("initialize");

    let records = store.read_all().await.expect("read_all");
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.status, Status::Unknown);
        assert_eq!(record.detail, "");
    }

    // Seeding again changes nothing
    store
        .initialize(&providers(&["Gamma", "Alpha", "Beta"]))
        .await
        .expect("second initialize");
    assert_eq!(store.read_all().await.expect("read_all").len(), 3);
}

#[tokio::test]
async fn read_all_is_ordered_by_provider_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;

    store
        .initialize(&providers(&["Gamma", "Alpha", "Beta"]))
        .await
        .expect("initialize");

    let names: Vec<String> = store
        .read_all()
        .await
        .expect("read_all")
        .into_iter()
        .map(|r| r.provider)
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;

    store.initialize(&providers(&["Alpha"])).await.expect("initialize");

    store
        .upsert("Alpha", Status::Down, "Partial Outage")
        .await
        .expect("first upsert");
    store
        .upsert("Alpha", Status::Down, "Partial Outage")
        .await
        .expect("second upsert");

    let records = store.read_all().await.expect("read_all");
    assert_eq!(
        records,
        vec![StatusRecord {
            provider: "Alpha".to_string(),
            status: Status::Down,
            detail: "Partial Outage".to_string(),
        }]
    );
}

#[tokio::test]
async fn upsert_is_last_write_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;

    store.initialize(&providers(&["Alpha"])).await.expect("initialize");

    store.upsert("Alpha", Status::Up, "x").await.expect("upsert Up");
    store.upsert("Alpha", Status::Down, "y").await.expect("upsert Down");

    let records = store.read_all().await.expect("read_all");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, Status::Down);
    assert_eq!(records[0].detail, "y");
}

#[tokio::test]
async fn reseeding_never_clobbers_an_upserted_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;
    let registry = providers(&["Alpha"]);

    store.initialize(&registry).await.expect("initialize");
    store
        .upsert("Alpha", Status::Down, "Major Outage")
        .await
        .expect("upsert");

    // A restart re-runs initialize over the existing file
    store.initialize(&registry).await.expect("re-initialize");

    let records = store.read_all().await.expect("read_all");
    assert_eq!(records[0].status, Status::Down);
    assert_eq!(records[0].detail, "Major Outage");
}

#[tokio::test]
async fn upsert_inserts_when_no_seeded_row_exists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;

    store
        .upsert("Alpha", Status::Up, "No incidents")
        .await
        .expect("upsert");

    let records = store.read_all().await.expect("read_all");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].provider, "Alpha");
    assert_eq!(records[0].status, Status::Up);
}
