use finedu_core::model::{Goal, GoalId, GoalPeriod};
use storage::repository::{decode_goals, encode_goals};
use storage::{KeyValueStore, SqliteKvStore};

async fn open_store(name: &str) -> SqliteKvStore {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    SqliteKvStore::open(&url).await.expect("open")
}

#[tokio::test]
async fn sqlite_round_trips_scalars() {
    let store = open_store("memdb_scalars").await;

    store
        .put_string("financial_goals", "greeting", "olá")
        .await
        .unwrap();
    store
        .put_i64("financial_goals", "total_points", 3400)
        .await
        .unwrap();
    store
        .put_f64("financial_goals", "user_balance", -42.75)
        .await
        .unwrap();

    assert_eq!(
        store
            .get_string("financial_goals", "greeting")
            .await
            .unwrap()
            .as_deref(),
        Some("olá")
    );
    assert_eq!(
        store
            .get_i64("financial_goals", "total_points", 0)
            .await
            .unwrap(),
        3400
    );
    assert_eq!(
        store
            .get_f64("financial_goals", "user_balance", 0.0)
            .await
            .unwrap(),
        -42.75
    );

    store.close().await;
}

#[tokio::test]
async fn sqlite_returns_defaults_for_absent_keys() {
    let store = open_store("memdb_defaults").await;

    assert!(
        store
            .get_string("financial_goals", "goals")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(
        store
            .get_i64("financial_goals", "total_points", 3400)
            .await
            .unwrap(),
        3400
    );
    assert_eq!(
        store
            .get_f64("financial_goals", "user_balance", 0.0)
            .await
            .unwrap(),
        0.0
    );

    store.close().await;
}

#[tokio::test]
async fn sqlite_overwrites_in_place() {
    let store = open_store("memdb_overwrite").await;

    store.put_i64("ns", "total_points", 3400).await.unwrap();
    store.put_i64("ns", "total_points", 3410).await.unwrap();

    assert_eq!(store.get_i64("ns", "total_points", 0).await.unwrap(), 3410);

    store.close().await;
}

#[tokio::test]
async fn sqlite_isolates_namespaces() {
    let store = open_store("memdb_namespaces").await;

    store.put_i64("maria", "total_points", 100).await.unwrap();
    store.put_i64("joao", "total_points", 200).await.unwrap();

    assert_eq!(store.get_i64("maria", "total_points", 0).await.unwrap(), 100);
    assert_eq!(store.get_i64("joao", "total_points", 0).await.unwrap(), 200);

    store.close().await;
}

#[tokio::test]
async fn sqlite_round_trips_goal_list() {
    let store = open_store("memdb_goals").await;

    let goals = vec![
        Goal::from_persisted(
            GoalId::new(1),
            "Alimentação no dia-a-dia",
            "Economizar em refeições fora de casa",
            300.0,
            75.0,
            GoalPeriod::Month,
        )
        .unwrap(),
        Goal::new(
            GoalId::new(2),
            "Viagem de férias",
            "",
            2500.0,
            GoalPeriod::Year,
        )
        .unwrap(),
    ];

    let encoded = encode_goals(&goals).unwrap();
    store
        .put_string("financial_goals", "goals", &encoded)
        .await
        .unwrap();

    let raw = store
        .get_string("financial_goals", "goals")
        .await
        .unwrap()
        .expect("goals present");
    let decoded = decode_goals(&raw).unwrap();

    assert_eq!(decoded, goals);

    store.close().await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let url = "sqlite:file:memdb_migrate_twice?mode=memory&cache=shared";
    let first = SqliteKvStore::open(url).await.expect("first open");
    first.put_i64("ns", "k", 1).await.unwrap();

    // A second open against the same database must not disturb existing data.
    let second = SqliteKvStore::open(url).await.expect("second open");
    assert_eq!(second.get_i64("ns", "k", 0).await.unwrap(), 1);

    second.close().await;
    first.close().await;
}
