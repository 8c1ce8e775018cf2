//! Cart merge behavior against a real database.

#![allow(clippy::unwrap_used)]

use fanatik_api::db::{CartRepository, RepositoryError, cart::CartAddOutcome};
use fanatik_api::models::cart::CartItemInput;
use fanatik_core::{JerseyId, Money, UserId};
use fanatik_integration_tests::{create_jersey, create_league, create_team, create_type, create_user};
use serde_json::json;
use sqlx::PgPool;

async fn setup(pool: &PgPool) -> (UserId, JerseyId) {
    let user = create_user(pool, "cartfan").await;
    let league = create_league(pool, "Liga Portugal").await;
    let team = create_team(pool, &league, "Benfica").await;
    let kind = create_type(pool, "Fan", 7000).await;
    let jersey = create_jersey(pool, team.id, kind.id, "2024/25", "red").await;
    (user.id, jersey.id)
}

fn item(jersey_id: JerseyId, patches: &[&str]) -> CartItemInput {
    serde_json::from_value(json!({
        "jersey_id": jersey_id,
        "size": "M",
        "quantity": 1,
        "custom_name": "DI MARIA",
        "custom_number": "11",
        "patches": patches,
        "final_price": "85.00"
    }))
    .unwrap()
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_identical_additions_merge(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let repo = CartRepository::new(&pool);

    let (first, outcome) = repo.add(user_id, &item(jersey_id, &[])).await.unwrap();
    assert_eq!(outcome, CartAddOutcome::Inserted);

    let mut again = item(jersey_id, &[]);
    again.quantity = 2;
    let (merged, outcome) = repo.add(user_id, &again).await.unwrap();
    assert_eq!(outcome, CartAddOutcome::Merged);
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 3);
    assert_eq!(merged.final_price, Money::from_cents(8500));

    assert_eq!(repo.list(user_id).await.unwrap().len(), 1);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_patch_order_does_not_matter(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let repo = CartRepository::new(&pool);

    repo.add(user_id, &item(jersey_id, &["A", "B"])).await.unwrap();
    let (merged, outcome) = repo.add(user_id, &item(jersey_id, &["B", "A"])).await.unwrap();

    assert_eq!(outcome, CartAddOutcome::Merged);
    assert_eq!(merged.quantity, 2);
    assert_eq!(merged.patches.to_vec(), vec!["A".to_owned(), "B".to_owned()]);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_any_difference_adds_a_row(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let repo = CartRepository::new(&pool);
    repo.add(user_id, &item(jersey_id, &["A"])).await.unwrap();

    let mut size = item(jersey_id, &["A"]);
    size.size = "L".to_owned();
    let mut name = item(jersey_id, &["A"]);
    name.custom_name = None;
    let mut number = item(jersey_id, &["A"]);
    number.custom_number = Some("10".to_owned());
    let patches = item(jersey_id, &["A", "B"]);

    for variant in [size, name, number, patches] {
        let (_, outcome) = repo.add(user_id, &variant).await.unwrap();
        assert_eq!(outcome, CartAddOutcome::Inserted);
    }
    assert_eq!(repo.list(user_id).await.unwrap().len(), 5);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_missing_customization_matches_missing(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let repo = CartRepository::new(&pool);

    let mut plain = item(jersey_id, &[]);
    plain.custom_name = None;
    plain.custom_number = None;
    repo.add(user_id, &plain).await.unwrap();
    let (merged, outcome) = repo.add(user_id, &plain).await.unwrap();

    assert_eq!(outcome, CartAddOutcome::Merged);
    assert_eq!(merged.quantity, 2);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_carts_are_per_user(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let other = create_user(&pool, "otherfan").await;
    let repo = CartRepository::new(&pool);

    let (line, _) = repo.add(user_id, &item(jersey_id, &[])).await.unwrap();
    let (_, outcome) = repo.add(other.id, &item(jersey_id, &[])).await.unwrap();
    assert_eq!(outcome, CartAddOutcome::Inserted);

    let err = repo.remove(other.id, line.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    assert_eq!(repo.list(user_id).await.unwrap().len(), 1);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_unknown_jersey_is_not_found(pool: PgPool) {
    let (user_id, _) = setup(&pool).await;
    let err = CartRepository::new(&pool)
        .add(user_id, &item(JerseyId::new(9999), &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_list_loads_jerseys_and_clear_empties(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let repo = CartRepository::new(&pool);
    repo.add(user_id, &item(jersey_id, &[])).await.unwrap();

    let items = repo.list(user_id).await.unwrap();
    let jersey = items[0].jersey.as_ref().unwrap();
    assert_eq!(jersey.team.name, "Benfica");

    assert_eq!(repo.clear(user_id).await.unwrap(), 1);
    assert!(repo.list(user_id).await.unwrap().is_empty());
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_merge_past_quantity_range_is_rejected(pool: PgPool) {
    let (user_id, jersey_id) = setup(&pool).await;
    let repo = CartRepository::new(&pool);

    let mut bulk = item(jersey_id, &[]);
    bulk.quantity = i32::MAX;
    repo.add(user_id, &bulk).await.unwrap();

    let err = repo.add(user_id, &item(jersey_id, &[])).await.unwrap_err();
    assert!(matches!(err, RepositoryError::QuantityLimit { max: i32::MAX }));

    let lines = repo.list(user_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, i32::MAX);
}
