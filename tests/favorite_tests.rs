// tests/favorite_tests.rs

mod common;

use common::{attach_image, create_draft, publish, register_user, spawn_app, unique_city};

#[tokio::test]
async fn favorites_require_authentication() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/favorites", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn add_check_list_and_remove_a_favorite() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (owner_token, _) = register_user(&client, &address, "owner").await;
    let (user_token, _) = register_user(&client, &address, "user").await;
    let city = unique_city();

    let id = create_draft(
        &client,
        &address,
        &owner_token,
        "Favorited Apartment",
        &city,
        1_200_000.0,
    )
    .await;
    attach_image(&client, &address, &owner_token, id).await;
    publish(&client, &address, &owner_token, id).await;

    // Not favorited yet.
    let check = client
        .get(format!("{}/api/favorites/check/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(check.status().as_u16(), 200);
    let body: serde_json::Value = check.json().await.unwrap();
    assert_eq!(body["data"]["isFavorite"], false);

    let added = client
        .post(format!("{}/api/favorites/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(added.status().as_u16(), 201);

    // Adding the same listing twice is a conflict.
    let duplicate = client
        .post(format!("{}/api/favorites/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    let check = client
        .get(format!("{}/api/favorites/check/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = check.json().await.unwrap();
    assert_eq!(body["data"]["isFavorite"], true);

    // The list view carries the listing plus favoritedAt.
    let listed = client
        .get(format!("{}/api/favorites", address))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(listed.status().as_u16(), 200);
    let body: serde_json::Value = listed.json().await.unwrap();
    let entry = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"].as_i64() == Some(id))
        .expect("favorited listing missing from list");
    assert_eq!(entry["isFavorite"], true);
    assert!(entry["favoritedAt"].as_str().is_some());
    assert_eq!(entry["owner"]["name"], "Test Account");

    // Favorite flags also show up on the public list for this caller.
    let public = client
        .get(format!("{}/api/properties?location={}", address, city))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = public.json().await.unwrap();
    assert_eq!(body["data"][0]["isFavorite"], true);

    let removed = client
        .delete(format!("{}/api/favorites/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status().as_u16(), 200);

    // Removing twice reports the favorite as gone.
    let missing = client
        .delete(format!("{}/api/favorites/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn only_published_listings_can_be_favorited() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (owner_token, _) = register_user(&client, &address, "owner").await;
    let (user_token, _) = register_user(&client, &address, "user").await;
    let city = unique_city();

    let draft_id = create_draft(
        &client,
        &address,
        &owner_token,
        "Unlisted Draft Home",
        &city,
        900_000.0,
    )
    .await;

    let response = client
        .post(format!("{}/api/favorites/{}", address, draft_id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // Nonexistent ids get the same answer.
    let response = client
        .post(format!("{}/api/favorites/999999999", address))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn archived_listings_drop_out_of_favorite_lists() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (owner_token, _) = register_user(&client, &address, "owner").await;
    let (user_token, _) = register_user(&client, &address, "user").await;
    let city = unique_city();

    let id = create_draft(
        &client,
        &address,
        &owner_token,
        "Soon Removed Home",
        &city,
        700_000.0,
    )
    .await;
    attach_image(&client, &address, &owner_token, id).await;
    publish(&client, &address, &owner_token, id).await;

    client
        .post(format!("{}/api/favorites/{}", address, id))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();

    // Owner withdraws the listing; the favorite row stays but the list hides it.
    let deleted = client
        .delete(format!("{}/api/properties/{}", address, id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let listed = client
        .get(format!("{}/api/favorites", address))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = listed.json().await.unwrap();
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["id"].as_i64() != Some(id))
    );
}
