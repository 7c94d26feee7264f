use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::utils::{TestApp, TestUser};

pub async fn post_json(client: &Client, url: String, user: &TestUser, body: Value) -> Response {
    client
        .post(url)
        .header("Authorization", user.bearer())
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.")
}

pub async fn post_empty(client: &Client, url: String, user: &TestUser) -> Response {
    client
        .post(url)
        .header("Authorization", user.bearer())
        .send()
        .await
        .expect("Failed to execute request.")
}

pub async fn get_json(client: &Client, url: String, user: &TestUser) -> (reqwest::StatusCode, Value) {
    let response = client
        .get(url)
        .header("Authorization", user.bearer())
        .send()
        .await
        .expect("Failed to execute request.");
    let status = response.status();
    let body = response.json::<Value>().await.expect("Failed to parse response");
    (status, body)
}

/// Create a league and return the `data` payload (league + participants).
pub async fn create_league(app: &TestApp, client: &Client, admin: &TestUser, format: &str) -> Value {
    let response = post_json(
        client,
        format!("{}/leagues", app.address),
        admin,
        json!({
            "name": "Friday Night League",
            "format": format,
            "team_name": "Admin FC"
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201, "league creation should succeed");
    let body: Value = response.json().await.expect("Failed to parse create response");
    body["data"].clone()
}

pub async fn join_league(app: &TestApp, client: &Client, user: &TestUser, invite_code: &str, team_name: &str) -> Response {
    post_json(
        client,
        format!("{}/leagues/join", app.address),
        user,
        json!({ "invite_code": invite_code, "team_name": team_name }),
    )
    .await
}

/// Create a league with `others.len() + 1` participants, still in lobby.
pub async fn league_with_players(app: &TestApp, client: &Client, admin: &TestUser, others: &[TestUser], format: &str) -> String {
    let created = create_league(app, client, admin, format).await;
    let league_id = created["league"]["id"].as_str().expect("No league id").to_string();
    let invite_code = created["league"]["invite_code"].as_str().expect("No invite code").to_string();

    for (index, user) in others.iter().enumerate() {
        let response = join_league(app, client, user, &invite_code, &format!("Team {}", index + 1)).await;
        assert!(response.status().is_success(), "join should succeed");
    }

    league_id
}
