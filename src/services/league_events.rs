use redis::AsyncCommands;
use redis::Client as RedisClient;
use std::sync::Arc;

use crate::models::events::LeagueEvent;

/// Publish a league event to Redis for realtime subscribers
pub async fn publish_league_event(redis_client: &Arc<RedisClient>, event: &LeagueEvent) -> Result<(), String> {
    let mut conn = redis_client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| format!("Failed to get Redis connection: {}", e))?;

    let channel = event.channel();
    let message = serde_json::to_string(event).map_err(|e| format!("Failed to serialize league event: {}", e))?;

    conn.publish::<_, _, ()>(&channel, message)
        .await
        .map_err(|e| format!("Failed to publish league event: {}", e))?;

    tracing::info!(
        "Published league event: {} on {}",
        event.event_type.as_str(),
        channel
    );

    Ok(())
}

/// Fan-out of league change notifications. Without a Redis client events are dropped.
#[derive(Clone, Default)]
pub struct LeagueEventPublisher {
    redis_client: Option<Arc<RedisClient>>,
}

impl LeagueEventPublisher {
    pub fn new(redis_client: Option<Arc<RedisClient>>) -> Self {
        Self { redis_client }
    }

    pub fn disabled() -> Self {
        Self { redis_client: None }
    }

    /// Publish after a committed mutation. Failures are logged, never returned.
    pub async fn publish(&self, event: LeagueEvent) {
        let Some(client) = &self.redis_client else {
            tracing::debug!("Redis not configured, dropping {} event", event.event_type.as_str());
            return;
        };

        if let Err(e) = publish_league_event(client, &event).await {
            tracing::warn!(
                "Failed to publish {} event for league {}: {}",
                event.event_type.as_str(),
                event.league_id,
                e
            );
        }
    }
}
