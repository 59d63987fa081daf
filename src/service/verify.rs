// service/verify.rs
//
// Thin callers to the two third-party checks. Both collapse everything
// that is not an explicit negative answer into an indeterminate outcome,
// and consumers treat indeterminate as "no change" (fail open).
use async_trait::async_trait;
use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Present,
    Absent,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweetStatus {
    Exists,
    Deleted,
    Indeterminate,
}

#[async_trait]
pub trait MembershipVerifier: Send + Sync {
    async fn check_member(&self, guild_id: &str, discord_user_id: &str) -> MembershipStatus;
}

#[async_trait]
pub trait TweetVerifier: Send + Sync {
    async fn tweet_exists(&self, url: &str) -> TweetStatus;
}

pub struct DiscordApi {
    client: reqwest::Client,
    bot_token: String,
}

impl DiscordApi {
    pub fn new(bot_token: String) -> Self {
        DiscordApi {
            client: reqwest::Client::new(),
            bot_token,
        }
    }
}

#[async_trait]
impl MembershipVerifier for DiscordApi {
    async fn check_member(&self, guild_id: &str, discord_user_id: &str) -> MembershipStatus {
        if self.bot_token.is_empty() || guild_id.is_empty() {
            tracing::warn!("Discord membership check skipped: bot token or guild id not configured");
            return MembershipStatus::Indeterminate;
        }

        let url = format!(
            "https://discord.com/api/v10/guilds/{}/members/{}",
            guild_id, discord_user_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => MembershipStatus::Present,
            // Only a confirmed not-found means the user left the server.
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => MembershipStatus::Absent,
            Ok(resp) => {
                tracing::warn!(
                    "Discord membership check returned {} for user {}",
                    resp.status(),
                    discord_user_id
                );
                MembershipStatus::Indeterminate
            }
            Err(err) => {
                tracing::warn!("Discord membership check failed: {}", err);
                MembershipStatus::Indeterminate
            }
        }
    }
}

pub struct TwitterOembed {
    client: reqwest::Client,
}

impl TwitterOembed {
    pub fn new() -> Self {
        TwitterOembed {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for TwitterOembed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TweetVerifier for TwitterOembed {
    async fn tweet_exists(&self, url: &str) -> TweetStatus {
        let response = self
            .client
            .get("https://publish.twitter.com/oembed")
            .query(&[("url", url)])
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => TweetStatus::Exists,
            Ok(resp)
                if resp.status() == StatusCode::NOT_FOUND
                    || resp.status() == StatusCode::FORBIDDEN =>
            {
                TweetStatus::Deleted
            }
            // Rate limits and transport errors must never look like a
            // deleted tweet.
            Ok(resp) => {
                tracing::warn!("Tweet existence check returned {} for {}", resp.status(), url);
                TweetStatus::Indeterminate
            }
            Err(err) => {
                tracing::warn!("Tweet existence check failed for {}: {}", url, err);
                TweetStatus::Indeterminate
            }
        }
    }
}

#[cfg(test)]
pub mod stubs {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct StaticMembership {
        pub status: MembershipStatus,
        pub calls: AtomicUsize,
    }

    impl StaticMembership {
        pub fn new(status: MembershipStatus) -> Self {
            StaticMembership {
                status,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MembershipVerifier for StaticMembership {
        async fn check_member(&self, _guild_id: &str, _discord_user_id: &str) -> MembershipStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.status
        }
    }

    pub struct StaticTweets {
        pub status: TweetStatus,
        pub calls: AtomicUsize,
    }

    impl StaticTweets {
        pub fn new(status: TweetStatus) -> Self {
            StaticTweets {
                status,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TweetVerifier for StaticTweets {
        async fn tweet_exists(&self, _url: &str) -> TweetStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.status
        }
    }
}
