// config.rs
#[derive(Debug, Clone, Copy)]
pub struct PointsConfig {
    pub connect_bonus: i64,
    pub x_connect: i64,
    pub discord_connect: i64,
    pub discord_verify: i64,
    pub daily_post: i64,
    pub referral_referrer: i64,
    pub referral_referred: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        PointsConfig {
            connect_bonus: 300,
            x_connect: 100,
            discord_connect: 50,
            discord_verify: 50,
            daily_post: 100,
            referral_referrer: 50,
            referral_referred: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscordSettings {
    pub bot_token: String,
    pub guild_id: String,
    pub invite_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileConfig {
    /// Checks between cooperative pauses in the membership sweep.
    pub batch_size: usize,
    pub batch_pause_secs: u64,
    /// Pause between individual tweet-existence calls.
    pub tweet_pause_ms: u64,
    pub membership_sweep_hours: u64,
    pub tweet_sweep_hours: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            batch_size: 25,
            batch_pause_secs: 2,
            tweet_pause_ms: 500,
            membership_sweep_hours: 6,
            tweet_sweep_hours: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub admin_api_key: String,
    pub points: PointsConfig,
    pub discord: DiscordSettings,
    pub reconcile: ReconcileConfig,
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let admin_api_key = std::env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);

        let points = PointsConfig {
            connect_bonus: env_i64("POINTS_CONNECT_BONUS", 300),
            x_connect: env_i64("POINTS_X_CONNECT", 100),
            discord_connect: env_i64("POINTS_DISCORD_CONNECT", 50),
            discord_verify: env_i64("POINTS_DISCORD_VERIFY", 50),
            daily_post: env_i64("POINTS_DAILY_POST", 100),
            referral_referrer: env_i64("POINTS_REFERRAL_REFERRER", 50),
            referral_referred: env_i64("POINTS_REFERRAL_REFERRED", 50),
        };

        let discord = DiscordSettings {
            bot_token: std::env::var("DISCORD_BOT_TOKEN").unwrap_or_else(|_| "".to_string()),
            guild_id: std::env::var("DISCORD_GUILD_ID").unwrap_or_else(|_| "".to_string()),
            invite_url: std::env::var("DISCORD_INVITE_URL")
                .unwrap_or_else(|_| "https://discord.gg/".to_string()),
        };

        let reconcile = ReconcileConfig {
            batch_size: env_u64("RECONCILE_BATCH_SIZE", 25) as usize,
            batch_pause_secs: env_u64("RECONCILE_BATCH_PAUSE_SECS", 2),
            tweet_pause_ms: env_u64("RECONCILE_TWEET_PAUSE_MS", 500),
            membership_sweep_hours: env_u64("MEMBERSHIP_SWEEP_HOURS", 6),
            tweet_sweep_hours: env_u64("TWEET_SWEEP_HOURS", 12),
        };

        Config {
            database_url,
            port,
            admin_api_key,
            points,
            discord,
            reconcile,
        }
    }
}
