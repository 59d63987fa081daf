// db/db.rs
use sqlx::{Pool, Postgres};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

pub const PROFILE_COLUMNS: &str = r#"
    wallet_address, chain_type, total_points, connect_bonus_claimed,
    x_connected, x_username, x_id, x_connected_at,
    discord_connected, discord_username, discord_id, discord_connected_at,
    discord_verified, discord_verified_at,
    referral_code, referred_by, referral_count, referral_points_earned,
    created_at, updated_at
"#;

pub const COMPLETION_COLUMNS: &str = r#"
    id, wallet_address, task_type, points_awarded, completion_date,
    metadata, status, completed_at, revoked_at
"#;

pub const REFERRAL_COLUMNS: &str = r#"
    id, referrer_wallet, referred_wallet, referral_code,
    referrer_points, referred_points, referrer_claimed, referred_claimed,
    created_at, claimed_at
"#;
