use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "chain_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Evm,
    Tron,
    Solana,
}

impl ChainType {
    pub fn to_str(&self) -> &str {
        match self {
            ChainType::Evm => "evm",
            ChainType::Tron => "tron",
            ChainType::Solana => "solana",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    X,
    Discord,
}

impl Platform {
    pub fn to_str(&self) -> &str {
        match self {
            Platform::X => "X",
            Platform::Discord => "Discord",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" | "twitter" => Ok(Platform::X),
            "discord" => Ok(Platform::Discord),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct WalletProfile {
    pub wallet_address: String,
    pub chain_type: ChainType,
    pub total_points: i64,
    pub connect_bonus_claimed: bool,

    pub x_connected: bool,
    pub x_username: Option<String>,
    pub x_id: Option<String>,
    pub x_connected_at: Option<DateTime<Utc>>,

    pub discord_connected: bool,
    pub discord_username: Option<String>,
    pub discord_id: Option<String>,
    pub discord_connected_at: Option<DateTime<Utc>>,
    pub discord_verified: bool,
    pub discord_verified_at: Option<DateTime<Utc>>,

    pub referral_code: Option<String>,
    pub referred_by: Option<String>,
    pub referral_count: i32,
    pub referral_points_earned: i64,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl WalletProfile {
    pub fn is_connected(&self, platform: Platform) -> bool {
        match platform {
            Platform::X => self.x_connected,
            Platform::Discord => self.discord_connected,
        }
    }

    /// A referral code may only be issued, and another wallet's code only
    /// applied, while the owner holds both connections and a verified
    /// Discord membership.
    pub fn referral_eligible(&self) -> bool {
        self.x_connected && self.discord_connected && self.discord_verified
    }
}

/// External identity captured when a platform is connected.
#[derive(Debug, Clone)]
pub struct PlatformIdentity {
    pub username: String,
    pub external_id: String,
}
