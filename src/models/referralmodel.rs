use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per referred wallet. A wallet can be referred at most once,
/// enforced by the unique index on `referred_wallet`.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_wallet: String,
    pub referred_wallet: String,
    pub referral_code: String,
    pub referrer_points: i64,
    pub referred_points: i64,
    pub referrer_claimed: bool,
    pub referred_claimed: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "claimedAt")]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Referral {
    pub fn is_claimed(&self) -> bool {
        self.referrer_claimed && self.referred_claimed
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ReferralTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl ReferralTier {
    pub fn to_str(&self) -> &str {
        match self {
            ReferralTier::Bronze => "Bronze",
            ReferralTier::Silver => "Silver",
            ReferralTier::Gold => "Gold",
            ReferralTier::Platinum => "Platinum",
            ReferralTier::Diamond => "Diamond",
        }
    }
}

/// Static thresholds, highest first.
pub fn tier_of(referral_count: i32) -> ReferralTier {
    match referral_count {
        n if n >= 100 => ReferralTier::Diamond,
        n if n >= 50 => ReferralTier::Platinum,
        n if n >= 25 => ReferralTier::Gold,
        n if n >= 10 => ReferralTier::Silver,
        _ => ReferralTier::Bronze,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(tier_of(0), ReferralTier::Bronze);
        assert_eq!(tier_of(9), ReferralTier::Bronze);
        assert_eq!(tier_of(10), ReferralTier::Silver);
        assert_eq!(tier_of(24), ReferralTier::Silver);
        assert_eq!(tier_of(25), ReferralTier::Gold);
        assert_eq!(tier_of(49), ReferralTier::Gold);
        assert_eq!(tier_of(50), ReferralTier::Platinum);
        assert_eq!(tier_of(99), ReferralTier::Platinum);
        assert_eq!(tier_of(100), ReferralTier::Diamond);
        assert_eq!(tier_of(1000), ReferralTier::Diamond);
    }

    #[test]
    fn negative_counts_stay_bronze() {
        assert_eq!(tier_of(-1), ReferralTier::Bronze);
    }
}
