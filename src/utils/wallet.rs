// utils/wallet.rs
use crate::models::profilemodel::ChainType;

/// Wallet addresses are the tenant key; the lower-cased form is the
/// canonical identity everywhere in the store.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

pub fn infer_chain(address: &str) -> ChainType {
    let addr = address.trim();
    if addr.len() == 42 && addr.to_lowercase().starts_with("0x") {
        ChainType::Evm
    } else if addr.len() == 34 && (addr.starts_with('T') || addr.starts_with('t')) {
        ChainType::Tron
    } else {
        ChainType::Solana
    }
}

pub fn looks_like_address(address: &str) -> bool {
    let addr = address.trim();
    (20..=64).contains(&addr.len()) && addr.chars().all(|c| c.is_ascii_alphanumeric())
}
