//! Static parameter pools

use crate::error::CatalogError;
use crate::{ClientId, OrderId};
use rand::seq::IndexedRandom;
use std::path::Path;

const REPRESENTATIVES: &[i64] = &[
    105, 106, 107, 113, 124, 125, 132, 135, 191, 208, 213, 226, 234, 236, 247, 250, 255, 265, 266,
    267, 268, 270, 279, 287, 290, 292, 294, 302, 304, 309, 310, 311, 312, 313, 314, 402, 419, 423,
    425, 32767,
];

const PAYMENT_CONDITIONS: &[i64] = &[711, 712, 713, 714, 715, 717, 719];

const CARRIERS: &[i64] = &[
    1, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 27, 28,
    29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 48, 49, 50, 51, 52, 53,
    54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77,
    78, 80, 82, 83, 84, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95, 96, 97, 98, 99, 100, 101, 102, 103,
    105, 106, 107, 108,
];

/// Pre-existing orders on the target. Read-only workloads use them only
/// when `load.static_order_fallback` is on and the store has nothing yet.
const KNOWN_ORDERS: &[OrderId] = &[
    15, 21, 24, 25, 29, 30, 31, 33, 35, 37, 39, 42, 44, 47, 50, 51, 53, 54, 55, 59, 66, 67, 68, 69,
    75, 79, 81, 83, 86, 87, 88, 90, 91, 93, 94, 97, 101, 102, 103, 106, 107, 108, 109, 110, 113,
    116, 119, 123, 124, 126,
];

const CLIENTS: std::ops::RangeInclusive<ClientId> = 1..=100;

/// Fixed enumerations parameters are drawn from
#[derive(Debug, Clone)]
pub struct StaticPools {
    product_codes: Vec<String>,
    clients: Vec<ClientId>,
}

impl StaticPools {
    /// Load product codes from a file with one code per line. Blank lines
    /// are ignored; a missing or empty file is fatal.
    pub async fn load(product_codes_path: &Path) -> Result<Self, CatalogError> {
        let content = tokio::fs::read_to_string(product_codes_path)
            .await
            .map_err(|source| CatalogError::ProductCodesUnreadable {
                path: product_codes_path.to_path_buf(),
                source,
            })?;

        let codes: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if codes.is_empty() {
            return Err(CatalogError::NoProductCodes(product_codes_path.to_path_buf()));
        }
        Ok(Self {
            product_codes: codes,
            clients: CLIENTS.collect(),
        })
    }

    pub fn with_product_codes(product_codes: Vec<String>) -> Result<Self, CatalogError> {
        if product_codes.is_empty() {
            return Err(CatalogError::NoProductCodes("<inline>".into()));
        }
        Ok(Self {
            product_codes,
            clients: CLIENTS.collect(),
        })
    }

    pub fn product_codes(&self) -> &[String] {
        &self.product_codes
    }

    pub fn random_product_code(&self) -> String {
        pick(&self.product_codes).cloned().unwrap_or_default()
    }

    pub fn random_representative(&self) -> i64 {
        pick(REPRESENTATIVES).copied().unwrap_or(REPRESENTATIVES[0])
    }

    pub fn random_client(&self) -> ClientId {
        pick(&self.clients).copied().unwrap_or(1)
    }

    pub fn random_payment_condition(&self) -> i64 {
        pick(PAYMENT_CONDITIONS).copied().unwrap_or(PAYMENT_CONDITIONS[0])
    }

    pub fn random_carrier(&self) -> i64 {
        pick(CARRIERS).copied().unwrap_or(CARRIERS[0])
    }

    pub fn random_known_order(&self) -> OrderId {
        pick(KNOWN_ORDERS).copied().unwrap_or(KNOWN_ORDERS[0])
    }

    pub fn is_representative(value: i64) -> bool {
        REPRESENTATIVES.contains(&value)
    }

    pub fn is_payment_condition(value: i64) -> bool {
        PAYMENT_CONDITIONS.contains(&value)
    }

    pub fn is_carrier(value: i64) -> bool {
        CARRIERS.contains(&value)
    }

    pub fn is_known_order(value: OrderId) -> bool {
        KNOWN_ORDERS.contains(&value)
    }
}

fn pick<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_product_codes_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0001\n\n  0002  \n").unwrap();

        let pools = StaticPools::load(file.path()).await.unwrap();
        assert_eq!(pools.product_codes(), &["0001".to_string(), "0002".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_or_empty_product_codes_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("codigos_produto.txt");
        assert!(matches!(
            StaticPools::load(&missing).await,
            Err(CatalogError::ProductCodesUnreadable { .. })
        ));

        std::fs::write(&missing, "\n   \n").unwrap();
        assert!(matches!(
            StaticPools::load(&missing).await,
            Err(CatalogError::NoProductCodes(_))
        ));
    }

    #[test]
    fn test_random_draws_stay_in_pools() {
        let pools = StaticPools::with_product_codes(vec!["A".to_string()]).unwrap();
        for _ in 0..50 {
            assert!(StaticPools::is_representative(pools.random_representative()));
            assert!(StaticPools::is_payment_condition(pools.random_payment_condition()));
            assert!(StaticPools::is_carrier(pools.random_carrier()));
            assert!(StaticPools::is_known_order(pools.random_known_order()));
            assert!((1..=100).contains(&pools.random_client()));
            assert_eq!(pools.random_product_code(), "A");
        }
    }
}
