//! Kardex ledger tests
//!
//! Tests for the running-balance ledger including:
//! - Balance of movement N = balance of N-1 + delta of N, per key
//! - Keys never share a balance
//! - Offsetting movements restore the prior balance
//! - Wire shape of recorded rows

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    current_balance, verify_running_balances, AccountType, CategoryId, KardexMovement, LedgerKey,
    MovementEntry, MovementRequest, SourceDocument, SourceDocumentKind,
};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

fn request(entry: MovementEntry) -> MovementRequest {
    MovementRequest {
        source: SourceDocument {
            kind: SourceDocumentKind::Manual,
            id: None,
        },
        entry,
        concept: None,
    }
}

fn cash(delta: Decimal) -> MovementEntry {
    MovementEntry::Financiero {
        cuenta: AccountType::Caja,
        delta_monto: delta,
    }
}

fn lot(lote_id: i64, delta: Decimal) -> MovementEntry {
    MovementEntry::Fisico {
        lote_id,
        categoria: CategoryId::Segunda,
        delta_kg: delta,
    }
}

/// Append entries in order the way the service does
fn record_all(entries: Vec<MovementEntry>) -> Vec<KardexMovement> {
    let mut ledger: Vec<KardexMovement> = Vec::new();
    for (i, entry) in entries.into_iter().enumerate() {
        let at = start() + Duration::minutes(i as i64);
        let mut movement = KardexMovement::from_request(request(entry), &ledger, at);
        movement.id = Some(i as i64 + 1);
        ledger.push(movement);
    }
    ledger
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_first_movement_starts_from_zero() {
        let ledger = record_all(vec![cash(dec("250.50"))]);
        assert_eq!(ledger[0].running_balance, dec("250.50"));
    }

    #[test]
    fn test_keys_keep_separate_balances() {
        let ledger = record_all(vec![
            cash(dec("100")),
            lot(7, dec("40")),
            lot(8, dec("5")),
            cash(dec("-30")),
            lot(7, dec("-10")),
        ]);

        assert_eq!(current_balance(&ledger, LedgerKey::Account(AccountType::Caja)), dec("70"));
        assert_eq!(current_balance(&ledger, LedgerKey::Lot(7)), dec("30"));
        assert_eq!(current_balance(&ledger, LedgerKey::Lot(8)), dec("5"));
        assert_eq!(current_balance(&ledger, LedgerKey::Account(AccountType::Banco)), Decimal::ZERO);
    }

    #[test]
    fn test_offsetting_restores_balance() {
        let mut ledger = record_all(vec![lot(7, dec("40")), lot(7, dec("15"))]);
        let reversal = ledger[1].offsetting();
        assert_eq!(reversal.concept.as_deref(), Some("Reversión del movimiento 2"));

        let movement = KardexMovement::from_request(reversal, &ledger, start() + Duration::hours(1));
        assert_eq!(movement.running_balance, dec("40"));
        ledger.push(movement);
        assert!(verify_running_balances(&ledger).is_ok());
    }

    #[test]
    fn test_tampered_balance_is_reported() {
        let mut ledger = record_all(vec![cash(dec("10")), cash(dec("10")), cash(dec("10"))]);
        ledger[1].running_balance = dec("25");

        let mismatch = verify_running_balances(&ledger).unwrap_err();
        assert_eq!(mismatch.position, 1);
        assert_eq!(mismatch.movement_id, Some(2));
        assert_eq!(mismatch.expected, dec("20"));
        assert_eq!(mismatch.found, dec("25"));
    }

    #[test]
    fn test_row_wire_shape() {
        let ledger = record_all(vec![lot(7, dec("40"))]);
        let json = serde_json::to_value(&ledger[0]).unwrap();

        assert_eq!(json["tipo"], "fisico");
        assert_eq!(json["lote_id"], 7);
        assert_eq!(json["categoria"], "segunda");
        assert_eq!(json["tipo_documento"], "manual");
        assert_eq!(json["saldo"], "40");

        let back: KardexMovement = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger[0]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn delta_strategy() -> impl Strategy<Value = Decimal> {
        (-1_000_000i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn entry_strategy() -> impl Strategy<Value = MovementEntry> {
        prop_oneof![
            delta_strategy().prop_map(cash),
            (1i64..4, delta_strategy()).prop_map(|(id, d)| lot(id, d)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Running balance of each movement = previous balance of its key + delta
        #[test]
        fn prop_running_balance_chain(entries in prop::collection::vec(entry_strategy(), 1..30)) {
            let ledger = record_all(entries);
            prop_assert!(verify_running_balances(&ledger).is_ok());
        }

        /// Final balance per key equals the sum of its deltas
        #[test]
        fn prop_final_balance_is_sum_of_deltas(entries in prop::collection::vec(entry_strategy(), 1..30)) {
            let ledger = record_all(entries);
            for key in [
                LedgerKey::Account(AccountType::Caja),
                LedgerKey::Lot(1),
                LedgerKey::Lot(2),
                LedgerKey::Lot(3),
            ] {
                let sum: Decimal = ledger.iter().filter(|m| m.key() == key).map(|m| m.delta()).sum();
                prop_assert_eq!(current_balance(&ledger, key), sum);
            }
        }
    }
}
