use proptest::prelude::*;

use fixinsured_lottery::{
    split_equally, Escrow, InsurerPool, LotterySelector, ScoreLottery, TransferKind,
    WeightedLottery,
};
use fixinsured_types::{Address, Amount, Timestamp};
use fixinsured_vrf::BeaconVrf;

fn addr(n: usize) -> Address {
    Address::new(format!("0x{:040x}", n))
}

proptest! {
    /// Equal shares always sum to the total and differ by at most one unit.
    #[test]
    fn split_conserves_total(total in 0u128..1_000_000_000, parts in 1usize..20) {
        let shares = split_equally(Amount::new(total), parts).unwrap();
        prop_assert_eq!(shares.len(), parts);
        let sum: u128 = shares.iter().map(|s| s.raw()).sum();
        prop_assert_eq!(sum, total);
        let max = shares.iter().map(|s| s.raw()).max().unwrap();
        let min = shares.iter().map(|s| s.raw()).min().unwrap();
        prop_assert!(max - min <= 1);
    }

    /// 6 candidates at 189 each, 3 winners: winners hold 567, losers are
    /// refunded in full, and escrow grows by fixed loss plus premium.
    #[test]
    fn lottery_conserves_stake(
        beacon in any::<[u8; 32]>(),
        weights in prop::collection::vec(1u64..1_000, 6),
        premium in 10u128..=12,
        weighted in any::<bool>(),
    ) {
        let share = Amount::new(189);
        let mut pool = InsurerPool::new(6, 3, share);
        let mut escrow = Escrow::new();
        for (i, w) in weights.iter().enumerate() {
            pool.enter(addr(i + 1), *w, share, Timestamp::new(0)).unwrap();
            escrow.hold_stake(addr(i + 1), share).unwrap();
        }
        escrow.hold_premium(addr(100), Amount::new(premium)).unwrap();

        let selector: &dyn LotterySelector = if weighted { &WeightedLottery } else { &ScoreLottery };
        let outcome = pool.resolve(&BeaconVrf::new(beacon, 1), selector, b"policy").unwrap();
        prop_assert_eq!(outcome.selected.len(), 3);

        let mut refunded = Amount::ZERO;
        for loser in &outcome.rejected {
            let t = escrow.release_stake(&loser.address, TransferKind::StakeRefund).unwrap();
            prop_assert_eq!(t.amount, share);
            refunded = refunded + t.amount;
        }
        prop_assert_eq!(refunded, Amount::new(567));
        prop_assert_eq!(pool.selected_stake(), Some(Amount::new(567)));
        prop_assert_eq!(escrow.balance(), Amount::new(567 + premium));
        escrow.check_invariant().unwrap();
    }
}
