//! End-to-end policy lifecycles driven through the public API.

use fixinsured_crypto::ClaimTuple;
use fixinsured_nullables::{NullClock, NullPolicyStore, NullRandom};
use fixinsured_policy::{
    CallContext, Policy, PolicyError, PolicyEvent, PolicyState, ScoreLottery, TransferKind,
    WeightedLottery,
};
use fixinsured_types::{Address, Amount, NoClaimPremium, PolicyParams, PolicyTimeouts};

fn addr(n: u32) -> Address {
    Address::new(format!("0x{:040x}", n))
}

const INSURED: u32 = 1;
const EV: [u32; 2] = [10, 11];
const AV: [u32; 2] = [20, 21];
const INSURERS: [u32; 6] = [30, 31, 32, 33, 34, 35];

fn params() -> PolicyParams {
    let digest = ClaimTuple::new("James", "", "Jiang", "ABC123", "NB1234", "2022-05-20").digest();
    PolicyParams {
        eligibility_verifier_type: 1,
        accident_verifier_type: 1,
        potential_insurer_limit: 6,
        insurer_limit: 3,
        fixed_loss: Amount::new(567),
        claim_digest: digest,
        flight_code: "NB1234".into(),
        flight_date: "2022-05-20".into(),
        no_claim_premium: NoClaimPremium::RefundInsured,
        timeouts: PolicyTimeouts::default(),
    }
}

struct Harness {
    clock: NullClock,
    policy: Policy,
}

impl Harness {
    fn new(params: PolicyParams) -> Self {
        let clock = NullClock::default();
        let policy = Policy::create(addr(INSURED), params, clock.now()).unwrap();
        Self { clock, policy }
    }

    fn ctx(&self, who: u32) -> CallContext {
        CallContext::new(addr(who), self.clock.advance(1))
    }

    fn pay(&self, who: u32, value: u128) -> CallContext {
        CallContext::paying(addr(who), Amount::new(value), self.clock.advance(1))
    }

    /// Premium range [10, 12], two verifiers per role.
    fn configure(&mut self) {
        let owner = self.ctx(INSURED);
        self.policy
            .set_premium_range(&owner, Amount::new(10), Amount::new(12))
            .unwrap();
        for v in EV {
            self.policy.add_eligibility_verifier(&owner, addr(v)).unwrap();
        }
        for v in AV {
            self.policy.add_accident_verifier(&owner, addr(v)).unwrap();
        }
    }

    fn verify_eligible(&mut self) {
        for v in EV {
            let ctx = self.ctx(v);
            self.policy.verify_eligibility(&ctx, true).unwrap();
        }
    }

    fn fill_pool(&mut self) {
        for (i, who) in INSURERS.iter().enumerate() {
            let ctx = self.pay(*who, 189);
            self.policy.add_potential_insurer(&ctx, i as u64 + 1).unwrap();
        }
    }

    fn draw(&mut self, premium: u128) {
        let ctx = self.pay(INSURED, premium);
        self.policy
            .resolve_lottery(&ctx, &NullRandom::constant([42u8; 32]), &WeightedLottery)
            .unwrap();
    }

    fn attest_accident(&mut self, results: [bool; 2]) {
        for (v, result) in AV.iter().zip(results) {
            let ctx = self.ctx(*v);
            self.policy.verify_accident(&ctx, result).unwrap();
        }
    }

    fn to_active(&mut self, premium: u128) {
        self.configure();
        self.verify_eligible();
        self.fill_pool();
        self.draw(premium);
    }
}

#[test]
fn full_lifecycle_with_accident_pays_the_insured() {
    let mut h = Harness::new(params());
    h.configure();
    h.verify_eligible();
    assert_eq!(h.policy.state(), PolicyState::OpenVerified);
    assert_eq!(h.policy.eligibility_final_result().unwrap(), true);

    h.fill_pool();
    assert_eq!(h.policy.state(), PolicyState::Lottery);
    assert_eq!(h.policy.escrow_balance(), Amount::new(6 * 189));

    h.draw(12);
    assert_eq!(h.policy.state(), PolicyState::ActivePolicy);
    assert_eq!(h.policy.selected_insurers().len(), 3);
    let stake: u128 = h.policy.selected_insurers().iter().map(|s| s.stake.raw()).sum();
    assert_eq!(stake, 567);
    assert_eq!(h.policy.escrow_balance(), Amount::new(567 + 12));
    let refunds = h.policy.drain_transfers();
    assert_eq!(refunds.len(), 3);
    assert!(refunds
        .iter()
        .all(|t| t.kind == TransferKind::StakeRefund && t.amount == Amount::new(189)));

    h.attest_accident([true, true]);
    assert_eq!(h.policy.state(), PolicyState::AccidentVerified);
    assert_eq!(h.policy.accident_final_result().unwrap(), true);

    let ctx = h.ctx(99);
    let transfers = h.policy.settle(&ctx).unwrap();
    assert_eq!(h.policy.state(), PolicyState::Closed);
    let payout = transfers
        .iter()
        .find(|t| t.kind == TransferKind::Payout)
        .unwrap();
    assert_eq!(payout.to, addr(INSURED));
    assert_eq!(payout.amount, Amount::new(567));
    let shares: Vec<_> = transfers
        .iter()
        .filter(|t| t.kind == TransferKind::PremiumShare)
        .collect();
    assert_eq!(shares.len(), 3);
    assert!(shares.iter().all(|t| t.amount == Amount::new(4)));
    assert!(h.policy.escrow_balance().is_zero());

    // Terminal: every mutating call is a state error.
    let owner = h.ctx(INSURED);
    assert!(matches!(
        h.policy.set_premium_range(&owner, Amount::new(1), Amount::new(2)),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy.add_accident_verifier(&owner, addr(50)),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(h.policy.settle(&h.ctx(99)), Err(PolicyError::State(_))));
    assert!(matches!(h.policy.expire(&h.ctx(99)), Err(PolicyError::State(_))));
    let insurer = h.pay(60, 189);
    assert!(matches!(
        h.policy.add_potential_insurer(&insurer, 1),
        Err(PolicyError::State(_))
    ));
}

#[test]
fn escrow_fully_accounted_for_after_settlement() {
    let mut h = Harness::new(params());
    h.to_active(11);
    h.attest_accident([true, true]);
    h.policy.settle(&h.ctx(99)).unwrap();

    let escrow = h.policy.escrow();
    assert_eq!(escrow.total_deposited(), Amount::new(6 * 189 + 11));
    assert_eq!(escrow.total_released(), escrow.total_deposited());
    let paid: u128 = h.policy.drain_transfers().iter().map(|t| t.amount.raw()).sum();
    assert_eq!(paid, 6 * 189 + 11);
}

#[test]
fn uneven_premium_remainder_goes_to_first_winners() {
    let mut h = Harness::new(params());
    h.to_active(11);
    let winners: Vec<Address> = h
        .policy
        .selected_insurers()
        .iter()
        .map(|s| s.address.clone())
        .collect();
    h.attest_accident([true, true]);
    let transfers = h.policy.settle(&h.ctx(99)).unwrap();
    let shares: Vec<_> = transfers
        .iter()
        .filter(|t| t.kind == TransferKind::PremiumShare)
        .collect();
    assert_eq!(shares[0].to, winners[0]);
    assert_eq!(shares[0].amount, Amount::new(4));
    assert_eq!(shares[1].amount, Amount::new(4));
    assert_eq!(shares[2].amount, Amount::new(3));
}

#[test]
fn no_accident_returns_stakes_and_refunds_premium() {
    let mut h = Harness::new(params());
    h.to_active(12);
    h.policy.drain_transfers();
    h.attest_accident([true, false]);
    assert_eq!(h.policy.state(), PolicyState::AccidentVerified);
    assert_eq!(h.policy.accident_final_result().unwrap(), false);

    let transfers = h.policy.settle(&h.ctx(99)).unwrap();
    let returns = transfers
        .iter()
        .filter(|t| t.kind == TransferKind::StakeReturn)
        .count();
    assert_eq!(returns, 3);
    let refund = transfers
        .iter()
        .find(|t| t.kind == TransferKind::PremiumRefund)
        .unwrap();
    assert_eq!(refund.to, addr(INSURED));
    assert_eq!(refund.amount, Amount::new(12));
    assert_eq!(h.policy.state(), PolicyState::Closed);
}

#[test]
fn no_accident_can_pay_premium_to_insurers() {
    let mut h = Harness::new(PolicyParams {
        no_claim_premium: NoClaimPremium::PayInsurers,
        ..params()
    });
    h.to_active(12);
    h.attest_accident([false, false]);
    let transfers = h.policy.settle(&h.ctx(99)).unwrap();
    assert!(transfers.iter().all(|t| t.to != addr(INSURED)));
    let premium: u128 = transfers
        .iter()
        .filter(|t| t.kind == TransferKind::PremiumShare)
        .map(|t| t.amount.raw())
        .sum();
    assert_eq!(premium, 12);
}

#[test]
fn rejected_eligibility_closes_the_policy() {
    let mut h = Harness::new(params());
    h.configure();
    let ctx = h.ctx(EV[0]);
    h.policy.verify_eligibility(&ctx, true).unwrap();
    assert!(matches!(
        h.policy.eligibility_final_result(),
        Err(PolicyError::NotReady(_))
    ));
    let ctx = h.ctx(EV[1]);
    h.policy.verify_eligibility(&ctx, false).unwrap();
    assert_eq!(h.policy.eligibility_final_result().unwrap(), false);
    assert_eq!(h.policy.state(), PolicyState::Closed);
}

#[test]
fn closed_policy_rejects_every_call_as_state_error() {
    let mut h = Harness::new(params());
    h.configure();
    for (v, result) in EV.iter().zip([true, false]) {
        let ctx = h.ctx(*v);
        h.policy.verify_eligibility(&ctx, result).unwrap();
    }
    assert_eq!(h.policy.state(), PolicyState::Closed);
    let before = h.policy.to_bytes().unwrap();

    assert!(matches!(
        h.policy
            .set_premium_range(&h.ctx(99), Amount::new(1), Amount::new(2)),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy.settle(&h.pay(99, 1)),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy.verify_accident(&h.ctx(99), true),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy.add_eligibility_verifier(&h.ctx(99), addr(98)),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy.add_potential_insurer(&h.pay(INSURED, 189), 1),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy
            .resolve_lottery(&h.pay(99, 12), &NullRandom::constant([1u8; 32]), &ScoreLottery),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(h.policy.expire(&h.ctx(99)), Err(PolicyError::State(_))));
    assert_eq!(h.policy.to_bytes().unwrap(), before);
}

#[test]
fn authorization_and_state_are_checked_before_payment() {
    let mut h = Harness::new(params());
    assert!(matches!(
        h.policy
            .set_premium_range(&h.pay(99, 1), Amount::new(10), Amount::new(12)),
        Err(PolicyError::Authorization(_))
    ));
    assert!(matches!(
        h.policy.add_accident_verifier(&h.pay(99, 1), addr(20)),
        Err(PolicyError::Authorization(_))
    ));
    assert!(matches!(
        h.policy.verify_eligibility(&h.pay(EV[0], 1), true),
        Err(PolicyError::Authorization(_))
    ));
    assert!(matches!(
        h.policy.settle(&h.pay(99, 1)),
        Err(PolicyError::State(_))
    ));

    h.configure();
    assert!(matches!(
        h.policy.verify_accident(&h.pay(AV[0], 1), true),
        Err(PolicyError::State(_))
    ));
    assert!(matches!(
        h.policy.verify_eligibility(&h.pay(EV[0], 1), true),
        Err(PolicyError::Payment(_))
    ));
}

#[test]
fn verifier_guards() {
    let mut h = Harness::new(params());
    let owner = h.ctx(INSURED);

    // Attestations need the premium range first.
    h.policy.add_eligibility_verifier(&owner, addr(EV[0])).unwrap();
    h.policy.add_accident_verifier(&owner, addr(AV[0])).unwrap();
    let early = h.policy.verify_eligibility(&h.ctx(EV[0]), true);
    assert!(matches!(early, Err(PolicyError::State(_))));

    h.policy
        .set_premium_range(&owner, Amount::new(10), Amount::new(12))
        .unwrap();
    assert!(matches!(
        h.policy.add_eligibility_verifier(&h.ctx(7), addr(EV[1])),
        Err(PolicyError::Authorization(_))
    ));
    assert!(matches!(
        h.policy.add_eligibility_verifier(&owner, addr(EV[0])),
        Err(PolicyError::InvalidArgument(_))
    ));
    assert!(matches!(
        h.policy.add_eligibility_verifier(&owner, addr(INSURED)),
        Err(PolicyError::InvalidArgument(_))
    ));
    h.policy.add_eligibility_verifier(&owner, addr(EV[1])).unwrap();

    assert!(matches!(
        h.policy.verify_eligibility(&h.ctx(77), true),
        Err(PolicyError::Authorization(_))
    ));
    h.policy.verify_eligibility(&h.ctx(EV[0]), true).unwrap();
    assert!(matches!(
        h.policy.verify_eligibility(&h.ctx(EV[0]), true),
        Err(PolicyError::DuplicateAttestation(_))
    ));
    // Registration closed with the first attestation.
    assert!(matches!(
        h.policy.add_eligibility_verifier(&owner, addr(12)),
        Err(PolicyError::State(_))
    ));
    // Accident attestations wait for ACTIVE_POLICY.
    assert!(matches!(
        h.policy.verify_accident(&h.ctx(AV[0]), true),
        Err(PolicyError::State(_))
    ));
}

#[test]
fn insurer_guards() {
    let mut h = Harness::new(params());
    h.configure();

    let early = h.pay(INSURERS[0], 189);
    assert!(matches!(
        h.policy.add_potential_insurer(&early, 1),
        Err(PolicyError::State(_))
    ));
    h.verify_eligible();

    let cases = [
        (h.pay(INSURED, 189), 1),
        (h.pay(EV[0], 189), 1),
        (h.pay(AV[1], 189), 1),
    ];
    for (ctx, weight) in &cases {
        assert!(matches!(
            h.policy.add_potential_insurer(ctx, *weight),
            Err(PolicyError::Authorization(_))
        ));
    }
    assert!(matches!(
        h.policy.add_potential_insurer(&h.pay(INSURERS[0], 188), 1),
        Err(PolicyError::Payment(_))
    ));
    assert!(matches!(
        h.policy.add_potential_insurer(&h.pay(INSURERS[0], 189), 0),
        Err(PolicyError::InvalidArgument(_))
    ));
    assert!(h.policy.escrow_balance().is_zero());

    h.fill_pool();
    assert!(matches!(
        h.policy.add_potential_insurer(&h.pay(60, 189), 1),
        Err(PolicyError::Capacity(_))
    ));
    assert_eq!(h.policy.potential_insurers().len(), 6);
}

#[test]
fn lottery_guards_leave_state_untouched() {
    let mut h = Harness::new(params());
    h.configure();
    h.verify_eligible();

    let vrf = NullRandom::constant([1u8; 32]);
    assert!(matches!(
        h.policy.resolve_lottery(&h.pay(INSURED, 12), &vrf, &WeightedLottery),
        Err(PolicyError::State(_))
    ));
    h.fill_pool();
    let balance = h.policy.escrow_balance();

    assert!(matches!(
        h.policy.resolve_lottery(&h.pay(INSURERS[0], 12), &vrf, &WeightedLottery),
        Err(PolicyError::Authorization(_))
    ));
    assert!(matches!(
        h.policy.resolve_lottery(&h.pay(INSURED, 13), &vrf, &WeightedLottery),
        Err(PolicyError::Payment(_))
    ));
    assert!(matches!(
        h.policy.resolve_lottery(&h.pay(INSURED, 9), &vrf, &WeightedLottery),
        Err(PolicyError::Payment(_))
    ));
    let unavailable = h
        .policy
        .resolve_lottery(&h.pay(INSURED, 12), &NullRandom::unavailable(), &ScoreLottery)
        .unwrap_err();
    assert!(unavailable.is_retryable());

    assert_eq!(h.policy.state(), PolicyState::Lottery);
    assert_eq!(h.policy.escrow_balance(), balance);
    assert!(h.policy.selected_insurers().is_empty());
    assert!(h.policy.pending_transfers().is_empty());

    h.policy
        .resolve_lottery(&h.pay(INSURED, 10), &vrf, &ScoreLottery)
        .unwrap();
    assert_eq!(h.policy.premium(), Some(Amount::new(10)));
}

#[test]
fn settle_before_accident_verified_is_state_error() {
    let mut h = Harness::new(params());
    h.to_active(12);
    assert!(matches!(h.policy.settle(&h.ctx(99)), Err(PolicyError::State(_))));
    assert!(matches!(
        h.policy.accident_final_result(),
        Err(PolicyError::NotReady(_))
    ));
}

#[test]
fn stalled_lottery_expires_with_full_refund() {
    let mut h = Harness::new(PolicyParams {
        timeouts: PolicyTimeouts {
            lottery_secs: Some(600),
            ..PolicyTimeouts::default()
        },
        ..params()
    });
    h.configure();
    h.verify_eligible();
    h.fill_pool();
    h.policy.drain_events();

    assert!(matches!(h.policy.expire(&h.ctx(99)), Err(PolicyError::NotReady(_))));
    h.clock.advance(600);
    let refunds = h.policy.expire(&h.ctx(99)).unwrap();
    assert_eq!(refunds.len(), 6);
    assert!(refunds.iter().all(|t| t.amount == Amount::new(189)));
    assert_eq!(h.policy.state(), PolicyState::Closed);
    assert!(h.policy.escrow_balance().is_zero());
    assert!(h
        .policy
        .drain_events()
        .iter()
        .any(|e| matches!(e, PolicyEvent::Expired { state: PolicyState::Lottery, .. })));
}

#[test]
fn events_trace_the_lifecycle() {
    let mut h = Harness::new(params());
    h.to_active(12);
    let events = h.policy.drain_events();
    let transitions: Vec<PolicyState> = events
        .iter()
        .filter_map(|e| match e {
            PolicyEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            PolicyState::OpenVerified,
            PolicyState::Lottery,
            PolicyState::ActivePolicy
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, PolicyEvent::LotteryResolved { premium, .. } if *premium == Amount::new(12))));
}

#[test]
fn lifecycle_survives_persistence() {
    let store = NullPolicyStore::new();
    let mut h = Harness::new(params());
    h.configure();
    h.verify_eligible();
    h.fill_pool();
    h.policy.save_to(&store).unwrap();

    let mut restored = Policy::load_from(&store, &h.policy.id()).unwrap();
    assert_eq!(restored.state(), PolicyState::Lottery);
    assert_eq!(restored.escrow_balance(), Amount::new(6 * 189));
    let ctx = h.pay(INSURED, 12);
    restored
        .resolve_lottery(&ctx, &NullRandom::constant([3u8; 32]), &WeightedLottery)
        .unwrap();
    assert_eq!(restored.state(), PolicyState::ActivePolicy);
}
