//! Escrow lifecycle over the balance-mapping backend.
//!
//! Destinations here are bare identities, so the destination mismatch
//! failures the account-model backend can produce are not representable;
//! everything else about the lifecycle must behave identically.

use vigil_engine::{
    AssetId, DepositKey, EscrowError, EscrowService, Holder, Identity, LedgerError, ManualClock,
    Seed, Signer, PROOF_FEE_AMOUNT,
};
use vigil_ledger_balance::BalanceLedger;

const T0: i64 = 1_700_000_000;

fn id(seed: u8) -> Identity {
    Identity::new([seed; 32])
}

fn lock_asset() -> AssetId {
    AssetId::new([0xaa; 32])
}

fn fee_asset() -> AssetId {
    AssetId::new([0xfe; 32])
}

fn seed(bytes: &[u8]) -> Seed {
    Seed::new(bytes.to_vec()).unwrap()
}

struct Harness {
    service: EscrowService<BalanceLedger, ManualClock>,
    clock: ManualClock,
    admin: Signer,
    depositor: Signer,
    receiver: Signer,
}

fn setup() -> Harness {
    let clock = ManualClock::new(T0);
    let admin = Signer::authenticated(id(0x90));
    let mut service = EscrowService::new(BalanceLedger::new(), clock.clone(), admin.identity());
    service
        .registry()
        .set_official_fee_asset(&admin, fee_asset())
        .unwrap();

    let depositor = Signer::authenticated(id(1));
    let receiver = Signer::authenticated(id(2));
    let ledger = service.ledger_mut();
    ledger
        .mint(lock_asset(), depositor.identity(), 1_000_000)
        .unwrap();
    ledger
        .mint(fee_asset(), depositor.identity(), 10 * PROOF_FEE_AMOUNT)
        .unwrap();

    Harness {
        service,
        clock,
        admin,
        depositor,
        receiver,
    }
}

fn user_balance(h: &Harness, asset: AssetId, who: &Signer) -> u64 {
    h.service
        .ledger()
        .balance_of(&asset, &Holder::User(who.identity()))
}

#[test]
fn test_full_lifecycle_with_renewal_and_claim() {
    let mut h = setup();
    let s = seed(b"life");
    h.service
        .create(&h.depositor, s.clone(), h.receiver.identity(), lock_asset(), 5_000, 86_400)
        .unwrap();
    let key = DepositKey::new(h.depositor.identity(), s);
    assert_eq!(
        h.service
            .ledger()
            .balance_of(&lock_asset(), &Holder::Custody(key.clone())),
        5_000
    );

    // One renewal pushes expiry out and burns one fee unit.
    h.clock.set(T0 + 80_000);
    h.service.proof_of_life(&h.depositor, &key).unwrap();
    assert_eq!(
        user_balance(&h, fee_asset(), &h.depositor),
        9 * PROOF_FEE_AMOUNT
    );

    // Old expiry has passed, but the renewal reset the baseline.
    h.clock.set(T0 + 90_000);
    let receiver_identity = h.receiver.identity();
    let err = h
        .service
        .claim(&h.receiver, &key, receiver_identity, &receiver_identity)
        .unwrap_err();
    assert!(matches!(err, EscrowError::NotExpired { .. }));

    h.clock.set(T0 + 80_000 + 86_400);
    h.service
        .claim(&h.receiver, &key, receiver_identity, &receiver_identity)
        .unwrap();
    assert_eq!(user_balance(&h, lock_asset(), &h.receiver), 5_000);
    assert_eq!(
        h.service
            .ledger()
            .balance_of(&lock_asset(), &Holder::Custody(key)),
        0
    );
}

#[test]
fn test_withdraw_returns_funds_and_closes() {
    let mut h = setup();
    let s = seed(b"wd");
    h.service
        .create(&h.depositor, s.clone(), h.receiver.identity(), lock_asset(), 700, 3_600)
        .unwrap();
    let key = DepositKey::new(h.depositor.identity(), s);

    let depositor_identity = h.depositor.identity();
    h.service
        .withdraw(&h.depositor, &key, &depositor_identity)
        .unwrap();
    assert_eq!(user_balance(&h, lock_asset(), &h.depositor), 1_000_000);
    assert!(h.service.store().get(&key).unwrap().is_closed);

    let err = h
        .service
        .withdraw(&h.depositor, &key, &depositor_identity)
        .unwrap_err();
    assert_eq!(err, EscrowError::AlreadyClosed);
}

#[test]
fn test_claim_requires_the_named_receiver_signature() {
    let mut h = setup();
    let s = seed(b"auth");
    h.service
        .create(&h.depositor, s.clone(), h.receiver.identity(), lock_asset(), 100, 60)
        .unwrap();
    let key = DepositKey::new(h.depositor.identity(), s);
    h.clock.advance(120);

    // Payout to the receiver's own balance, but signed by someone else.
    let stranger = Signer::authenticated(id(0x66));
    let receiver_identity = h.receiver.identity();
    let err = h
        .service
        .claim(&stranger, &key, receiver_identity, &receiver_identity)
        .unwrap_err();
    assert_eq!(err, EscrowError::UnauthorizedSigner);

    // Naming a party other than the stored receiver fails even when signed.
    let err = h
        .service
        .claim(&stranger, &key, stranger.identity(), &stranger.identity())
        .unwrap_err();
    assert_eq!(err, EscrowError::NotReceiver);
}

#[test]
fn test_renewal_with_unfunded_fee_balance() {
    let mut h = setup();
    let broke = Signer::authenticated(id(7));
    h.service
        .ledger_mut()
        .mint(lock_asset(), broke.identity(), 1_000)
        .unwrap();

    let s = seed(b"broke");
    h.service
        .create(&broke, s.clone(), h.receiver.identity(), lock_asset(), 500, 3_600)
        .unwrap();
    let key = DepositKey::new(broke.identity(), s);

    h.clock.advance(10);
    // No fee balance was ever minted; the map just reads zero.
    let err = h.service.proof_of_life(&broke, &key).unwrap_err();
    assert!(matches!(
        err,
        EscrowError::Ledger(LedgerError::InsufficientBalance { .. })
    ));
    assert_eq!(
        h.service.store().get(&key).unwrap().last_proof_timestamp,
        T0
    );
}

#[test]
fn test_paused_blocks_create_only() {
    let mut h = setup();
    let s = seed(b"pause");
    h.service
        .create(&h.depositor, s.clone(), h.receiver.identity(), lock_asset(), 100, 60)
        .unwrap();
    let key = DepositKey::new(h.depositor.identity(), s);

    h.service.registry().set_paused(&h.admin, true).unwrap();
    assert_eq!(
        h.service
            .create(&h.depositor, seed(b"p2"), h.receiver.identity(), lock_asset(), 100, 60)
            .unwrap_err(),
        EscrowError::SystemPaused
    );

    h.clock.advance(120);
    let receiver_identity = h.receiver.identity();
    h.service
        .claim(&h.receiver, &key, receiver_identity, &receiver_identity)
        .unwrap();
}

#[test]
fn test_reclaim_removes_the_record() {
    let mut h = setup();
    let s = seed(b"gc");
    h.service
        .create(&h.depositor, s.clone(), h.receiver.identity(), lock_asset(), 100, 60)
        .unwrap();
    let key = DepositKey::new(h.depositor.identity(), s);

    let depositor_identity = h.depositor.identity();
    h.service
        .withdraw(&h.depositor, &key, &depositor_identity)
        .unwrap();
    // Either party may reclaim a closed record; here the depositor does.
    h.service.close_for_reclaim(&h.depositor, &key).unwrap();
    assert!(h.service.store().is_empty());
}
