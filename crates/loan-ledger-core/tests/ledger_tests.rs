use loan_ledger_core::ledger::{
    ItemCreate, ItemKind, Ledger, LedgerConfig, LoanCreate, Page, UserCreate,
};
use loan_ledger_core::LoanLedgerError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn register(ledger: &mut Ledger, email: &str) -> String {
    ledger
        .register_user(&UserCreate {
            email: email.into(),
            password: "correct horse".into(),
        })
        .unwrap();
    ledger.login(email, "correct horse").unwrap().token
}

fn mortgage() -> LoanCreate {
    LoanCreate {
        title: "Mortgage".into(),
        description: Some("30y fixed".into()),
        amount: dec!(250000),
        annual_interest_rate: dec!(5),
        loan_term_in_months: dec!(360),
    }
}

// ===========================================================================
// Users
// ===========================================================================

#[test]
fn test_duplicate_registration_rejected() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    register(&mut ledger, "owner@example.com");
    let err = ledger
        .register_user(&UserCreate {
            email: "Owner@Example.com".into(),
            password: "x".into(),
        })
        .unwrap_err();
    assert!(matches!(err, LoanLedgerError::EmailAlreadyRegistered(_)));
}

#[test]
fn test_list_users_is_clamped() {
    let mut ledger = Ledger::in_memory(LedgerConfig {
        max_page_size: 2,
        ..LedgerConfig::default()
    })
    .unwrap();
    for i in 0..4 {
        register(&mut ledger, &format!("user{i}@example.com"));
    }
    assert_eq!(ledger.list_users(Page::new(0, 50)).unwrap().len(), 2);
    assert_eq!(ledger.get_user(3).unwrap().email, "user2@example.com");
}

#[test]
fn test_unbounded_token_ttl_rejected_at_open() {
    let config = LedgerConfig {
        token_ttl_hours: 10_000_000_000_000,
        ..LedgerConfig::default()
    };
    assert!(matches!(
        Ledger::in_memory(config),
        Err(LoanLedgerError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Loans, schedules and summaries
// ===========================================================================

#[test]
fn test_loan_lifecycle() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    let token = register(&mut ledger, "owner@example.com");

    let loan = ledger.create_loan(&token, &mortgage()).unwrap();
    assert_eq!(loan.details.loan_term_in_months, 360);
    assert_eq!(ledger.get_loan(&token, loan.id).unwrap(), loan);

    let schedule = ledger.loan_schedule(&token, loan.id).unwrap();
    assert_eq!(schedule.len(), 360);
    assert_eq!(schedule[0].remaining_balance, dec!(250000));

    let summary = ledger.loan_summary(&token, loan.id, 12).unwrap();
    assert_eq!(summary.current_principal_balance, schedule[12].remaining_balance);
    assert_eq!(
        summary.aggregate_principal + summary.current_principal_balance,
        dec!(250000)
    );
    assert!(summary.aggregate_interest > dec!(12000));
}

#[test]
fn test_zero_rate_loan() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    let token = register(&mut ledger, "owner@example.com");
    let loan = ledger
        .create_loan(
            &token,
            &LoanCreate {
                title: "Family loan".into(),
                description: None,
                amount: dec!(1200),
                annual_interest_rate: Decimal::ZERO,
                loan_term_in_months: dec!(12),
            },
        )
        .unwrap();
    let summary = ledger.loan_summary(&token, loan.id, 6).unwrap();
    assert_eq!(summary.current_principal_balance, dec!(600));
    assert_eq!(summary.aggregate_principal, dec!(600));
    assert_eq!(summary.aggregate_interest, Decimal::ZERO);
}

#[test]
fn test_items_and_loans_share_item_listing() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    let token = register(&mut ledger, "owner@example.com");
    ledger
        .create_item(
            &token,
            &ItemCreate {
                title: "Bike".into(),
                description: None,
            },
        )
        .unwrap();
    ledger.create_loan(&token, &mortgage()).unwrap();

    let kinds: Vec<bool> = ledger
        .list_items(&token, Page::default())
        .unwrap()
        .iter()
        .map(|item| matches!(item.kind, ItemKind::Loan(_)))
        .collect();
    assert_eq!(kinds, vec![false, true]);
    assert_eq!(ledger.list_loans(&token, Page::default()).unwrap().len(), 1);
}

#[test]
fn test_negative_principal_rejected() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    let token = register(&mut ledger, "owner@example.com");
    let mut req = mortgage();
    req.amount = dec!(-1);
    assert!(matches!(
        ledger.create_loan(&token, &req),
        Err(LoanLedgerError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Sharing
// ===========================================================================

#[test]
fn test_sharing_gates_visibility() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    let owner = register(&mut ledger, "owner@example.com");
    let friend = register(&mut ledger, "friend@example.com");
    let stranger = register(&mut ledger, "stranger@example.com");

    let loan = ledger.create_loan(&owner, &mortgage()).unwrap();

    assert!(matches!(
        ledger.loan_schedule(&friend, loan.id),
        Err(LoanLedgerError::AccessDenied { .. })
    ));

    let member = ledger.share_loan(&owner, loan.id, "friend@example.com").unwrap();
    assert_eq!(member.email, "friend@example.com");

    assert_eq!(ledger.loan_schedule(&friend, loan.id).unwrap().len(), 360);
    assert_eq!(ledger.list_loans(&friend, Page::default()).unwrap(), vec![loan.clone()]);

    // members may view but not re-share
    assert!(matches!(
        ledger.share_loan(&friend, loan.id, "stranger@example.com"),
        Err(LoanLedgerError::AccessDenied { .. })
    ));
    assert!(matches!(
        ledger.loan_summary(&stranger, loan.id, 0),
        Err(LoanLedgerError::AccessDenied { .. })
    ));
}

#[test]
fn test_share_with_unknown_user() {
    let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
    let owner = register(&mut ledger, "owner@example.com");
    let loan = ledger.create_loan(&owner, &mortgage()).unwrap();
    assert!(matches!(
        ledger.share_loan(&owner, loan.id, "ghost@example.com"),
        Err(LoanLedgerError::InvalidInput { .. })
    ));
}

// ===========================================================================
// File-backed store
// ===========================================================================

#[test]
fn test_loans_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let (token, loan_id) = {
        let mut ledger = Ledger::open(&path, LedgerConfig::default()).unwrap();
        let token = register(&mut ledger, "owner@example.com");
        let loan = ledger.create_loan(&token, &mortgage()).unwrap();
        (token, loan.id)
    };

    let ledger = Ledger::open(&path, LedgerConfig::default()).unwrap();
    let schedule = ledger.loan_schedule(&token, loan_id).unwrap();
    assert_eq!(schedule.len(), 360);
    let months: Vec<u32> = schedule.iter().map(|r| r.month).collect();
    assert_eq!(months, (0..360).collect::<Vec<_>>());
}
