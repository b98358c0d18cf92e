//! Tests for the loan service: backfill, derivation and status changes.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockLoanRepository;
use crate::domain::{
    ErrorCode, LoanId, Money, PaymentStatus, Role, UserId, Username,
};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[derive(Default)]
struct StubLoanRepository {
    loans: Mutex<Vec<Loan>>,
    payments: Mutex<Vec<Payment>>,
    inserts: AtomicUsize,
    upserts: AtomicUsize,
}

impl StubLoanRepository {
    fn seeded(loan: &Loan, months: impl IntoIterator<Item = u32>) -> Self {
        let months: Vec<u32> = months.into_iter().collect();
        let repo = Self::default();
        repo.loans.lock().expect("loans lock").push(loan.clone());
        *repo.payments.lock().expect("payments lock") = default_payments(loan, &months);
        repo
    }

    fn months(&self) -> Vec<u32> {
        let mut months: Vec<u32> = self
            .payments
            .lock()
            .expect("payments lock")
            .iter()
            .map(|p| p.month)
            .collect();
        months.sort_unstable();
        months
    }

    fn row(&self, month: u32) -> Option<Payment> {
        self.payments
            .lock()
            .expect("payments lock")
            .iter()
            .find(|p| p.month == month)
            .cloned()
    }
}

#[async_trait]
impl LoanRepository for StubLoanRepository {
    async fn find_loan(&self) -> Result<Option<Loan>, LoanPersistenceError> {
        Ok(self.loans.lock().expect("loans lock").first().cloned())
    }

    async fn create_loan(
        &self,
        loan: &Loan,
        payments: &[Payment],
    ) -> Result<(), LoanPersistenceError> {
        self.loans.lock().expect("loans lock").push(loan.clone());
        self.payments
            .lock()
            .expect("payments lock")
            .extend_from_slice(payments);
        Ok(())
    }

    async fn list_payments(&self, loan_id: &LoanId) -> Result<Vec<Payment>, LoanPersistenceError> {
        let mut rows: Vec<Payment> = self
            .payments
            .lock()
            .expect("payments lock")
            .iter()
            .filter(|p| p.loan_id == *loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.month);
        Ok(rows)
    }

    async fn insert_missing_payments(
        &self,
        payments: &[Payment],
    ) -> Result<usize, LoanPersistenceError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.payments.lock().expect("payments lock");
        let mut inserted = 0;
        for payment in payments {
            let exists = rows
                .iter()
                .any(|p| p.loan_id == payment.loan_id && p.month == payment.month);
            if !exists {
                rows.push(payment.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn upsert_payment(&self, payment: &Payment) -> Result<Payment, LoanPersistenceError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.payments.lock().expect("payments lock");
        if let Some(row) = rows
            .iter_mut()
            .find(|p| p.loan_id == payment.loan_id && p.month == payment.month)
        {
            row.status = payment.status;
            row.paid_at = payment.paid_at;
            row.note = payment.note.clone();
            return Ok(row.clone());
        }
        rows.push(payment.clone());
        Ok(payment.clone())
    }
}

#[fixture]
fn terms() -> LoanTerms {
    LoanTerms::try_new(Money::from_units(20_000), Money::from_units(330), 60).expect("valid terms")
}

fn service<R>(repo: Arc<R>, terms: LoanTerms) -> LoanService<R> {
    LoanService::new(repo, terms, Arc::new(FixtureClock(now())))
}

fn user(role: Role) -> AuthenticatedUser {
    let name = match role {
        Role::Editor => "Jasper",
        Role::Viewer => "Gilbert",
    };
    AuthenticatedUser::new(
        UserId::random(),
        Username::new(name).expect("valid username"),
        role,
    )
}

fn mark(month: u32, status: PaymentStatus) -> PaymentUpdate {
    PaymentUpdate {
        month,
        status,
        paid_at: None,
        note: None,
    }
}

#[rstest]
#[tokio::test]
async fn ensure_loan_opens_a_full_schedule_when_empty(terms: LoanTerms) {
    let repo = Arc::new(StubLoanRepository::default());
    let snapshot = service(Arc::clone(&repo), terms)
        .ensure_loan()
        .await
        .expect("ensure loan");

    assert_eq!(snapshot.loan.start_date(), now());
    assert_eq!(snapshot.payments.len(), 60);
    assert!(snapshot.payments.iter().all(|p| !p.is_paid()));
    assert!(
        snapshot
            .payments
            .iter()
            .all(|p| p.amount == Money::from_units(330))
    );
    assert_eq!(repo.months(), (1..=60).collect::<Vec<_>>());
}

#[rstest]
#[tokio::test]
async fn ensure_loan_backfills_only_missing_months(terms: LoanTerms) {
    let loan = Loan::open(terms, now());
    let repo = Arc::new(StubLoanRepository::seeded(&loan, 1..=58));
    let before = repo.row(10).expect("row 10");

    let snapshot = service(Arc::clone(&repo), terms)
        .ensure_loan()
        .await
        .expect("ensure loan");

    assert_eq!(snapshot.payments.len(), 60);
    assert_eq!(repo.months(), (1..=60).collect::<Vec<_>>());
    assert_eq!(repo.row(10), Some(before));
    assert_eq!(repo.row(59).map(|p| p.status), Some(PaymentStatus::Unpaid));
    assert_eq!(repo.inserts.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn ensure_loan_is_idempotent(terms: LoanTerms) {
    let repo = Arc::new(StubLoanRepository::default());
    let svc = service(Arc::clone(&repo), terms);

    let first = svc.ensure_loan().await.expect("first ensure");
    let second = svc.ensure_loan().await.expect("second ensure");

    assert_eq!(first, second);
    assert_eq!(repo.inserts.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn existing_loan_keeps_its_own_terms(terms: LoanTerms) {
    let short = LoanTerms::try_new(Money::from_units(1_000), Money::from_units(100), 10)
        .expect("valid terms");
    let loan = Loan::open(short, now());
    let repo = Arc::new(StubLoanRepository::seeded(&loan, 1..=10));

    let summary = service(repo, terms).summary().await.expect("summary");
    assert_eq!(summary.total_months, 10);
    assert_eq!(summary.principal, Money::from_units(1_000));
}

#[rstest]
#[tokio::test]
async fn marking_month_one_paid_updates_the_summary(terms: LoanTerms) {
    let repo = Arc::new(StubLoanRepository::default());
    let svc = service(Arc::clone(&repo), terms);

    let updated = svc
        .set_status(&user(Role::Editor), mark(1, PaymentStatus::Paid))
        .await
        .expect("mark paid");
    assert_eq!(updated.payment.paid_at, Some(now()));

    let summary = svc.summary().await.expect("summary");
    assert_eq!(summary.total_paid, Money::from_units(330));
    assert_eq!(summary.outstanding, Money::from_units(19_670));
    assert!((summary.percent_paid - 1.65).abs() < 1e-9);
    assert_eq!(summary.paid_months, 1);
    assert_eq!(summary.remaining_months, 59);
}

#[rstest]
#[tokio::test]
async fn repeated_updates_converge(terms: LoanTerms) {
    let repo = Arc::new(StubLoanRepository::default());
    let svc = service(Arc::clone(&repo), terms);
    let update = PaymentUpdate {
        note: Some("transfer".to_owned()),
        ..mark(4, PaymentStatus::Paid)
    };

    let first = svc
        .set_status(&user(Role::Editor), update.clone())
        .await
        .expect("first update");
    let second = svc
        .set_status(&user(Role::Editor), update)
        .await
        .expect("second update");

    assert_eq!(first, second);
    assert_eq!(repo.months().len(), 60);
}

#[rstest]
#[tokio::test]
async fn marking_unpaid_clears_the_paid_date(terms: LoanTerms) {
    let repo = Arc::new(StubLoanRepository::default());
    let svc = service(Arc::clone(&repo), terms);
    svc.set_status(&user(Role::Editor), mark(2, PaymentStatus::Paid))
        .await
        .expect("mark paid");

    let update = PaymentUpdate {
        paid_at: Some(now()),
        ..mark(2, PaymentStatus::Unpaid)
    };
    let updated = svc
        .set_status(&user(Role::Editor), update)
        .await
        .expect("mark unpaid");

    assert_eq!(updated.payment.status, PaymentStatus::Unpaid);
    assert_eq!(updated.payment.paid_at, None);
}

#[rstest]
#[tokio::test]
async fn viewers_are_rejected_without_touching_rows(terms: LoanTerms) {
    let loan = Loan::open(terms, now());
    let repo = Arc::new(StubLoanRepository::seeded(&loan, 1..=60));
    let before = repo.row(1);

    let err = service(Arc::clone(&repo), terms)
        .set_status(&user(Role::Viewer), mark(1, PaymentStatus::Paid))
        .await
        .expect_err("viewer rejected");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.message(), READ_ONLY_MESSAGE);
    assert_eq!(repo.row(1), before);
    assert_eq!(repo.upserts.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case(0)]
#[case(61)]
#[tokio::test]
async fn months_outside_the_term_are_invalid(terms: LoanTerms, #[case] month: u32) {
    let repo = Arc::new(StubLoanRepository::default());
    let err = service(Arc::clone(&repo), terms)
        .set_status(&user(Role::Editor), mark(month, PaymentStatus::Paid))
        .await
        .expect_err("out of range");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), MONTH_OUT_OF_RANGE_MESSAGE);
    assert_eq!(repo.upserts.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn payments_carry_due_months_in_order(terms: LoanTerms) {
    let repo = Arc::new(StubLoanRepository::default());
    let payments = service(repo, terms).payments().await.expect("payments");

    assert_eq!(payments.len(), 60);
    assert_eq!(payments[0].payment.month, 1);
    assert_eq!(payments[0].due_month.to_string(), "2025-04");
    assert_eq!(payments[59].due_month.to_string(), "2030-03");
}

#[rstest]
#[case(LoanPersistenceError::connection("refused"), ErrorCode::InternalError)]
#[case(LoanPersistenceError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn repository_failures_map_to_domain_errors(
    terms: LoanTerms,
    #[case] failure: LoanPersistenceError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockLoanRepository::new();
    repo.expect_find_loan()
        .times(1)
        .return_once(move || Err(failure));

    let err = service(Arc::new(repo), terms)
        .summary()
        .await
        .expect_err("repository failure");
    assert_eq!(err.code(), expected);
}
