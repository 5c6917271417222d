/// review lifecycle - submit, claim, approve, open the account and repay
use agri_credit::chrono::{Duration, TimeZone, Utc};
use agri_credit::{
    Actor, CreditApplication, EventStore, InMemoryApplicationStore, Money, PlatformConfig,
    ProjectType, ReviewDesk, SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();

    let store = InMemoryApplicationStore::new();
    let desk = ReviewDesk::new(&store, PlatformConfig::default());
    let mut events = EventStore::new();

    let farmer = Actor::farmer(Uuid::new_v4());
    let bank = Actor::institution(Uuid::new_v4());

    let app = desk.submit(
        CreditApplication::builder()
            .project_name("Criação de Gado Bovino")
            .project_type(ProjectType::Cattle)
            .description("Compra de 20 novilhas e vedação de pasto")
            .amount(Money::from_major(2_500_000))
            .term_months(24),
        &farmer,
        &time,
        &mut events,
    )?;
    println!("submitted {} at {}", app.id, app.interest_rate);

    control.advance(Duration::days(2));
    desk.claim(app.id, &bank, &time, &mut events)?;

    let dashboard = desk.dashboard(bank.id);
    println!("dashboard: {:?}", dashboard.counts());

    control.advance(Duration::days(3));
    let (approved, mut account) = desk.approve(app.id, &bank, &time, &mut events)?;
    println!("approved by {:?}", approved.approved_by);
    println!(
        "account opened: {} owed, {} per month, first due {:?}",
        account.total_amount, account.monthly_payment, account.next_payment_date
    );

    let schedule = account.schedule(&approved)?;
    for row in schedule.payments.iter().take(3) {
        println!(
            "  #{:<2} {}  interest {:>10}  principal {:>10}  balance {:>12}",
            row.payment_number,
            row.due_date.format("%Y-%m-%d"),
            row.interest_portion,
            row.principal_portion,
            row.ending_balance
        );
    }

    for _ in 0..3 {
        control.advance(Duration::days(30));
        let remaining = account.record_payment(account.monthly_payment, &time, &mut events)?;
        println!("paid {}, {} remaining", account.monthly_payment, remaining);
    }

    println!("\n{} events recorded", events.len());
    println!("{}", desk.dashboard(bank.id).to_json_pretty()?);

    Ok(())
}
