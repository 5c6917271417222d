/// claim race - several institutions claim the same pending application at once
use agri_credit::chrono::{TimeZone, Utc};
use agri_credit::{
    Actor, ApplicationStore, CreditApplication, CreditError, EventStore, InMemoryApplicationStore, Money,
    PlatformConfig, ProjectType, ReviewDesk, SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let start = Utc.with_ymd_and_hms(2024, 6, 10, 14, 0, 0).unwrap();
    let store = InMemoryApplicationStore::new();
    let desk = ReviewDesk::new(&store, PlatformConfig::default());

    let cooperative = Actor::new(Uuid::new_v4(), agri_credit::UserType::Cooperative);
    let app = desk.submit(
        CreditApplication::builder()
            .project_name("Horta Comunitária")
            .project_type(ProjectType::Horticulture)
            .description("Irrigação gota-a-gota para 4 hectares")
            .amount(Money::from_major(1_200_000))
            .term_months(18),
        &cooperative,
        &SafeTimeProvider::new(TimeSource::Test(start)),
        &mut EventStore::new(),
    )?;

    let id = app.id;
    let banks: Vec<Actor> = (0..6).map(|_| Actor::institution(Uuid::new_v4())).collect();

    let outcomes = std::thread::scope(|scope| {
        let handles: Vec<_> = banks
            .iter()
            .map(|bank| {
                let desk = &desk;
                scope.spawn(move || {
                    let time = SafeTimeProvider::new(TimeSource::Test(start));
                    let mut events = EventStore::new();
                    (bank.id, desk.claim(id, bank, &time, &mut events))
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .collect::<Vec<_>>()
    });

    for (bank, outcome) in &outcomes {
        match outcome {
            Ok(_) => println!("{} won the claim", bank),
            Err(CreditError::StaleApplication { found, .. }) => {
                println!("{} lost the race (already {})", bank, found)
            }
            Err(e) => println!("{} refused: {}", bank, e),
        }
    }

    let stored = store.get(id)?;
    println!("\nfinal status {} reviewed by {:?}", stored.status, stored.reviewed_by);

    Ok(())
}
