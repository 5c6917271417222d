/// rate table - built-in pricing, a custom table from JSON, and form input
use agri_credit::{Money, PlatformConfig, ProjectType, RateTable, Simulator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let table = RateTable::default();
    let principal = Money::from_major(1_000_000);

    println!("=== built-in rates, {} over 24 months ===", principal.to_kwanza_string());
    let simulator = Simulator::default();
    for project_type in ProjectType::ALL {
        let result = simulator.simulate(principal, 24, project_type)?;
        println!(
            "{:<14} {:>5}%  {:>20}/month",
            project_type.to_string(),
            table.annual_rate_percent(project_type),
            result.monthly_payment.to_kwanza_string()
        );
    }

    // an operator-tuned table: lower base rate, cheaper horticulture
    let config = PlatformConfig::from_json(
        r#"{
            "rate_table": {
                "base_rate_percent": "12",
                "adjustments": {
                    "cattle": "-2",
                    "corn": "-1",
                    "cassava": "0",
                    "horticulture": "-0.5",
                    "poultry": "2",
                    "other": "3"
                }
            },
            "max_term_months": 60
        }"#,
    )?;
    let tuned = Simulator::new(&config);

    println!("\n=== tuned table ===");
    let result = tuned.simulate(principal, 24, ProjectType::Horticulture)?;
    println!("horticulture at {}%: {}", result.interest_rate, result.monthly_payment);

    match tuned.simulate(principal, 120, ProjectType::Cattle) {
        Ok(_) => println!("unexpected: 120 months accepted"),
        Err(e) => println!("120 months refused: {}", e),
    }

    // raw form fields, unknown project types fall back to the base rate
    println!("\n=== raw form input ===");
    let result = tuned.simulate_raw(" 250000 ", "18", Some("aquaculture"))?;
    println!("aquaculture at {}%: {}", result.interest_rate, result.monthly_payment);

    if let Err(e) = tuned.simulate_raw("-5", "12", Some("corn")) {
        println!("negative principal refused: {}", e);
    }

    Ok(())
}
