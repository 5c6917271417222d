/// quick simulation - what the public simulator shows a visitor
use agri_credit::{simulate, Money, ProjectType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 750,000 AOA for a corn project over 12 months
    let result = simulate(Money::from_major(750_000), 12, ProjectType::Corn)?;

    println!("rate:            {}%", result.interest_rate);
    println!("monthly payment: {}", result.monthly_payment.to_kwanza_string());
    println!("total repaid:    {}", result.total_amount.to_kwanza_string());
    println!("total interest:  {}", result.total_interest.to_kwanza_string());
    println!("effective rate:  {}%", result.effective_annual_rate);

    println!("{}", result.to_json_pretty()?);

    Ok(())
}
