use crate::error::AppError;
use crate::infra::{build_service, seed_fixtures, ApiDecisionService};
use chrono::{Local, NaiveDate};
use clap::Args;
use croppulse::config::EngineConfig;
use croppulse::engines::claims::{ClaimRequest, ClaimType, ClaimVerdict};
use croppulse::engines::credit::CompositeScore;
use croppulse::engines::logistics::HarvestAssessment;
use croppulse::evidence::memory::InMemoryEvidenceStore;
use croppulse::evidence::{FarmId, FarmerId};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the demo dataset (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct HarvestAssessArgs {
    /// Farm to assess (defaults to the seeded demo farm)
    #[arg(long, default_value = "farm-0001")]
    pub(crate) farm_id: String,
    /// Reference date for the forecast (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// One forecast day as "rain_mm,temp_c,humidity_pct"; repeat per day.
    /// When omitted the seeded demo forecast is used.
    #[arg(long = "day", value_parser = parse_forecast_day)]
    pub(crate) days: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ForecastDay {
    rainfall_mm: f64,
    temperature_c: f64,
    humidity_pct: f64,
}

fn parse_forecast_day(raw: &str) -> Result<ForecastDay, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let &[rain, temp, humidity] = parts.as_slice() else {
        return Err(format!(
            "expected \"rain_mm,temp_c,humidity_pct\", got '{raw}'"
        ));
    };
    let parse = |label: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|err| format!("invalid {label} '{value}' ({err})"))
    };
    Ok(ForecastDay {
        rainfall_mm: parse("rainfall", rain)?,
        temperature_c: parse("temperature", temp)?,
        humidity_pct: parse("humidity", humidity)?,
    })
}

fn demo_service(as_of: NaiveDate) -> Result<(Arc<ApiDecisionService>, Arc<InMemoryEvidenceStore>), AppError> {
    let store = Arc::new(InMemoryEvidenceStore::new());
    seed_fixtures(&store, as_of);
    let service = build_service(EngineConfig::default(), store.clone())?;
    Ok((service, store))
}

pub(crate) async fn run_harvest_assessment(args: HarvestAssessArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let (service, store) = demo_service(as_of)?;
    let farm = FarmId(args.farm_id);

    if !args.days.is_empty() {
        store.insert_forecast(
            farm.clone(),
            args.days
                .iter()
                .enumerate()
                .map(|(offset, day)| croppulse::evidence::DailyForecast {
                    date: as_of + chrono::Duration::days(offset as i64),
                    rainfall_mm: day.rainfall_mm,
                    temperature_c: day.temperature_c,
                    humidity_pct: day.humidity_pct,
                })
                .collect(),
        );
    }

    let assessment = service.assess_harvest(&farm).await?;
    render_harvest_assessment(&assessment);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let (service, _store) = demo_service(as_of)?;

    println!("CropPulse decision demo (reference date {as_of})");

    let farmer = FarmerId("amara-okello".to_string());
    let farm = FarmId("farm-0001".to_string());

    println!("\nCredit scoring");
    let record = service.compute_credit_score(&farmer, as_of).await?;
    render_credit_score(&record);

    println!("\nClaim verification");
    let request = ClaimRequest {
        farmer_id: farmer,
        farm_id: farm.clone(),
        claim_type: ClaimType::Drought,
        claim_date: as_of - chrono::Duration::days(3),
    };
    let verdict = service.verify_claim(&request, as_of).await?;
    render_claim_verdict(&verdict);

    println!("\nHarvest logistics");
    let assessment = service.assess_harvest(&farm).await?;
    render_harvest_assessment(&assessment);

    Ok(())
}

fn render_credit_score(record: &CompositeScore) {
    println!(
        "- Farmer {}: score {} (grade {}, confidence {:.2})",
        record.farmer_id,
        record.value,
        record.grade.label(),
        record.confidence
    );
    for sub in &record.sub_scores {
        println!(
            "  - pillar {}: {:.1} ({} evidence item(s))",
            sub.pillar.label(),
            sub.value,
            sub.evidence.len()
        );
        for contribution in &sub.contributions {
            match contribution.value {
                Some(value) => println!(
                    "      {} = {:.1} (weight {:.2} -> {:.2})",
                    contribution.name,
                    value,
                    contribution.configured_weight,
                    contribution.effective_weight
                ),
                None => println!("      {} unavailable", contribution.name),
            }
        }
    }
    match &record.terms {
        Some(terms) => println!(
            "  Terms: up to {:.0} at {:.0}-{:.0}% ({:.0}% modeled default risk)",
            terms.max_loan_amount,
            terms.interest_rate_min_pct,
            terms.interest_rate_max_pct,
            terms.default_probability_pct
        ),
        None => println!("  Terms: not eligible for lending at this score"),
    }
}

fn render_claim_verdict(verdict: &ClaimVerdict) {
    println!(
        "- {} claim on {}: confidence {:.1} -> {:?}",
        verdict.claim_type.label(),
        verdict.claim_date,
        verdict.confidence,
        verdict.recommendation
    );
    for item in &verdict.evidence {
        let reading = match item.supports_claim {
            Some(true) => "supports",
            Some(false) => "contradicts",
            None => "neutral",
        };
        println!("  - {}: {}", item.source.label(), reading);
    }
}

fn render_harvest_assessment(assessment: &HarvestAssessment) {
    println!(
        "- Farm {}: urgency {}, road risk {} ({:.0} mm forecast)",
        assessment.farm_id,
        assessment.urgency.label(),
        assessment.road_risk.level.label(),
        assessment.road_risk.cumulative_rainfall_mm
    );
    match assessment.optimal_date {
        Some(date) => println!("  Optimal harvest day: {date}"),
        None => println!("  No suitable harvest day in the forecast window"),
    }
    if let Some(days) = assessment.road_risk.days_until_closure {
        println!("  Road closure expected in ~{days} day(s)");
    }
    println!(
        "  Projected post-harvest loss: {:.1}%",
        assessment.projected_loss_pct
    );
    for line in &assessment.recommendations {
        println!("  - {line}");
    }
}
