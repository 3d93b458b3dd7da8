use serde_json::json;

use crate::billing::PLANS;
use crate::cli::{utils, OutputFormat};
use crate::config;

fn limit(value: Option<i64>) -> String {
    value.map_or_else(|| "unlimited".to_string(), |v| v.to_string())
}

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let billing = &config::config().billing;

    match output_format {
        OutputFormat::Json => {
            let plans: Vec<_> = PLANS
                .iter()
                .map(|p| {
                    json!({
                        "plan": p,
                        "price_id": billing.price_for(p.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "plans": plans }))?);
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = PLANS
                .iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        format!("${}/mo", p.monthly_price),
                        limit(p.max_campaigns),
                        limit(p.max_ad_accounts),
                        billing.price_for(p.id).unwrap_or("-").to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                utils::format_table(&["plan", "price", "campaigns", "accounts", "price id"], &rows)
            );
            if billing.secret_key.is_none() {
                println!("\nSTRIPE_SECRET_KEY is not set; subscriptions are disabled");
            }
        }
    }
    Ok(())
}
