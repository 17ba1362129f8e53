use crate::{
    app::App,
    cli::actions::{
        access::require_session,
        output::{print_field, print_json},
    },
    features::vip::{
        client::{activate, buy, create_intent, fetch_my_plans, fetch_plans, load_vip_state},
        types::{PlanId, VipState},
    },
    shared::errors::AppError,
};
use anyhow::Result;

#[derive(Debug)]
pub enum Command {
    Status,
    Plans,
    MyPlans,
    Intent(PlanId),
    Buy(PlanId),
    Activate(PlanId),
}

/// # Errors
/// Returns an error without a session or when the business API fails.
pub async fn execute(app: &App, command: Command) -> Result<()> {
    let api = app.api();
    match command {
        Command::Status => {
            require_session(app)?;
            match load_vip_state(api).await {
                VipState::Active(current) => {
                    print_field("vip", "active");
                    if let Some(expires_at) = &current.expires_at {
                        print_field("expires", expires_at);
                    }
                    if let Some(plan) = &current.plan {
                        print_json(plan)?;
                    }
                }
                VipState::NoActivePlan => print_field("vip", "no active plan"),
                VipState::Failed(message) => return Err(AppError::transport(message).into()),
            }
            Ok(())
        }
        Command::Plans => {
            for plan in fetch_plans(api).await? {
                println!(
                    "{:>4}  {:<20} {:>10}",
                    plan.id,
                    plan.nombre.as_deref().unwrap_or("-"),
                    plan.precio.map_or_else(|| "-".to_string(), |price| format!("{price:.2}"))
                );
            }
            Ok(())
        }
        Command::MyPlans => {
            require_session(app)?;
            let plans = fetch_my_plans(api).await?;
            if plans.planes.is_empty() {
                println!("No plans yet");
            }
            for plan in &plans.planes {
                println!(
                    "{:>4}  {:<20} expires {}",
                    plan.plan_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    plan.nombre.as_deref().unwrap_or("-"),
                    plan.expira_en.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Command::Intent(plan_id) => print_json(&create_intent(api, plan_id).await?),
        Command::Buy(plan_id) => {
            let response = buy(api, plan_id).await?;
            app.notices().success("Plan purchased");
            print_json(&response)
        }
        Command::Activate(plan_id) => {
            let response = activate(api, plan_id).await?;
            app.notices().success("Plan activated");
            print_json(&response)
        }
    }
}
