use crate::{
    app::App,
    cli::actions::{
        access::require_session,
        output::{print_field, print_json},
    },
    features::{
        videos::{
            client::{fetch_catalog, fetch_status, record_view},
            types::ViewRequest,
        },
        vip::types::PlanId,
    },
    shared::errors::AppError,
};
use anyhow::Result;

#[derive(Debug)]
pub enum Command {
    Status,
    Catalog { page: u32, per_page: u32 },
    Watch { video_id: String, plan_id: Option<PlanId> },
    Rate { video_id: String, rating: u8 },
}

/// # Errors
/// Returns an error without a session or when the business API fails.
pub async fn execute(app: &App, command: Command) -> Result<()> {
    let api = app.api();
    match command {
        Command::Status => {
            require_session(app)?;
            let status = fetch_status(api).await?;
            print_field("daily limit", status.has_daily_limit());
            for plan in &status.planes {
                let label = plan
                    .plan_id
                    .map_or_else(|| "plan".to_string(), |id| format!("plan {id}"));
                let state = match plan.puede_ver {
                    Some(false) => "done for today",
                    _ => "can watch",
                };
                print_field(&label, state);
            }
            Ok(())
        }
        Command::Catalog { page, per_page } => {
            let catalog = fetch_catalog(api, page, per_page).await?;
            for trailer in &catalog.items {
                println!("{:<12} {}", trailer.id, trailer.url);
            }
            if catalog.has_next_page {
                println!("More with --page {}", page.saturating_add(1));
            }
            Ok(())
        }
        Command::Watch { video_id, plan_id } => {
            let user = require_session(app)?;
            let status = fetch_status(api).await?;
            if !status.can_watch(plan_id) {
                return Err(AppError::validation("Daily video limit reached").into());
            }
            let calificacion = app.prefs().rating(Some(user.id.as_str()), &video_id);
            let request = ViewRequest {
                video_id,
                calificacion,
                plan_id,
            };
            let response = record_view(api, &request).await?;
            app.notices().success("View recorded");
            print_json(&response)
        }
        Command::Rate { video_id, rating } => {
            let user = require_session(app)?;
            app.prefs().set_rating(Some(user.id.as_str()), &video_id, rating)?;
            println!("Rated {video_id} with {rating} stars");
            Ok(())
        }
    }
}
