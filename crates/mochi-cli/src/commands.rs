//! Command execution

use crate::cli::Command;
use crate::config::ClientConfig;
use crate::render;
use anyhow::{bail, Context};
use mochi_authority::HttpAuthority;
use mochi_model::{CategoryId, EntityRef, Field, ItemId, PlanDraft, PlanId};
use mochi_store::{EntityStore, JsonFilePersistence, Session};
use mochi_sync::{MutationOutcome, MutationTicket, SyncEngine};
use std::sync::Arc;
use tracing::info;

/// Engine over the configured draft file; synced when `remote` is set
///
/// # Errors
/// - The draft file exists but cannot be read or parsed
/// - The HTTP client cannot be built
pub fn open_engine(config: &ClientConfig) -> anyhow::Result<Arc<SyncEngine>> {
    let path = &config.data_path;
    let persistence = Arc::new(JsonFilePersistence::new(path));
    let store = EntityStore::open(persistence)
        .with_context(|| format!("opening draft file {}", path.display()))?;
    let store = Arc::new(store);
    if !config.remote {
        return Ok(SyncEngine::local(store, config.sync.clone()));
    }
    let authority = HttpAuthority::new(&config.authority).context("building authority client")?;
    info!(base_url = %config.authority.base_url, "confirming changes with the authority");
    Ok(SyncEngine::new(store, Arc::new(authority), config.sync.clone()))
}

/// Run one command, returning what to print
///
/// # Errors
/// Unknown ids, validation failures and rejected mutations
pub async fn run(engine: &Arc<SyncEngine>, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Plans => Ok(render::plan_list(&engine.store().plans())),
        Command::Create {
            destination,
            start,
            days,
            departure,
            companions,
            purposes,
        } => {
            let mut draft = PlanDraft::new(destination, start, days).with_purposes(purposes);
            draft.companion_count = companions;
            if let Some(departure) = departure {
                draft = draft.with_departure(departure);
            }
            let id = engine.create_plan(draft)?;
            Ok(format!("created plan {id}\n"))
        }
        Command::Show { plan, json } => {
            let plan = engine.store().plan(&PlanId::new(plan))?;
            if json {
                let mut text = serde_json::to_string_pretty(&plan)?;
                text.push('\n');
                Ok(text)
            } else {
                Ok(render::plan_detail(&plan))
            }
        }
        Command::Toggle { item } => {
            let entity = settle(engine.toggle(&ItemId::new(item))?).await?;
            Ok(format!("toggled {}\n", entity.as_str()))
        }
        Command::Move { dragged, target } => {
            let entity = settle(engine.request_move(&ItemId::new(dragged), &ItemId::new(target))?).await?;
            Ok(format!("moved {}\n", entity.as_str()))
        }
        Command::AddItem {
            category,
            name,
            quantity,
            optional,
        } => {
            let category = CategoryId::new(category);
            let session = session_for(engine, &category)?;
            let ticket = engine.add_item(&session, &category, &name, &quantity, !optional)?;
            let entity = settle(ticket).await?;
            Ok(format!("added {}\n", entity.as_str()))
        }
        Command::AddCategory { plan, title } => {
            let session = session_of(engine, PlanId::new(plan));
            let entity = settle(engine.add_category(&session, &title)?).await?;
            Ok(format!("added {}\n", entity.as_str()))
        }
        Command::SetQty { item, quantity } => {
            let ticket = engine.edit_field(ItemId::new(item), Field::Quantity, &quantity)?;
            let entity = settle(ticket).await?;
            Ok(format!("updated {}\n", entity.as_str()))
        }
        Command::DeleteItem { item } => {
            let entity = settle(engine.delete_item(&ItemId::new(item))?).await?;
            Ok(format!("deleted {}\n", entity.as_str()))
        }
        Command::DeletePlan { plan } => {
            let entity = settle(engine.delete_plan(&PlanId::new(plan))?).await?;
            Ok(format!("deleted {}\n", entity.as_str()))
        }
        Command::Save { plan } => {
            let session = session_of(engine, PlanId::new(plan));
            match finish(engine.save_checklist(&session)?).await? {
                (_, MutationOutcome::Redirected { target }) => Ok(format!("saved, continue at {target}\n")),
                (entity, _) => Ok(format!("saved {} locally\n", entity.as_str())),
            }
        }
        Command::Share { plan } => {
            let session = session_of(engine, PlanId::new(plan));
            match finish(engine.share_plan(&session)?).await? {
                (_, MutationOutcome::Shared { url }) => Ok(format!("{url}\n")),
                (entity, other) => bail!("no share link for {entity}: {other:?}"),
            }
        }
        Command::Publish {
            plan,
            title,
            description,
            visibility,
        } => {
            let session = session_of(engine, PlanId::new(plan));
            let ticket = engine.save_template(&session, &title, &description, visibility)?;
            match finish(ticket).await? {
                (_, MutationOutcome::Redirected { target }) => Ok(format!("published, continue at {target}\n")),
                (entity, _) => Ok(format!("published {}\n", entity.as_str())),
            }
        }
    }
}

/// Session matching the engine: drafts when local, guest for guest plans
fn session_of(engine: &SyncEngine, plan: PlanId) -> Session {
    if engine.is_local() {
        Session::draft(plan)
    } else if plan.is_guest() {
        Session::guest(plan)
    } else {
        Session::authenticated(plan)
    }
}

fn session_for(engine: &SyncEngine, category: &CategoryId) -> anyhow::Result<Session> {
    let plan = engine
        .store()
        .category_plan(category)
        .with_context(|| format!("no category {category}"))?;
    Ok(session_of(engine, plan))
}

/// Wait for the ticket; a rollback becomes an error carrying the notice text
async fn finish(ticket: MutationTicket) -> anyhow::Result<(EntityRef, MutationOutcome)> {
    let entity = ticket.entity().clone();
    match ticket.outcome().await {
        MutationOutcome::RolledBack(error) => {
            info!(%entity, %error, "mutation rolled back");
            bail!(error.user_message())
        }
        outcome => Ok((entity, outcome)),
    }
}

/// Wait for the ticket and name the entity it ended on
async fn settle(ticket: MutationTicket) -> anyhow::Result<EntityRef> {
    let (entity, outcome) = finish(ticket).await?;
    Ok(match outcome {
        MutationOutcome::Committed { entity } => entity,
        _ => entity,
    })
}
