use anyhow::Context;
use studio_client::messages::{GenerateRequest, GenerateVariationsRequest, RenderFromBeatsRequest};
use studio_client::StudioApi;
use studio_console::{ConsoleConfig, ConsoleSession};
use studio_core::assets::parse_tag_input;
use studio_core::gallery::is_explicit_group;
use studio_core::operation::OperationKind;
use studio_tracker::TrackerEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: studio-console <generate <prompt>... | variations <prompt>... \
                     | download <kind> <url>... | render <project_id> | gallery \
                     | asset <type> <path> [tag,tag...]>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ConsoleConfig::from_env()?;
    init_tracing(config.log_json);

    let api = StudioApi::new(config.api_url.clone());
    let mut session = ConsoleSession::from_api(api, &config);
    let mut events = session.subscribe();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.split_first() {
        Some((command, rest)) if command == "generate" => {
            let prompt = rest.join(" ");
            match session.generate(GenerateRequest::new(prompt)).await {
                Ok(_) => follow(&mut session, &mut events, OperationKind::GenerationJob).await,
                Err(e) => Err(e.into()),
            }
        }
        Some((command, rest)) if command == "download" => {
            let (kind, urls) = rest.split_first().context(USAGE)?;
            match session.start_download(None, kind, &urls.join("\n"), false).await {
                Ok(_) => follow(&mut session, &mut events, OperationKind::ModelDownload).await,
                Err(e) => Err(e.into()),
            }
        }
        Some((command, [project_id])) if command == "render" => {
            render(&mut session, &mut events, project_id).await
        }
        Some((command, rest)) if command == "variations" => {
            let request = GenerateVariationsRequest::new(rest.join(" "));
            match session.generate_variations(request).await {
                Ok(job_ids) => {
                    tracing::info!(jobs = ?job_ids, "Variations queued");
                    print_groups(&session);
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Some((command, [])) if command == "gallery" => print_gallery(&mut session).await,
        Some((command, [asset_type, path, tags @ ..])) if command == "asset" => {
            edit_asset(&mut session, asset_type, path, tags).await
        }
        _ => Err(anyhow::anyhow!(USAGE)),
    };

    session.shutdown().await;
    result
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studio_console=info,studio_tracker=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn render(
    session: &mut ConsoleSession,
    events: &mut broadcast::Receiver<TrackerEvent>,
    project_id: &str,
) -> anyhow::Result<()> {
    session
        .open_project(project_id)
        .await
        .with_context(|| format!("Failed to open project {project_id}"))?;
    session.render_from_beats(RenderFromBeatsRequest::default()).await?;
    follow(session, events, OperationKind::GenerationJob).await
}

/// Log progress of the tracked operation of `kind` until its loop stops
/// or Ctrl-C is pressed.
async fn follow(
    session: &mut ConsoleSession,
    events: &mut broadcast::Receiver<TrackerEvent>,
    kind: OperationKind,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
            event = events.recv() => event,
        };

        let event = match event {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event receiver lagged");
                continue;
            }
            Err(RecvError::Closed) => return Ok(()),
        };
        if event.kind() != kind {
            continue;
        }

        if let Some(record) = session.record(kind) {
            tracing::info!(operation_id = %record.id(), "{}", record.status_line());
        }
        if session.handle_event(&event).await? {
            tracing::info!(projects = session.gallery().len(), "Gallery refreshed");
        }
        if matches!(event, TrackerEvent::Stopped { .. }) {
            return Ok(());
        }
    }
}

async fn print_gallery(session: &mut ConsoleSession) -> anyhow::Result<()> {
    session.load_gallery().await?;
    print_groups(session);
    Ok(())
}

fn print_groups(session: &ConsoleSession) {
    for (key, members) in &session.gallery_groups() {
        if is_explicit_group(members) {
            println!("[{key}]");
        }
        for project in members {
            let path = project.final_path.as_deref().unwrap_or("-");
            println!(
                "  {}  {}  {}  {}",
                project.job_id,
                project.status,
                project.display_title(),
                path
            );
        }
    }
}

/// Show an asset's tags and hotspots, replacing the tags first when a
/// comma-separated list is given.
async fn edit_asset(
    session: &mut ConsoleSession,
    asset_type: &str,
    path: &str,
    tags: &[String],
) -> anyhow::Result<()> {
    let editor = session.asset_editor_mut();
    editor.open(path, asset_type).await?;
    if !tags.is_empty() {
        editor.set_tags(path, &parse_tag_input(&tags.join(" "))).await?;
    }

    let editor = session.asset_editor();
    println!("tags: {}", editor.tags(path).unwrap_or_default().join(", "));
    for hotspot in editor.hotspots(path).unwrap_or_default() {
        println!("  {:>7.2}-{:<7.2} {}", hotspot.start, hotspot.end, hotspot.display_label());
    }
    Ok(())
}
