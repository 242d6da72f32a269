use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use indicatif::{ProgressBar, ProgressStyle};
use persona_api::HttpBackend;
use persona_auth::{AuthContext, TokenStore};
use persona_common::{
    config::ClientConfig,
    error::{PersonaError, Result},
};
use persona_dashboard::{Dashboard, DashboardSettings, FlowState, scan_folder};
use tokio::sync::watch;

/// Classifies every image under `dir` and saves the archive into `out`.
pub async fn run(config: &ClientConfig, dir: &Path, out: &Path) -> Result<PathBuf> {
    let context = AuthContext::from_session(TokenStore::new(&config.token_path).load().await?);
    context.require()?;

    let backend =
        Arc::new(HttpBackend::new(config)?.with_bearer_token(context.bearer_token()));
    let mut dashboard = Dashboard::new(backend, DashboardSettings::from_config(config));

    dashboard.select(scan_folder(dir).await?)?;
    let renderer = tokio::spawn(render(dashboard.subscribe()));

    if let Err(err) = dashboard.submit().await {
        renderer.abort();
        return Err(err);
    }

    let settled = dashboard.wait().await;
    let _ = renderer.await;

    match settled {
        FlowState::Succeeded(_) => {
            let path = dashboard.download(out).await?;
            println!("Saved {}", path.display());
            Ok(path)
        }
        FlowState::Failed(notice) => Err(PersonaError::JobFailed(notice)),
        other => Err(PersonaError::InternalError(format!(
            "submission stopped while {}",
            other.label()
        ))),
    }
}

fn bar(len: u64, template: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(len).with_style(style)
}

async fn render(mut states: watch::Receiver<FlowState>) {
    let upload = bar(100, "Uploading  [{bar:40}] {pos}%");
    let mut processing: Option<ProgressBar> = None;

    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        match state {
            FlowState::Uploading { percent } => upload.set_position(u64::from(percent)),
            FlowState::Processing {
                processed, total, ..
            } => {
                if !upload.is_finished() {
                    upload.set_position(100);
                    upload.finish();
                }
                let current = processing
                    .get_or_insert_with(|| bar(total, "Processing [{bar:40}] {pos}/{len} images"));
                current.set_length(total);
                current.set_position(processed);
            }
            FlowState::Succeeded(_) => {
                if let Some(current) = &processing {
                    current.finish();
                }
                break;
            }
            FlowState::Failed(_) => {
                upload.abandon();
                if let Some(current) = &processing {
                    current.abandon();
                }
                break;
            }
            FlowState::Idle | FlowState::Validating => {}
        }
    }
}
