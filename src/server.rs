// Copyright 2024 SAP SE
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::bail;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Instrument};

use crate::executor::{self, Runner};
use crate::images::{ImageConfig, Images};
use crate::push_event::PushEvent;

/// Shared by all request handlers, read-only once the server is up.
pub struct AppState<R> {
    pub images: Images,
    pub runner: R,
}

/// Registers `/<hook>` for every configured image, all served by the same
/// handler. The root route and every unknown path answer "ok".
pub fn router<R>(state: Arc<AppState<R>>) -> Result<Router, anyhow::Error>
where
    R: Runner + Send + Sync + 'static,
{
    let mut router = Router::new().route("/", any(ok)).fallback(ok);

    let mut registered = HashSet::new();
    for image in state.images.iter() {
        let path = hook_path(image)?;
        if registered.insert(path.clone()) {
            info!("Registering {path} for {}", image.image);
            router = router.route(&path, any(hook_handler::<R>));
        } else {
            warn!("Registering {path} for {}, which was already registered by an earlier image", image.image);
        }
    }

    Ok(router
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http()))
}

fn hook_path(image: &ImageConfig) -> Result<String, anyhow::Error> {
    if image.hook.is_empty() {
        bail!("No hook path mentioned for image {}", image.image);
    }
    // the router would read these as captures or wildcards
    if image.hook.contains(|c| matches!(c, '{' | '}' | '*' | ':')) {
        bail!(
            "hook path {:?} for image {} must not contain any of '{{', '}}', '*' or ':'",
            image.hook,
            image.image
        );
    }

    Ok(format!("/{}", image.hook))
}

async fn ok() -> &'static str {
    "ok"
}

async fn hook_handler<R>(State(state): State<Arc<AppState<R>>>, method: Method, body: Bytes) -> Response
where
    R: Runner + Send + Sync + 'static,
{
    if method != Method::POST {
        return StatusCode::OK.into_response();
    }

    let event = match PushEvent::parse(&body) {
        Ok(event) => event,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let Some(image) = event.image() else {
        return (StatusCode::BAD_REQUEST, "missing details").into_response();
    };
    let tag = event.tag().to_string();

    let Some(commands) = state.images.commands(&image, &tag).filter(|commands| !commands.is_empty()) else {
        info!("Couldn't find commands for {image}:{tag}");
        return StatusCode::OK.into_response();
    };
    let commands = commands.to_vec();

    // a separate task keeps the commands running if the client goes away
    let task_state = Arc::clone(&state);
    let task = tokio::spawn(
        async move {
            executor::exec_hook(&task_state.runner, &image, &tag, &commands).await;
        }
        .in_current_span(),
    );
    if let Err(err) = task.await {
        error!("hook task failed: {err}");
    }

    StatusCode::OK.into_response()
}
