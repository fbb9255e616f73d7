use axum::{extract::State, response::Html, routing::get, Router};

use crate::newsletter::templates::escape_html;
use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("../static/index.html");

/// Client id used when none is configured; the ad script then renders nothing.
const ADSENSE_PLACEHOLDER: &str = "ca-pub-XXXXXXXXXX";

pub fn render_index(app_name: &str, adsense_client_id: Option<&str>) -> String {
    INDEX_TEMPLATE
        .replace("{{APP_NAME}}", &escape_html(app_name))
        .replace(
            "{{ADSENSE_CLIENT_ID}}",
            &escape_html(adsense_client_id.unwrap_or(ADSENSE_PLACEHOLDER)),
        )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(
        &state.config.app_name,
        state.config.adsense_client_id.as_deref(),
    ))
}
