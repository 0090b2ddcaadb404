use super::handlers::{achievements, action_log, auth, games, health, me};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::signup::signup))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::logout::logout))
        .routes(routes!(auth::session::session))
        .routes(routes!(games::list_games, games::create_game))
        .routes(routes!(games::delete_game))
        .routes(routes!(achievements::create_achievement))
        .routes(routes!(achievements::toggle_achievement))
        .routes(routes!(achievements::delete_achievement))
        .routes(routes!(action_log::list_action_log))
        .routes(routes!(me::get_me))
        .routes(routes!(me::update_email))
        .routes(routes!(me::update_password))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Signup, login, and session endpoints".to_string());

    let mut games_tag = Tag::new("games");
    games_tag.description = Some("Games and achievements".to_string());

    let mut log_tag = Tag::new("log");
    log_tag.description = Some("Per-user action log".to_string());

    let mut me_tag = Tag::new("me");
    me_tag.description = Some("Profile settings".to_string());

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(vec![auth_tag, games_tag, log_tag, me_tag]))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "games"));

        assert!(spec.paths.paths.contains_key("/v1/auth/signup"));
        assert!(spec.paths.paths.contains_key("/v1/auth/login"));
        assert!(spec.paths.paths.contains_key("/v1/games"));
        assert!(spec.paths.paths.contains_key("/v1/games/{id}"));
        assert!(spec.paths.paths.contains_key("/v1/achievements/{id}/toggle"));
        assert!(spec.paths.paths.contains_key("/v1/action-log"));
        assert!(spec.paths.paths.contains_key("/v1/me"));
    }
}
