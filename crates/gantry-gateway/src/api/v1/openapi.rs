//! OpenAPI documentation for the annotated part of the API surface.

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::v1::auth::{Credentials, TokenResponse};
use crate::api::v1::{auth, builds, roles};
use crate::api::AppState;
use gantry_models::models::roles::Role;
use gantry_models::models::users::User;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::session,
        roles::list_roles,
        roles::get_role,
        roles::create_role,
        builds::get_build,
    ),
    components(schemas(Role, User, Credentials, TokenResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "roles", description = "Role grant endpoints"),
        (name = "builds", description = "Build endpoints"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serves the OpenAPI document and the Swagger UI under `/api-docs`.
pub fn router() -> Router<AppState> {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
