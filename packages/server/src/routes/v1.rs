use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/users", user_routes())
        .nest("/farmers", farmer_routes())
        .nest("/batches", batch_routes())
        .nest("/packages", package_routes())
        .nest("/scans", scan_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::register))
        .routes(routes!(handlers::user::login))
        .routes(routes!(handlers::user::forgot_password))
        .routes(routes!(handlers::user::reset_password))
        .routes(routes!(
            handlers::user::get_profile,
            handlers::user::update_profile
        ))
        .routes(routes!(handlers::user::list_users))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user,
            handlers::user::delete_user
        ))
        .routes(routes!(handlers::user::restore_user))
}

fn farmer_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::farmer::list_farmers,
            handlers::farmer::register_farmer
        ))
        .routes(routes!(
            handlers::farmer::get_farmer,
            handlers::farmer::update_farmer,
            handlers::farmer::delete_farmer
        ))
}

fn batch_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::batch::list_batches,
            handlers::batch::create_batch
        ))
        .routes(routes!(
            handlers::batch::get_batch,
            handlers::batch::update_batch,
            handlers::batch::delete_batch
        ))
}

fn package_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::package::list_packages,
            handlers::package::create_package
        ))
        .routes(routes!(
            handlers::package::get_package,
            handlers::package::update_package,
            handlers::package::delete_package
        ))
}

fn scan_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::scan::list_scans,
            handlers::scan::create_scan
        ))
        .routes(routes!(
            handlers::scan::get_scan,
            handlers::scan::update_scan,
            handlers::scan::delete_scan
        ))
}
