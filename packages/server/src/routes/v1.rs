use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/colleges", college_routes())
        .nest("/programs", program_routes())
        .nest("/students", student_routes(config))
        .nest("/logs", logs_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(handlers::auth::logout))
}

fn college_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::college::create_college,
            handlers::college::list_colleges
        ))
        .routes(routes!(
            handlers::college::get_college,
            handlers::college::update_college,
            handlers::college::delete_college
        ))
}

fn program_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::program::create_program,
            handlers::program::list_programs
        ))
        .routes(routes!(
            handlers::program::get_program,
            handlers::program::update_program,
            handlers::program::delete_program
        ))
}

fn student_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::student::create_student,
            handlers::student::list_students
        ))
        .routes(routes!(
            handlers::student::get_student,
            handlers::student::update_student,
            handlers::student::delete_student
        ));

    let photo = OpenApiRouter::new()
        .routes(routes!(
            handlers::student::upload_student_photo,
            handlers::student::delete_student_photo
        ))
        .layer(handlers::student::upload_body_limit(config));

    crud.merge(photo)
}

fn logs_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::logs::list_entries))
        .routes(routes!(handlers::logs::download))
        .routes(routes!(handlers::logs::clear))
}
