pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::admin::handlers as admin_handlers;
use crate::counseling::handlers as counseling_handlers;
use crate::programs::handlers as program_handlers;
use crate::state::AppState;
use crate::students::handlers as student_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Student API
        .route("/api/students", post(student_handlers::handle_create_student))
        .route(
            "/api/students/:id",
            get(student_handlers::handle_get_student).put(student_handlers::handle_update_student),
        )
        .route(
            "/api/students/:id/conversation",
            post(counseling_handlers::handle_conversation),
        )
        .route(
            "/api/students/:id/analyze",
            post(counseling_handlers::handle_analyze),
        )
        // Program API (admin)
        .route(
            "/api/programs",
            post(program_handlers::handle_create_program).get(program_handlers::handle_list_programs),
        )
        .route(
            "/api/programs/:id",
            get(program_handlers::handle_get_program)
                .put(program_handlers::handle_update_program)
                .delete(program_handlers::handle_delete_program),
        )
        // Admin API
        .route("/api/admin/login", post(admin_handlers::handle_login))
        .route("/api/admin/register", post(admin_handlers::handle_register))
        .route("/api/admin/me", get(admin_handlers::handle_me))
        .with_state(state)
}
