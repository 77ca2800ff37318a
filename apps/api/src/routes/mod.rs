pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use handlers::*;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Cohorts
        .route(
            "/api/v1/cohorts",
            post(handle_create_cohort).get(handle_list_cohorts),
        )
        .route("/api/v1/cohorts/:id", get(handle_get_cohort))
        // Admissions
        .route(
            "/api/v1/applicants",
            post(handle_create_applicant).get(handle_list_applicants),
        )
        .route("/api/v1/applicants/:id", get(handle_get_applicant))
        .route(
            "/api/v1/applicants/:id/evaluations",
            get(handle_list_evaluations),
        )
        .route(
            "/api/v1/applicants/:id/submissions",
            get(handle_list_submissions),
        )
        .route(
            "/api/v1/applicants/:id/screen",
            post(handle_screen_application),
        )
        .route("/api/v1/applicants/:id/withdraw", post(handle_withdraw))
        .route("/api/v1/screening/queue", get(handle_screening_queue))
        .route(
            "/api/v1/evaluations/:id/approve",
            post(handle_approve_evaluation),
        )
        .route(
            "/api/v1/microship/submissions",
            post(handle_create_submission),
        )
        .route(
            "/api/v1/microship/submissions/:id",
            get(handle_get_submission),
        )
        .route(
            "/api/v1/microship/:id/evaluate",
            post(handle_evaluate_submission),
        )
        .route(
            "/api/v1/bulk/microship/evaluate",
            post(handle_bulk_evaluate),
        )
        // Check-ins and risk
        .route("/api/v1/check-ins", post(handle_submit_check_in))
        .route("/api/v1/check-ins/:id", get(handle_get_check_in))
        .route(
            "/api/v1/check-ins/:id/analyze",
            post(handle_analyze_check_in),
        )
        .route("/api/v1/fellows/:id/check-ins", get(handle_list_check_ins))
        .route(
            "/api/v1/fellows/:id/risk",
            post(handle_assess_risk).get(handle_risk_history),
        )
        .route("/api/v1/risk/:id", get(handle_get_assessment))
        .route("/api/v1/risk/:id/action", post(handle_record_action))
        .route(
            "/api/v1/cohorts/:id/risk-dashboard",
            get(handle_risk_dashboard),
        )
        // Fellow lifecycle
        .route(
            "/api/v1/fellows",
            post(handle_create_fellow).get(handle_list_fellows),
        )
        .route("/api/v1/fellows/:id", get(handle_get_fellow))
        .route("/api/v1/fellows/:id/status", post(handle_change_status))
        .route(
            "/api/v1/fellows/:id/warnings",
            post(handle_issue_warning).get(handle_list_warnings),
        )
        .route(
            "/api/v1/fellows/:id/warnings/draft",
            post(handle_draft_warning),
        )
        .route(
            "/api/v1/warnings/:id",
            get(handle_get_warning).put(handle_edit_warning),
        )
        .route("/api/v1/warnings/:id/issue", post(handle_send_warning))
        .route(
            "/api/v1/warnings/:id/acknowledge",
            post(handle_acknowledge_warning),
        )
        // Placement
        .route(
            "/api/v1/fellows/:id/profile",
            post(handle_generate_profile).get(handle_latest_profile),
        )
        .route(
            "/api/v1/fellows/:id/matches",
            post(handle_match_opportunities).get(handle_list_matches),
        )
        .route(
            "/api/v1/opportunities",
            post(handle_create_opportunity).get(handle_list_opportunities),
        )
        .route("/api/v1/opportunities/:id", get(handle_get_opportunity))
        .route(
            "/api/v1/matches/:id/introduction",
            post(handle_send_introduction),
        )
        // Analytics
        .route("/api/v1/analytics/funnel", get(handle_conversion_funnel))
        .with_state(state)
}
