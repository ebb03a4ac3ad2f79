//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    analytics::{get_expense_summary, get_mileage_summary},
    auth::{get_me, google_auth, update_expense_context},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint, get_expenses,
        import_expenses, update_expense_endpoint,
    },
    mcp::{call_tool, get_tool_descriptors},
    mileage::{
        create_mileage_log_endpoint, delete_mileage_log_endpoint, get_mileage_logs,
        update_mileage_log_endpoint,
    },
    parse::parse_expense,
    recurring::{
        create_recurring_expense_endpoint, delete_recurring_expense_endpoint,
        get_recurring_expenses, update_recurring_expense_endpoint,
    },
    tag::{create_tag_endpoint, delete_tag_endpoint, get_tags, update_tag_endpoint},
    vehicle::{
        create_vehicle_endpoint, delete_vehicle_endpoint, get_vehicles, update_vehicle_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except sign-in and the tool listing checks the bearer token
/// through the [crate::auth::CurrentUser] extractor. The caller is expected
/// to add tracing, logging and CORS layers, so tests can exercise routes
/// without them.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::GOOGLE_AUTH, post(google_auth))
        .route(endpoints::ME, get(get_me))
        .route(endpoints::EXPENSE_CONTEXT, put(update_expense_context))
        .route(endpoints::TAGS, get(get_tags).post(create_tag_endpoint))
        .route(endpoints::TAG, put(update_tag_endpoint))
        .route(endpoints::TAG, delete(delete_tag_endpoint))
        .route(
            endpoints::EXPENSES,
            get(get_expenses).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(endpoints::IMPORT, post(import_expenses))
        .route(endpoints::PARSE, post(parse_expense))
        .route(
            endpoints::RECURRING_EXPENSES,
            get(get_recurring_expenses).post(create_recurring_expense_endpoint),
        )
        .route(
            endpoints::RECURRING_EXPENSE,
            put(update_recurring_expense_endpoint).delete(delete_recurring_expense_endpoint),
        )
        .route(
            endpoints::VEHICLES,
            get(get_vehicles).post(create_vehicle_endpoint),
        )
        .route(
            endpoints::VEHICLE,
            put(update_vehicle_endpoint).delete(delete_vehicle_endpoint),
        )
        .route(
            endpoints::MILEAGE_LOGS,
            get(get_mileage_logs).post(create_mileage_log_endpoint),
        )
        .route(
            endpoints::MILEAGE_LOG,
            put(update_mileage_log_endpoint).delete(delete_mileage_log_endpoint),
        )
        .route(endpoints::EXPENSE_SUMMARY, get(get_expense_summary))
        .route(endpoints::MILEAGE_SUMMARY, get(get_mileage_summary))
        .route(endpoints::MCP_TOOLS, get(get_tool_descriptors))
        .route(endpoints::MCP_TOOL_CALL, post(call_tool))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::test_server_with_user;

    #[tokio::test]
    async fn protected_routes_reject_missing_tokens() {
        let (server, _, _) = test_server_with_user().await;

        for route in [
            "/api/auth/me",
            "/api/tags",
            "/api/expenses",
            "/api/recurring-expenses",
            "/api/vehicles",
            "/api/mileage-logs",
            "/api/analytics/summary",
            "/api/analytics/mileage",
        ] {
            let response = server.get(route).await;

            response.assert_status_unauthorized();
        }
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (server, _, _) = test_server_with_user().await;

        server.get("/api/nope").await.assert_status_not_found();
    }
}
