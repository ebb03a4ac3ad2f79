//! Dispatches tool calls to the store functions behind the REST handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, Error,
    analytics::{compute_expense_summary, compute_mileage_summary},
    auth::CurrentUser,
    db::with_lock_retry,
    expense::{ExpenseBody, create_expense, delete_expense, list_merged_expenses},
    mileage::{MileageLogBody, create_mileage_log, delete_mileage_log, list_mileage_logs},
    pagination::Pagination,
    tag::{TagBody, TagName, create_tag, get_all_tags},
    vehicle::{VehicleBody, VehicleData, VehicleId, create_vehicle, list_vehicles},
};

#[derive(Debug, Deserialize)]
struct ListExpensesArguments {
    start_date: Option<Date>,
    end_date: Option<Date>,
    #[serde(flatten)]
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct IdArguments {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct VehicleFilterArguments {
    vehicle_id: Option<VehicleId>,
}

#[derive(Debug, Deserialize)]
struct DateRangeArguments {
    start_date: Option<Date>,
    end_date: Option<Date>,
}

#[derive(Debug, Deserialize)]
struct YearArguments {
    year: Option<i32>,
}

fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, Error> {
    serde_json::from_value(arguments)
        .map_err(|error| Error::InvalidToolArguments(error.to_string()))
}

/// A route handler that calls the named tool with a JSON arguments object.
///
/// Unknown tool names get 404, bad arguments 400 and tool failures the same
/// `{"error": ...}` responses as the REST endpoints.
pub async fn call_tool(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tool_name): Path<String>,
    Json(arguments): Json<Value>,
) -> Result<Response, Error> {
    match tool_name.as_str() {
        "list_expenses" => {
            let args: ListExpensesArguments = parse_arguments(arguments)?;

            let instances = list_merged_expenses(
                &state,
                user.id,
                args.start_date,
                args.end_date,
                args.pagination,
            )
            .await?;

            Ok(Json(instances).into_response())
        }
        "create_expense" => {
            let body: ExpenseBody = parse_arguments(arguments)?;
            let data = body.validate()?;

            let expense = with_lock_retry(&state.db_connection, move |connection| {
                create_expense(user.id, data.clone(), connection)
            })
            .await?;

            Ok((StatusCode::CREATED, Json(expense)).into_response())
        }
        "delete_expense" => {
            let args: IdArguments = parse_arguments(arguments)?;

            with_lock_retry(&state.db_connection, move |connection| {
                delete_expense(user.id, args.id, connection)
            })
            .await?;

            Ok(Json(json!({"deleted": args.id})).into_response())
        }
        "list_vehicles" => {
            let vehicles = with_lock_retry(&state.db_connection, move |connection| {
                list_vehicles(user.id, connection)
            })
            .await?;

            Ok(Json(vehicles).into_response())
        }
        "create_vehicle" => {
            let body: VehicleBody = parse_arguments(arguments)?;
            let data =
                VehicleData::new(&body.name, body.make, body.model, body.year, body.description)?;

            let vehicle = with_lock_retry(&state.db_connection, move |connection| {
                create_vehicle(user.id, data.clone(), connection)
            })
            .await?;

            Ok((StatusCode::CREATED, Json(vehicle)).into_response())
        }
        "list_mileage_logs" => {
            let args: VehicleFilterArguments = parse_arguments(arguments)?;

            let logs = with_lock_retry(&state.db_connection, move |connection| {
                list_mileage_logs(user.id, args.vehicle_id, connection)
            })
            .await?;

            Ok(Json(logs).into_response())
        }
        "create_mileage_log" => {
            let body: MileageLogBody = parse_arguments(arguments)?;
            let data = body.validate()?;

            let log = with_lock_retry(&state.db_connection, move |connection| {
                create_mileage_log(user.id, data.clone(), connection)
            })
            .await?;

            Ok((StatusCode::CREATED, Json(log)).into_response())
        }
        "delete_mileage_log" => {
            let args: IdArguments = parse_arguments(arguments)?;

            with_lock_retry(&state.db_connection, move |connection| {
                delete_mileage_log(user.id, args.id, connection)
            })
            .await?;

            Ok(Json(json!({"deleted": args.id})).into_response())
        }
        "list_tags" => {
            let tags = with_lock_retry(&state.db_connection, move |connection| {
                get_all_tags(user.id, connection)
            })
            .await?;

            Ok(Json(tags).into_response())
        }
        "create_tag" => {
            let body: TagBody = parse_arguments(arguments)?;
            let name = TagName::new(&body.name)?;

            let tag = with_lock_retry(&state.db_connection, move |connection| {
                create_tag(user.id, name.clone(), connection)
            })
            .await?;

            Ok((StatusCode::CREATED, Json(tag)).into_response())
        }
        "get_expense_summary" => {
            let args: DateRangeArguments = parse_arguments(arguments)?;

            let summary =
                compute_expense_summary(&state, user.id, args.start_date, args.end_date).await?;

            Ok(Json(summary).into_response())
        }
        "get_mileage_deduction" => {
            let args: YearArguments = parse_arguments(arguments)?;

            let summary = compute_mileage_summary(&state, user.id, args.year).await?;

            Ok(Json(summary).into_response())
        }
        _ => Err(Error::UnknownTool(tool_name)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        expense::{Expense, ExpenseInstance},
        test_utils::test_server_with_user,
        vehicle::Vehicle,
    };

    #[tokio::test]
    async fn descriptors_do_not_require_auth() {
        let (server, _, _) = test_server_with_user().await;

        let response = server.get("/api/mcp/tools").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn calling_a_tool_requires_auth() {
        let (server, _, _) = test_server_with_user().await;

        server
            .post("/api/mcp/tools/list_tags")
            .json(&json!({}))
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let (server, token, _) = test_server_with_user().await;

        server
            .post("/api/mcp/tools/transfer_funds")
            .authorization_bearer(&token)
            .json(&json!({}))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn bad_arguments_are_rejected() {
        let (server, token, _) = test_server_with_user().await;

        server
            .post("/api/mcp/tools/create_expense")
            .authorization_bearer(&token)
            .json(&json!({"description": "Lumber"}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn created_expenses_show_up_in_the_rest_api() {
        let (server, token, _) = test_server_with_user().await;

        let response = server
            .post("/api/mcp/tools/create_expense")
            .authorization_bearer(&token)
            .json(&json!({
                "date": "2026-01-15",
                "description": "Lumber",
                "recipient": "Hardware Store",
                "amount": 125.50,
                "tags": ["Materials"]
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let expense = response.json::<Expense>();

        let instances = server
            .get("/api/expenses")
            .authorization_bearer(&token)
            .await
            .json::<Vec<ExpenseInstance>>();

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, Some(expense.id));
    }

    #[tokio::test]
    async fn listing_expenses_pages_like_the_rest_api() {
        let (server, token, _) = test_server_with_user().await;

        for day in ["2026-01-05", "2026-01-15", "2026-01-25"] {
            server
                .post("/api/expenses")
                .authorization_bearer(&token)
                .json(&json!({
                    "date": day,
                    "description": "Supplies",
                    "recipient": "Shop",
                    "amount": 10.0
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let instances = server
            .post("/api/mcp/tools/list_expenses")
            .authorization_bearer(&token)
            .json(&json!({"start_date": "2026-01-10", "limit": 1}))
            .await
            .json::<Vec<ExpenseInstance>>();

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].date.day(), 25);
    }

    #[tokio::test]
    async fn mileage_tools_round_trip() {
        let (server, token, _) = test_server_with_user().await;

        let vehicle = server
            .post("/api/mcp/tools/create_vehicle")
            .authorization_bearer(&token)
            .json(&json!({"name": "Truck"}))
            .await
            .json::<Vehicle>();

        server
            .post("/api/mcp/tools/create_mileage_log")
            .authorization_bearer(&token)
            .json(&json!({
                "vehicle_id": vehicle.id,
                "date": "2025-06-15",
                "purpose": "Material pickup",
                "odometer_start": 50000,
                "odometer_end": 50040
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let deduction = server
            .post("/api/mcp/tools/get_mileage_deduction")
            .authorization_bearer(&token)
            .json(&json!({"year": 2025}))
            .await
            .json::<crate::analytics::MileageSummary>();

        assert_eq!(deduction.log_count, 1);
        assert_eq!(deduction.business_miles, 40);
        assert_eq!(deduction.deduction, 28.0);
    }

    #[tokio::test]
    async fn deleting_a_mirror_expense_through_a_tool_is_refused() {
        let (server, token, _) = test_server_with_user().await;

        let vehicle = server
            .post("/api/mcp/tools/create_vehicle")
            .authorization_bearer(&token)
            .json(&json!({"name": "Truck"}))
            .await
            .json::<Vehicle>();

        server
            .post("/api/mcp/tools/create_mileage_log")
            .authorization_bearer(&token)
            .json(&json!({
                "vehicle_id": vehicle.id,
                "date": "2025-06-15",
                "purpose": "Material pickup",
                "odometer_start": 50000,
                "odometer_end": 50040
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let mirror_id = server
            .get("/api/expenses")
            .authorization_bearer(&token)
            .await
            .json::<Vec<ExpenseInstance>>()[0]
            .id
            .expect("Mirror expense should be stored");

        server
            .post("/api/mcp/tools/delete_expense")
            .authorization_bearer(&token)
            .json(&json!({"id": mirror_id}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }
}
