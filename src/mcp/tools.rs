//! Static descriptors for the available tools.

use axum::{Json, response::IntoResponse};
use serde_json::{Value, json};

/// A route handler listing the available tools.
///
/// Each descriptor carries the tool's name, a model-facing description and a
/// JSON schema for its arguments object.
pub async fn get_tool_descriptors() -> impl IntoResponse {
    Json(tool_descriptors())
}

fn date_schema(description: &str) -> Value {
    json!({"type": "string", "format": "date", "description": description})
}

fn tags_schema() -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "description": "Tag names to attach, created if they do not exist yet."
    })
}

pub(crate) fn tool_descriptors() -> Value {
    json!([
        {
            "name": "list_expenses",
            "description": "List the user's expenses newest first, including \
                instances of recurring expenses. Optionally filter by an \
                inclusive date range and page with skip/limit.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "start_date": date_schema("The earliest date to include."),
                    "end_date": date_schema("The latest date to include."),
                    "skip": {"type": "integer", "minimum": 0},
                    "limit": {"type": "integer", "minimum": 1}
                }
            }
        },
        {
            "name": "create_expense",
            "description": "Record a new expense.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "date": date_schema("When the money was spent."),
                    "description": {"type": "string"},
                    "recipient": {"type": "string", "description": "Who was paid."},
                    "amount": {"type": "number", "exclusiveMinimum": 0},
                    "materials": {
                        "type": "number",
                        "description": "The portion of the amount spent on materials."
                    },
                    "hours": {"type": "number", "description": "Hours of associated labour."},
                    "tags": tags_schema()
                },
                "required": ["date", "description", "recipient", "amount"]
            }
        },
        {
            "name": "delete_expense",
            "description": "Delete an expense by ID. Expenses that mirror a \
                mileage log cannot be deleted directly, delete the mileage \
                log instead.",
            "input_schema": {
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"]
            }
        },
        {
            "name": "list_vehicles",
            "description": "List the user's vehicles.",
            "input_schema": {"type": "object", "properties": {}}
        },
        {
            "name": "create_vehicle",
            "description": "Add a vehicle for mileage tracking.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "A display name, e.g. \"Work truck\"."},
                    "make": {"type": "string"},
                    "model": {"type": "string"},
                    "year": {"type": "integer", "description": "The model year."},
                    "description": {"type": "string", "description": "Optional free-text notes."}
                },
                "required": ["name"]
            }
        },
        {
            "name": "list_mileage_logs",
            "description": "List the user's mileage logs newest first, \
                optionally for one vehicle.",
            "input_schema": {
                "type": "object",
                "properties": {"vehicle_id": {"type": "integer"}}
            }
        },
        {
            "name": "create_mileage_log",
            "description": "Log a business trip. The deductible amount \
                (business miles times the IRS standard rate) is recorded as \
                an expense automatically.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "vehicle_id": {"type": "integer"},
                    "date": date_schema("When the trip happened."),
                    "purpose": {"type": "string", "description": "What the trip was for."},
                    "odometer_start": {"type": "integer"},
                    "odometer_end": {"type": "integer"},
                    "personal_miles": {
                        "type": "integer",
                        "description": "Miles of the trip that were personal rather than business."
                    },
                    "tags": tags_schema()
                },
                "required": ["vehicle_id", "date", "purpose", "odometer_start", "odometer_end"]
            }
        },
        {
            "name": "delete_mileage_log",
            "description": "Delete a mileage log and its mirrored deduction expense.",
            "input_schema": {
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"]
            }
        },
        {
            "name": "list_tags",
            "description": "List the user's tags alphabetically.",
            "input_schema": {"type": "object", "properties": {}}
        },
        {
            "name": "create_tag",
            "description": "Create a tag for labelling expenses and mileage logs.",
            "input_schema": {
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }
        },
        {
            "name": "get_expense_summary",
            "description": "Total, count and average of the user's expenses \
                over an optional inclusive date range, recurring expenses \
                included.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "start_date": date_schema("The earliest date to include."),
                    "end_date": date_schema("The latest date to include.")
                }
            }
        },
        {
            "name": "get_mileage_deduction",
            "description": "Trip count, total miles, business miles and total \
                deductible amount across the user's mileage logs, optionally \
                for one calendar year.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "year": {"type": "integer", "description": "Restrict to one calendar year."}
                }
            }
        }
    ])
}
