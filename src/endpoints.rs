//! The API endpoint URIs.

/// The route for exchanging a Google ID token for a session token.
pub const GOOGLE_AUTH: &str = "/api/auth/google";
/// The route for fetching the signed-in user's profile.
pub const ME: &str = "/api/auth/me";
/// The route for updating the signed-in user's expense parsing context.
pub const EXPENSE_CONTEXT: &str = "/api/auth/context";

/// The route to list and create tags.
pub const TAGS: &str = "/api/tags";
/// The route to rename or delete a single tag.
pub const TAG: &str = "/api/tags/{tag_id}";

/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to fetch, update or delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to upload a CSV file of expenses.
pub const IMPORT: &str = "/api/expenses/import";
/// The route to parse free text into a draft expense.
pub const PARSE: &str = "/api/parse";

/// The route to list and create recurring expense templates.
pub const RECURRING_EXPENSES: &str = "/api/recurring-expenses";
/// The route to update or delete a single recurring expense template.
pub const RECURRING_EXPENSE: &str = "/api/recurring-expenses/{recurring_expense_id}";

/// The route to list and create vehicles.
pub const VEHICLES: &str = "/api/vehicles";
/// The route to update or delete a single vehicle.
pub const VEHICLE: &str = "/api/vehicles/{vehicle_id}";

/// The route to list and create mileage logs.
pub const MILEAGE_LOGS: &str = "/api/mileage-logs";
/// The route to update or delete a single mileage log.
pub const MILEAGE_LOG: &str = "/api/mileage-logs/{log_id}";

/// The route for expense totals over a date range.
pub const EXPENSE_SUMMARY: &str = "/api/analytics/summary";
/// The route for mileage totals, optionally for one year.
pub const MILEAGE_SUMMARY: &str = "/api/analytics/mileage";

/// The route listing the tools available to LLM clients.
pub const MCP_TOOLS: &str = "/api/mcp/tools";
/// The route for calling a named tool.
pub const MCP_TOOL_CALL: &str = "/api/mcp/tools/{tool_name}";
