pub mod consumption_queries;
pub mod user_queries;
